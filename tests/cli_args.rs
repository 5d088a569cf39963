use clap::Parser;
use sdk_models::Settings;
use std::path::PathBuf;
use swagger_to_sdk::{log_level, ImageCli, ImageCommand, SwaggerToSdkArgs};

#[test]
fn test_defaults_match_the_script() {
    let args = SwaggerToSdkArgs::try_parse_from(["swagger-to-sdk", "azure-sdk-for-python"]).unwrap();
    assert_eq!(args.sdk_git_id, "azure-sdk-for-python");
    assert_eq!(args.restapi_git_folder, PathBuf::from("."));
    assert_eq!(args.config_path, "swagger_to_sdk_config.json");
    assert!(args.project.is_empty());
    assert_eq!(args.log_level(), "warn");

    let request = args.build_request(&Settings::default().branches);
    assert_eq!(request.message_template, "Generated from {hexsha}");
    assert_eq!(request.base_branch, "master");
    assert_eq!(request.branch, None);
    assert_eq!(request.pr_repo_id, None);
    assert_eq!(request.autorest_dir, None);
}

#[test]
fn test_all_flags() {
    let args = SwaggerToSdkArgs::try_parse_from([
        "swagger-to-sdk",
        "-r",
        "/git-restapi",
        "--pr-repo-id",
        "Azure/azure-sdk-for-python",
        "-m",
        "Regenerated {hexsha}",
        "-p",
        "web",
        "--project",
        "cdn",
        "-o",
        "dev",
        "-b",
        "RestAPI-test",
        "-c",
        "sdk_config.json",
        "--autorest",
        "/opt/autorest",
        "-v",
        "lmazuel/azure-sdk-for-python",
    ])
    .unwrap();

    assert_eq!(args.log_level(), "info");
    let request = args.build_request(&Settings::default().branches);
    assert_eq!(request.sdk_git_id, "lmazuel/azure-sdk-for-python");
    assert_eq!(request.restapi_git_folder, PathBuf::from("/git-restapi"));
    assert_eq!(request.pr_repo_id.as_deref(), Some("Azure/azure-sdk-for-python"));
    assert_eq!(request.message_template, "Regenerated {hexsha}");
    assert_eq!(request.project_patterns, vec!["web", "cdn"]);
    assert_eq!(request.base_branch, "dev");
    assert_eq!(request.branch.as_deref(), Some("RestAPI-test"));
    assert_eq!(request.config_path, "sdk_config.json");
    assert_eq!(request.autorest_dir, Some(PathBuf::from("/opt/autorest")));
}

#[test]
fn test_sdk_git_id_is_required() {
    assert!(SwaggerToSdkArgs::try_parse_from(["swagger-to-sdk"]).is_err());
}

#[test]
fn test_debug_wins_over_verbose() {
    assert_eq!(log_level(true, true), "debug");
    assert_eq!(log_level(true, false), "info");
    assert_eq!(log_level(false, false), "warn");
}

#[test]
fn test_image_run_passes_arguments_through() {
    let cli = ImageCli::try_parse_from([
        "sdk-image",
        "run",
        "swagger-to-sdk:latest",
        "Azure/azure-sdk-for-python",
        "-v",
        "--pr-repo-id",
        "Azure/azure-sdk-for-python",
    ])
    .unwrap();
    assert_eq!(
        cli.command,
        ImageCommand::Run {
            image: "swagger-to-sdk:latest".into(),
            args: vec![
                "Azure/azure-sdk-for-python".into(),
                "-v".into(),
                "--pr-repo-id".into(),
                "Azure/azure-sdk-for-python".into(),
            ],
        }
    );

    let cli = ImageCli::try_parse_from(["sdk-image", "run", "swagger-to-sdk:latest"]).unwrap();
    assert_eq!(
        cli.command,
        ImageCommand::Run {
            image: "swagger-to-sdk:latest".into(),
            args: vec![],
        }
    );
}

#[test]
fn test_image_subcommands() {
    let cli = ImageCli::try_parse_from(["sdk-image", "--debug", "build", "--context", "docker"]).unwrap();
    assert_eq!(cli.log_level(), "debug");
    assert_eq!(
        cli.command,
        ImageCommand::Build {
            context: PathBuf::from("docker"),
            tag: None,
        }
    );

    let cli = ImageCli::try_parse_from(["sdk-image", "render", "--out", "Dockerfile"]).unwrap();
    assert_eq!(
        cli.command,
        ImageCommand::Render {
            out: Some(PathBuf::from("Dockerfile")),
        }
    );
}

#[test]
fn test_image_run_forwards_flags_meant_for_the_script() {
    let cli = ImageCli::try_parse_from(["sdk-image", "run", "img", "--help"]).unwrap();
    assert_eq!(
        cli.command,
        ImageCommand::Run {
            image: "img".into(),
            args: vec!["--help".into()],
        }
    );

    let cli = ImageCli::try_parse_from(["sdk-image", "run", "img", "-v", "Azure/sdk"]).unwrap();
    assert!(!cli.verbose);
    assert_eq!(
        cli.command,
        ImageCommand::Run {
            image: "img".into(),
            args: vec!["-v".into(), "Azure/sdk".into()],
        }
    );

    let cli = ImageCli::try_parse_from(["sdk-image", "-v", "run", "img", "--debug"]).unwrap();
    assert_eq!(cli.log_level(), "info");
    assert_eq!(
        cli.command,
        ImageCommand::Run {
            image: "img".into(),
            args: vec!["--debug".into()],
        }
    );
}
