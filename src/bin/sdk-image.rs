use anyhow::{Context, Result};
use clap::Parser;
use sdk_invoker::{ContainerInvoker, DockerLauncher};
use sdk_models::{ImageSpec, SdkError, Settings};
use sdk_packaging::{BuildInputs, ImageBuilder, ProvisionPlan};
use std::sync::Arc;
use swagger_to_sdk::{init_tracing, load_settings, ImageCli, ImageCommand};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ImageCli::parse();
    init_tracing(cli.log_level());

    let settings = load_settings(cli.settings.as_deref()).unwrap_or_else(|e| fail(e));

    match execute(cli.command, settings).await {
        Ok(code) => std::process::exit(code),
        Err(e) => fail(e),
    }
}

fn fail(e: SdkError) -> ! {
    error!("{}", e);
    eprintln!("{e}");
    std::process::exit(e.exit_code());
}

/// Run one subcommand and return the process exit code.
async fn execute(command: ImageCommand, settings: Settings) -> Result<i32, SdkError> {
    let spec = ImageSpec::from(&settings.image);

    match command {
        ImageCommand::Render { out } => {
            let dockerfile = ProvisionPlan::from_spec(&spec)?.render_dockerfile();
            match out {
                Some(path) => {
                    std::fs::write(&path, dockerfile)?;
                    info!("Dockerfile written to {}", path.display());
                }
                None => print!("{dockerfile}"),
            }
            Ok(0)
        }
        ImageCommand::Build { context, tag } => {
            let plan = ProvisionPlan::from_spec(&spec)?;
            let inputs = BuildInputs::from_context(&context, &spec)?;
            let built = ImageBuilder::default()
                .build_image(
                    &plan,
                    &spec,
                    &inputs,
                    &settings.image.repository,
                    tag.as_deref(),
                )
                .await?;
            println!("{}", built.tag);
            Ok(0)
        }
        ImageCommand::Run { image, args } => {
            let invoker = container_invoker(&settings)?;
            let run = invoker.run(&image, &args).await?;
            print!("{}", run.logs);
            // Exit codes outside the i32 range cannot come from a process
            Ok(i32::try_from(run.exit_code).unwrap_or(1))
        }
        ImageCommand::Inspect { image } => {
            let invoker = container_invoker(&settings)?;
            let config = invoker.verify(&image, &spec).await?;
            println!("Entrypoint: {:?}", config.entrypoint);
            println!("Workdir: {}", config.working_dir.as_deref().unwrap_or_default());
            for (key, _) in spec.locale_env() {
                println!("{}={}", key, config.env_value(&key).unwrap_or_default());
            }
            Ok(0)
        }
        ImageCommand::Settings => {
            let rendered = render_settings(&settings).map_err(|e| SdkError::InternalError {
                reason: e.to_string(),
            })?;
            print!("{rendered}");
            Ok(0)
        }
    }
}

fn container_invoker(settings: &Settings) -> Result<ContainerInvoker, SdkError> {
    let launcher = DockerLauncher::connect()?;
    Ok(ContainerInvoker::new(
        Arc::new(launcher),
        settings.image.repository.clone(),
    ))
}

fn render_settings(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("unable to serialize settings")
}
