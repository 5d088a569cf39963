use clap::{Parser, Subcommand};
use sdk_control::BuildRequest;
use sdk_models::{BranchSettings, CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the GitHub token.
pub const TOKEN_ENV: &str = "GH_TOKEN";

const EPILOG: &str = "\
The script activates this additional behaviour if Travis is detected:
 --branch is setted by default to \"RestAPI-PR{number}\" if triggered by a PR, \"RestAPI-{branch}\" otherwise
 Only the files inside the PR are considered. If the PR is NOT detected, all files are used.";

#[derive(Parser, Debug)]
#[command(name = "swagger-to-sdk")]
#[command(
    about = "Build SDK using Autorest and push to Github. The GH_TOKEN environment variable needs to be set to act on Github."
)]
#[command(after_help = EPILOG)]
pub struct SwaggerToSdkArgs {
    /// Rest API git folder.
    #[arg(long = "rest-folder", short = 'r', default_value = ".")]
    pub restapi_git_folder: PathBuf,

    /// PR repo id. If not provided, no PR is done
    #[arg(long)]
    pub pr_repo_id: Option<String>,

    /// Force commit message. {hexsha} will be the current REST SHA1 [default: Generated from {hexsha}]
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Select a specific project. Do all by default. You can use a substring for several projects.
    #[arg(long, short = 'p')]
    pub project: Vec<String>,

    /// The base branch from where create the new branch and where to do the final PR. [default: master]
    #[arg(long, short = 'o')]
    pub base_branch: Option<String>,

    /// The SDK branch to commit. Default if not Travis: autorest. If Travis is detected, see epilog for details
    #[arg(long, short = 'b')]
    pub branch: Option<String>,

    /// The JSON configuration format path
    #[arg(long = "config", short = 'c', default_value = CONFIG_FILE)]
    pub config_path: String,

    /// Force the Autorest to be executed. Must be a directory containing Autorest.exe
    #[arg(long = "autorest")]
    pub autorest_dir: Option<PathBuf>,

    /// Verbosity in INFO mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Verbosity in DEBUG mode
    #[arg(long)]
    pub debug: bool,

    /// Tool settings file (TOML)
    #[arg(long, env = "SWAGGER_TO_SDK_CONFIG")]
    pub settings: Option<PathBuf>,

    /// The SDK Github id. If a simple string, consider it belongs to the GH_TOKEN owner repo. Otherwise, you can use the syntax username/repoid
    pub sdk_git_id: String,
}

impl SwaggerToSdkArgs {
    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose, self.debug)
    }

    /// Run parameters, with message and base branch defaulting to `branches`.
    pub fn build_request(&self, branches: &BranchSettings) -> BuildRequest {
        BuildRequest {
            sdk_git_id: self.sdk_git_id.clone(),
            config_path: self.config_path.clone(),
            project_patterns: self.project.clone(),
            restapi_git_folder: self.restapi_git_folder.clone(),
            pr_repo_id: self.pr_repo_id.clone(),
            message_template: self
                .message
                .clone()
                .unwrap_or_else(|| branches.commit_message.clone()),
            base_branch: self
                .base_branch
                .clone()
                .unwrap_or_else(|| branches.base_branch.clone()),
            branch: self.branch.clone(),
            autorest_dir: self.autorest_dir.clone(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sdk-image")]
#[command(about = "Provision and run the Swagger to SDK container image")]
#[command(after_help = "Options of sdk-image go before the subcommand.")]
pub struct ImageCli {
    #[command(subcommand)]
    pub command: ImageCommand,

    /// Tool settings file (TOML)
    #[arg(long, env = "SWAGGER_TO_SDK_CONFIG")]
    pub settings: Option<PathBuf>,

    /// Verbosity in INFO mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Verbosity in DEBUG mode
    #[arg(long)]
    pub debug: bool,
}

impl ImageCli {
    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose, self.debug)
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ImageCommand {
    /// Print the Dockerfile of the provisioning plan
    Render {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the image with docker
    Build {
        /// Directory holding the requirements manifest and the script
        #[arg(long, default_value = ".")]
        context: PathBuf,
        /// Image reference. Defaults to <repository>:<fingerprint>
        #[arg(long)]
        tag: Option<String>,
    },
    /// Run the image entrypoint once and exit with its exit code
    ///
    /// Every argument after the image, `--help` included, goes to the entrypoint.
    #[command(disable_help_flag = true)]
    Run {
        image: String,
        /// Arguments appended to the entrypoint
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Check the configuration of a built image
    Inspect { image: String },
    /// Print the effective settings as TOML
    Settings,
}

/// `--debug` wins over `--verbose`; WARN otherwise.
pub fn log_level(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

/// `RUST_LOG` when set, `level` otherwise.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
