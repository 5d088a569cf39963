use anyhow::Result;
use clap::Parser;
use sdk_control::SdkBuilder;
use sdk_github::GithubClient;
use sdk_models::CiContext;
use std::sync::Arc;
use swagger_to_sdk::{init_tracing, load_settings, SwaggerToSdkArgs, TOKEN_ENV};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = SwaggerToSdkArgs::parse();
    init_tracing(args.log_level());

    let settings = match load_settings(args.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    };

    let token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
    if token.is_none() {
        warn!("{} is not set, nothing will be pushed to Github", TOKEN_ENV);
    }

    let github = GithubClient::new(reqwest::Client::new(), &settings.github, token.clone());
    let request = args.build_request(&settings.branches);
    let builder = SdkBuilder::new(settings, Arc::new(github), token, CiContext::from_env());

    match builder.build_libraries(&request).await {
        Ok(outcome) => {
            info!(
                "Generated {} project(s) for {}",
                outcome.generated.len(),
                outcome.sdk_git_id
            );
            if let Some(pull) = outcome.pull_request {
                println!("{}", pull.html_url);
            }
            Ok(())
        }
        Err(e) => {
            error!("Build failed: {}", e);
            eprintln!("{e}");
            std::process::exit(e.exit_code());
        }
    }
}
