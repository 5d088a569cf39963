use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use sdk_models::{SdkError, Settings};
use std::path::Path;

/// Path of an explicit settings file.
pub const CONFIG_ENV: &str = "SWAGGER_TO_SDK_CONFIG";
/// Prefix of settings overrides, e.g. `SWAGGER_TO_SDK_GITHUB__API_URL`.
pub const ENV_PREFIX: &str = "SWAGGER_TO_SDK_";
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/default.toml", "config/swagger-to-sdk.toml"];

/// Defaults, then the settings file, then the environment.
///
/// Without an explicit `path` the first existing default location is used.
pub fn settings_figment(path: Option<&Path>) -> Result<Figment, SdkError> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(SdkError::ConfigError {
                    reason: format!("settings file not found: {}", path.display()),
                });
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            if let Some(default) = DEFAULT_CONFIG_PATHS
                .into_iter()
                .map(Path::new)
                .find(|p| p.is_file())
            {
                figment = figment.merge(Toml::file(default));
            }
        }
    }

    Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__")))
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings, SdkError> {
    settings_figment(path)?
        .extract()
        .map_err(|e| SdkError::ConfigError {
            reason: e.to_string(),
        })
}
