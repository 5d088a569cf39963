use crate::{ImageSettings, SdkError};
use serde::{Deserialize, Serialize};

/// Everything needed to provision the generator image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSpec {
    pub base_image: String,
    pub keyserver: String,
    pub key_fingerprint: String,
    pub package_source: String,
    pub package_source_list: String,
    pub packages: Vec<String>,
    pub manifest: String,
    pub locale: String,
    pub script: String,
    pub entrypoint: EntrypointDeclaration,
    pub workdir: String,
}

impl From<&ImageSettings> for ImageSpec {
    fn from(settings: &ImageSettings) -> Self {
        Self {
            base_image: settings.base_image.clone(),
            keyserver: settings.keyserver.clone(),
            key_fingerprint: settings.key_fingerprint.clone(),
            package_source: settings.package_source.clone(),
            package_source_list: settings.package_source_list.clone(),
            packages: settings.packages.clone(),
            manifest: settings.manifest.clone(),
            locale: settings.locale.clone(),
            script: settings.script.clone(),
            entrypoint: EntrypointDeclaration {
                interpreter: settings.interpreter.clone(),
                script_path: settings.script_path.clone(),
            },
            workdir: settings.workdir.clone(),
        }
    }
}

impl ImageSpec {
    /// `LANG`, `LANGUAGE` and `LC_ALL` for the configured locale.
    pub fn locale_env(&self) -> Vec<(String, String)> {
        locale_env(&self.locale)
    }
}

/// Locale variables baked into the image, e.g. `en_US.UTF-8` gives
/// `LANG=en_US.UTF-8`, `LANGUAGE=en_US:en`, `LC_ALL=en_US.UTF-8`.
pub fn locale_env(locale: &str) -> Vec<(String, String)> {
    let territory = locale.split('.').next().unwrap_or(locale);
    let language = territory.split('_').next().unwrap_or(territory);
    vec![
        ("LANG".to_string(), locale.to_string()),
        ("LANGUAGE".to_string(), format!("{territory}:{language}")),
        ("LC_ALL".to_string(), locale.to_string()),
    ]
}

/// Fixed command run by every container. Runtime arguments are appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntrypointDeclaration {
    pub interpreter: String,
    pub script_path: String,
}

impl EntrypointDeclaration {
    pub fn command(&self) -> Vec<String> {
        vec![self.interpreter.clone(), self.script_path.clone()]
    }

    pub fn invocation<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut argv = self.command();
        argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        argv
    }
}

/// Image configuration as reported by the Docker daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageConfig {
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub working_dir: Option<String>,
}

impl ImageConfig {
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env.iter().find_map(|entry| {
            entry
                .split_once('=')
                .filter(|(k, _)| *k == key)
                .map(|(_, v)| v)
        })
    }

    /// Command a container started with `args` would run.
    pub fn invocation<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut argv = self.entrypoint.clone();
        if args.is_empty() {
            argv.extend(self.cmd.iter().cloned());
        } else {
            argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        }
        argv
    }

    /// Check that a built image carries the locale, entrypoint and working
    /// directory of `spec`.
    pub fn verify(&self, spec: &ImageSpec) -> Result<(), SdkError> {
        for (key, expected) in spec.locale_env() {
            match self.env_value(&key) {
                Some(actual) if actual == expected => {}
                actual => {
                    return Err(SdkError::ImageMismatch {
                        reason: format!("{key} is {actual:?}, expected {expected:?}"),
                    })
                }
            }
        }

        let expected = spec.entrypoint.command();
        if self.entrypoint != expected {
            return Err(SdkError::ImageMismatch {
                reason: format!("entrypoint is {:?}, expected {:?}", self.entrypoint, expected),
            });
        }

        if self.working_dir.as_deref() != Some(spec.workdir.as_str()) {
            return Err(SdkError::ImageMismatch {
                reason: format!(
                    "working directory is {:?}, expected {:?}",
                    self.working_dir, spec.workdir
                ),
            });
        }

        Ok(())
    }
}
