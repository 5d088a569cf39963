//! Ordered provisioning steps of the generator image and their Dockerfile
//! rendering.
//!
//! Every step becomes one group of Dockerfile instructions, emitted in plan
//! order, so the layer history of the image is the plan itself.

use sdk_models::{ImageSpec, SdkError};
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStep {
    From { image: String },
    ImportKey { keyserver: String, fingerprint: String },
    RegisterSource { definition: String, list_file: String },
    InstallPackages { packages: Vec<String> },
    InstallRequirements { manifest: String },
    SetLocale { locale: String, env: Vec<(String, String)> },
    CopyScript { source: String, destination: String },
    SetWorkdir { path: String },
    Entrypoint { command: Vec<String> },
}

impl ProvisionStep {
    pub fn name(&self) -> &'static str {
        match self {
            ProvisionStep::From { .. } => "base image",
            ProvisionStep::ImportKey { .. } => "import signing key",
            ProvisionStep::RegisterSource { .. } => "register package source",
            ProvisionStep::InstallPackages { .. } => "install system packages",
            ProvisionStep::InstallRequirements { .. } => "install python requirements",
            ProvisionStep::SetLocale { .. } => "set locale",
            ProvisionStep::CopyScript { .. } => "copy script",
            ProvisionStep::SetWorkdir { .. } => "set working directory",
            ProvisionStep::Entrypoint { .. } => "declare entrypoint",
        }
    }

    pub fn instructions(&self) -> String {
        match self {
            ProvisionStep::From { image } => format!("FROM {image}"),
            ProvisionStep::ImportKey {
                keyserver,
                fingerprint,
            } => format!("RUN apt-key adv --keyserver {keyserver} --recv-keys {fingerprint}"),
            ProvisionStep::RegisterSource {
                definition,
                list_file,
            } => {
                let quoted = shell_quote(definition);
                format!(
                    "RUN grep -qxF {quoted} {list_file} 2>/dev/null || echo {quoted} >> {list_file}"
                )
            }
            ProvisionStep::InstallPackages { packages } => {
                let mut lines = vec!["RUN apt-get update \\".to_string()];
                lines.push("    && apt-get install -y --no-install-recommends \\".to_string());
                for package in packages {
                    lines.push(format!("        {package} \\"));
                }
                lines.push("    && rm -rf /var/lib/apt/lists/*".to_string());
                lines.join("\n")
            }
            ProvisionStep::InstallRequirements { manifest } => format!(
                "COPY {manifest} /tmp/{manifest}\nRUN pip3 install --no-cache-dir -r /tmp/{manifest}"
            ),
            ProvisionStep::SetLocale { locale, env } => {
                let mut lines = vec![format!("RUN locale-gen {locale}")];
                for (key, value) in env {
                    lines.push(format!("ENV {key}={value}"));
                }
                lines.join("\n")
            }
            ProvisionStep::CopyScript {
                source,
                destination,
            } => format!("COPY {source} {destination}"),
            ProvisionStep::SetWorkdir { path } => format!("WORKDIR {path}"),
            ProvisionStep::Entrypoint { command } => {
                // Exec form: runtime arguments are appended, not interpreted by a shell
                let quoted: Vec<String> = command
                    .iter()
                    .map(|arg| serde_json::Value::String(arg.clone()).to_string())
                    .collect();
                format!("ENTRYPOINT [{}]", quoted.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    steps: Vec<ProvisionStep>,
}

impl ProvisionPlan {
    pub fn from_spec(spec: &ImageSpec) -> Result<Self, SdkError> {
        validate(spec)?;

        let mut packages = spec.packages.clone();
        packages.sort();
        packages.dedup();

        let steps = vec![
            ProvisionStep::From {
                image: spec.base_image.clone(),
            },
            ProvisionStep::ImportKey {
                keyserver: spec.keyserver.clone(),
                fingerprint: spec.key_fingerprint.clone(),
            },
            ProvisionStep::RegisterSource {
                definition: spec.package_source.clone(),
                list_file: spec.package_source_list.clone(),
            },
            ProvisionStep::InstallPackages { packages },
            ProvisionStep::InstallRequirements {
                manifest: spec.manifest.clone(),
            },
            ProvisionStep::SetLocale {
                locale: spec.locale.clone(),
                env: spec.locale_env(),
            },
            ProvisionStep::CopyScript {
                source: spec.script.clone(),
                destination: spec.entrypoint.script_path.clone(),
            },
            ProvisionStep::SetWorkdir {
                path: spec.workdir.clone(),
            },
            ProvisionStep::Entrypoint {
                command: spec.entrypoint.command(),
            },
        ];

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ProvisionStep] {
        &self.steps
    }

    pub fn render_dockerfile(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&format!("# {}\n", step.name()));
            out.push_str(&step.instructions());
            out.push_str("\n\n");
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    }

    /// SHA-256 of the Dockerfile and the files copied into the image.
    pub fn fingerprint(&self, manifest: &[u8], script: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.render_dockerfile().as_bytes());
        hasher.update([0u8]);
        hasher.update(manifest);
        hasher.update([0u8]);
        hasher.update(script);
        format!("{:x}", hasher.finalize())
    }
}

fn validate(spec: &ImageSpec) -> Result<(), SdkError> {
    let invalid = |reason: String| Err(SdkError::InvalidImageSpec { reason });

    if spec.base_image.trim().is_empty() || spec.base_image.contains(char::is_whitespace) {
        return invalid(format!("invalid base image: {:?}", spec.base_image));
    }
    if spec.key_fingerprint.len() < 8 || !spec.key_fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
        return invalid(format!("invalid key fingerprint: {:?}", spec.key_fingerprint));
    }
    if spec.package_source.trim().is_empty() || !spec.package_source_list.starts_with('/') {
        return invalid("package source needs a definition and an absolute list file".to_string());
    }
    if spec.packages.is_empty() {
        return invalid("no system packages to install".to_string());
    }
    if let Some(bad) = spec.packages.iter().find(|p| !is_package_name(p)) {
        return invalid(format!("invalid package name: {bad:?}"));
    }
    for (what, file) in [("manifest", &spec.manifest), ("script", &spec.script)] {
        if file.is_empty() || file.contains('/') || file.contains(char::is_whitespace) {
            return invalid(format!("{what} must be a plain file name, got {file:?}"));
        }
    }
    if !spec.locale.contains('.') {
        return invalid(format!("locale needs an encoding: {:?}", spec.locale));
    }

    let script_path = Path::new(&spec.entrypoint.script_path);
    let workdir = Path::new(&spec.workdir);
    if !script_path.is_absolute() || !workdir.is_absolute() {
        return invalid("script path and working directory must be absolute".to_string());
    }
    if workdir == script_path || Some(workdir) == script_path.parent() {
        return invalid(format!(
            "working directory {} must be distinct from the script location",
            spec.workdir
        ));
    }
    if spec.entrypoint.interpreter.trim().is_empty() {
        return invalid("no entrypoint interpreter".to_string());
    }

    Ok(())
}

fn is_package_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+-.".contains(c))
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
