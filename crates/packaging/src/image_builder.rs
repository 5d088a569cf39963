use crate::ProvisionPlan;
use async_trait::async_trait;
use sdk_models::{ImageSpec, SdkError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info, instrument};

pub const FINGERPRINT_LABEL: &str = "swagger-to-sdk.fingerprint";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub tag: String,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub labels: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait BuildRunner: Send + Sync + 'static {
    async fn build(&self, request: &BuildRequest) -> anyhow::Result<BuildOutput>;
}

/// Runs `docker build` through the Docker CLI.
pub struct DockerCli;

#[async_trait]
impl BuildRunner for DockerCli {
    async fn build(&self, request: &BuildRequest) -> anyhow::Result<BuildOutput> {
        let mut command = Command::new("docker");
        command
            .arg("build")
            .arg("-t")
            .arg(&request.tag)
            .arg("-f")
            .arg(&request.dockerfile);
        for (key, value) in &request.labels {
            command.arg("--label").arg(format!("{key}={value}"));
        }

        let output = command
            .arg(&request.context)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(BuildOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Files copied from the caller's build context into the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInputs {
    pub manifest: PathBuf,
    pub script: PathBuf,
}

impl BuildInputs {
    pub fn from_context(context_dir: &Path, spec: &ImageSpec) -> Result<Self, SdkError> {
        let manifest = context_dir.join(&spec.manifest);
        if !manifest.is_file() {
            return Err(SdkError::ProvisionFailed {
                step: "install python requirements".to_string(),
                reason: format!("manifest not found: {}", manifest.display()),
            });
        }

        let script = context_dir.join(&spec.script);
        if !script.is_file() {
            return Err(SdkError::ProvisionFailed {
                step: "copy script".to_string(),
                reason: format!("script not found: {}", script.display()),
            });
        }

        Ok(Self { manifest, script })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    pub tag: String,
    pub fingerprint: String,
}

pub struct ImageBuilder {
    runner: Arc<dyn BuildRunner>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new(Arc::new(DockerCli))
    }
}

impl ImageBuilder {
    pub fn new(runner: Arc<dyn BuildRunner>) -> Self {
        Self { runner }
    }

    /// Stage a build context for `plan` and build it.
    ///
    /// Without `tag`, the image is tagged `<repository>:<fingerprint prefix>`,
    /// so identical inputs produce identical tags.
    #[instrument(skip(self, plan, inputs))]
    pub async fn build_image(
        &self,
        plan: &ProvisionPlan,
        spec: &ImageSpec,
        inputs: &BuildInputs,
        repository: &str,
        tag: Option<&str>,
    ) -> Result<BuiltImage, SdkError> {
        let manifest = tokio::fs::read(&inputs.manifest).await?;
        let script = tokio::fs::read(&inputs.script).await?;
        let fingerprint = plan.fingerprint(&manifest, &script);
        let image_ref = match tag {
            Some(tag) => tag.to_string(),
            None => format!("{}:{}", repository, &fingerprint[..12]),
        };

        // Create temporary directory for build context
        let temp_dir = tempfile::tempdir()?;
        let build_context = temp_dir.path();

        tokio::fs::write(build_context.join(&spec.manifest), &manifest).await?;
        tokio::fs::write(build_context.join(&spec.script), &script).await?;

        let dockerfile_path = build_context.join("Dockerfile");
        tokio::fs::write(&dockerfile_path, plan.render_dockerfile()).await?;

        info!("Building Docker image: {}", image_ref);
        info!("Build context: {:?}", build_context);

        let request = BuildRequest {
            tag: image_ref.clone(),
            dockerfile: dockerfile_path,
            context: build_context.to_path_buf(),
            labels: vec![(FINGERPRINT_LABEL.to_string(), fingerprint.clone())],
        };

        let output = self
            .runner
            .build(&request)
            .await
            .map_err(|e| SdkError::DockerError {
                message: e.to_string(),
            })?;

        if !output.success {
            error!("Docker build failed - stdout: {}", output.stdout);
            error!("Docker build failed - stderr: {}", output.stderr);
            return Err(SdkError::ProvisionFailed {
                step: "docker build".to_string(),
                reason: output.stderr,
            });
        }

        info!("Built Docker image: {}", image_ref);
        Ok(BuiltImage {
            tag: image_ref,
            fingerprint,
        })
    }
}
