use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::Docker;
use futures_util::StreamExt;
use sdk_models::{ImageConfig, ImageSpec, SdkError};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    /// Appended to the image entrypoint. Empty keeps the image default.
    pub args: Vec<String>,
}

#[async_trait]
pub trait ContainerLauncher: Send + Sync + 'static {
    async fn create(&self, spec: RunSpec) -> anyhow::Result<String>; // returns container_id
    async fn start(&self, container_id: &str) -> anyhow::Result<()>;
    async fn wait(&self, container_id: &str) -> anyhow::Result<i64>; // returns exit code
    async fn logs(&self, container_id: &str) -> anyhow::Result<String>;
    async fn remove(&self, container_id: &str, force: bool) -> anyhow::Result<()>;
    async fn inspect_image(&self, image: &str) -> anyhow::Result<ImageConfig>;
}

pub struct DockerLauncher {
    docker: Docker,
}

impl DockerLauncher {
    pub fn connect() -> Result<Self, SdkError> {
        let docker = Docker::connect_with_socket_defaults().map_err(|e| SdkError::DockerError {
            message: e.to_string(),
        })?;
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerLauncher for DockerLauncher {
    async fn create(&self, spec: RunSpec) -> anyhow::Result<String> {
        let config = Config {
            image: Some(spec.image),
            cmd: if spec.args.is_empty() {
                None
            } else {
                Some(spec.args)
            },
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: spec.name,
            ..Default::default()
        };
        let response = self.docker.create_container(Some(options), config).await?;
        Ok(response.id)
    }

    async fn start(&self, container_id: &str) -> anyhow::Result<()> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn wait(&self, container_id: &str) -> anyhow::Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };
        let mut stream = self.docker.wait_container(container_id, Some(options));
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // Non-zero exits are reported as errors by the daemon client
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => anyhow::bail!("wait stream for {} ended without a status", container_id),
        }
    }

    async fn logs(&self, container_id: &str) -> anyhow::Result<String> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(container_id, Some(options));
        let mut logs = String::new();
        while let Some(log) = stream.next().await {
            match log {
                Ok(LogOutput::StdOut { message })
                | Ok(LogOutput::StdErr { message })
                | Ok(LogOutput::Console { message }) => {
                    logs.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(LogOutput::StdIn { .. }) => {}
                Err(e) => {
                    error!("Error reading container logs: {}", e);
                    break;
                }
            }
        }
        Ok(logs)
    }

    async fn remove(&self, container_id: &str, force: bool) -> anyhow::Result<()> {
        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.docker
            .remove_container(container_id, Some(options))
            .await?;
        Ok(())
    }

    async fn inspect_image(&self, image: &str) -> anyhow::Result<ImageConfig> {
        let inspect = self.docker.inspect_image(image).await?;
        let config = inspect.config.unwrap_or_default();
        Ok(ImageConfig {
            entrypoint: config.entrypoint.unwrap_or_default(),
            cmd: config.cmd.unwrap_or_default(),
            env: config.env.unwrap_or_default(),
            working_dir: config.working_dir.filter(|dir| !dir.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRun {
    pub container_id: String,
    pub exit_code: i64,
    pub logs: String,
}

pub struct ContainerInvoker {
    launcher: Arc<dyn ContainerLauncher>,
    name_prefix: String,
}

impl ContainerInvoker {
    pub fn new(launcher: Arc<dyn ContainerLauncher>, name_prefix: impl Into<String>) -> Self {
        Self {
            launcher,
            name_prefix: name_prefix.into(),
        }
    }

    /// Run `image` once with `args` appended to its entrypoint and return the
    /// container's exit code unchanged.
    #[instrument(skip(self))]
    pub async fn run(&self, image: &str, args: &[String]) -> Result<ContainerRun, SdkError> {
        let spec = RunSpec {
            image: image.to_string(),
            name: format!("{}-{}", self.name_prefix, uuid::Uuid::new_v4()),
            args: args.to_vec(),
        };
        let name = spec.name.clone();

        let container_id = self.launcher.create(spec).await.map_err(docker_error)?;
        info!("Created container: {} with ID: {}", name, container_id);

        if let Err(e) = self.launcher.start(&container_id).await {
            // Entrypoint missing or not executable
            error!("Failed to start container {}: {}", container_id, e);
            self.cleanup(&container_id).await;
            return Err(SdkError::DockerError {
                message: format!("failed to launch entrypoint: {e}"),
            });
        }

        let waited = self.launcher.wait(&container_id).await;
        let logs = match self.launcher.logs(&container_id).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!("Unable to read logs of {}: {}", container_id, e);
                String::new()
            }
        };
        self.cleanup(&container_id).await;

        let exit_code = waited.map_err(docker_error)?;
        info!("Container {} exited with {}", container_id, exit_code);
        Ok(ContainerRun {
            container_id,
            exit_code,
            logs,
        })
    }

    pub async fn inspect(&self, image: &str) -> Result<ImageConfig, SdkError> {
        self.launcher.inspect_image(image).await.map_err(docker_error)
    }

    /// Read back the image configuration and check it against `spec`.
    pub async fn verify(&self, image: &str, spec: &ImageSpec) -> Result<ImageConfig, SdkError> {
        let config = self.inspect(image).await?;
        config.verify(spec)?;
        Ok(config)
    }

    async fn cleanup(&self, container_id: &str) {
        if let Err(e) = self.launcher.remove(container_id, true).await {
            warn!("Failed to remove container {}: {}", container_id, e);
        }
    }
}

fn docker_error(e: anyhow::Error) -> SdkError {
    SdkError::DockerError {
        message: e.to_string(),
    }
}
