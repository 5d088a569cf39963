use async_trait::async_trait;
use sdk_invoker::docker::{ContainerInvoker, ContainerLauncher, RunSpec};
use sdk_models::{ImageConfig, ImageSpec, SdkError, Settings};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Pretends to be the provisioned image: records the process each container
/// would run and exits with a code chosen from the arguments.
#[derive(Clone)]
pub struct FakeLauncher {
    pub image: ImageConfig,
    pub created: Arc<Mutex<Vec<RunSpec>>>,
    pub started: Arc<Mutex<Vec<String>>>,
    pub removed: Arc<Mutex<Vec<(String, bool)>>>,
    pub fail_start: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            image: ImageConfig {
                entrypoint: vec!["python3".into(), "/SwaggerToSdk.py".into()],
                cmd: vec![],
                env: vec![
                    "LANG=en_US.UTF-8".into(),
                    "LANGUAGE=en_US:en".into(),
                    "LC_ALL=en_US.UTF-8".into(),
                ],
                working_dir: Some("/git-restapi".into()),
            },
            created: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(Mutex::new(Vec::new())),
            removed: Arc::new(Mutex::new(Vec::new())),
            fail_start: false,
        }
    }

    pub async fn last_invocation(&self) -> Vec<String> {
        let spec = self.created.lock().await.last().cloned().expect("no create");
        self.image.invocation(&spec.args)
    }
}

#[async_trait]
impl ContainerLauncher for FakeLauncher {
    async fn create(&self, spec: RunSpec) -> anyhow::Result<String> {
        let mut created = self.created.lock().await;
        created.push(spec);
        Ok(format!("ctr-{}", created.len()))
    }
    async fn start(&self, container_id: &str) -> anyhow::Result<()> {
        if self.fail_start {
            anyhow::bail!("exec: \"python3\": executable file not found in $PATH");
        }
        self.started.lock().await.push(container_id.to_string());
        Ok(())
    }
    async fn wait(&self, _container_id: &str) -> anyhow::Result<i64> {
        let spec = self.created.lock().await.last().cloned().expect("no create");
        // argparse exits with 2 when the positional sdk_git_id is missing
        Ok(match spec.args.first().map(String::as_str) {
            Some("--help") => 0,
            None => 2,
            Some(_) => 1,
        })
    }
    async fn logs(&self, _container_id: &str) -> anyhow::Result<String> {
        Ok("usage: SwaggerToSdk.py [-h] sdk_git_id\n".to_string())
    }
    async fn remove(&self, container_id: &str, force: bool) -> anyhow::Result<()> {
        self.removed
            .lock()
            .await
            .push((container_id.to_string(), force));
        Ok(())
    }
    async fn inspect_image(&self, _image: &str) -> anyhow::Result<ImageConfig> {
        Ok(self.image.clone())
    }
}

fn spec() -> ImageSpec {
    ImageSpec::from(&Settings::default().image)
}

#[tokio::test]
async fn run_appends_arguments_to_entrypoint() {
    let launcher = FakeLauncher::new();
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");

    let run = invoker
        .run("swagger-to-sdk:latest", &["--help".to_string()])
        .await
        .unwrap();

    assert_eq!(run.exit_code, 0);
    assert_eq!(
        launcher.last_invocation().await,
        vec!["python3", "/SwaggerToSdk.py", "--help"]
    );
    assert!(run.logs.starts_with("usage:"));
}

#[tokio::test]
async fn run_without_arguments_uses_bare_entrypoint() {
    let launcher = FakeLauncher::new();
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");

    let run = invoker.run("swagger-to-sdk:latest", &[]).await.unwrap();

    assert_eq!(
        launcher.last_invocation().await,
        vec!["python3", "/SwaggerToSdk.py"]
    );
    // Exit code of the entrypoint is passed through untouched
    assert_eq!(run.exit_code, 2);
}

#[tokio::test]
async fn containers_are_removed_after_run() {
    let launcher = FakeLauncher::new();
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");

    let run = invoker
        .run("swagger-to-sdk:latest", &["Azure/azure-sdk-for-python".to_string()])
        .await
        .unwrap();

    assert_eq!(run.exit_code, 1);
    let removed = launcher.removed.lock().await.clone();
    assert_eq!(removed, vec![(run.container_id.clone(), true)]);

    let created = launcher.created.lock().await.clone();
    assert!(created[0].name.starts_with("swagger-to-sdk-"));
}

#[tokio::test]
async fn each_run_uses_a_fresh_container_and_keeps_argument_order() {
    let launcher = FakeLauncher::new();
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");
    let args = vec!["-v".to_string(), "Azure/azure-sdk-for-python".to_string()];

    invoker.run("swagger-to-sdk:latest", &args).await.unwrap();
    invoker.run("swagger-to-sdk:latest", &args).await.unwrap();

    let created = launcher.created.lock().await.clone();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0].name, created[1].name);
    assert_eq!(created[1].args, args);
    assert_eq!(
        launcher.last_invocation().await,
        vec!["python3", "/SwaggerToSdk.py", "-v", "Azure/azure-sdk-for-python"]
    );
}

#[tokio::test]
async fn failed_start_is_launch_error() {
    let mut launcher = FakeLauncher::new();
    launcher.fail_start = true;
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");

    let err = invoker.run("swagger-to-sdk:latest", &[]).await.unwrap_err();

    match err {
        SdkError::DockerError { message } => assert!(message.contains("failed to launch")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(launcher.removed.lock().await.len(), 1);
    assert!(launcher.started.lock().await.is_empty());
}

#[tokio::test]
async fn verify_checks_locale_and_workdir() {
    let launcher = FakeLauncher::new();
    let invoker = ContainerInvoker::new(Arc::new(launcher.clone()), "swagger-to-sdk");
    let config = invoker.verify("swagger-to-sdk:latest", &spec()).await.unwrap();
    assert_eq!(config.env_value("LANGUAGE"), Some("en_US:en"));

    let mut broken = FakeLauncher::new();
    broken.image.working_dir = None;
    let invoker = ContainerInvoker::new(Arc::new(broken), "swagger-to-sdk");
    assert!(matches!(
        invoker.verify("swagger-to-sdk:latest", &spec()).await,
        Err(SdkError::ImageMismatch { .. })
    ));
}
