//! Thin async wrapper over the `git` command line.

use sdk_models::SdkError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

pub const NOT_GIT_REPO_SHA: &str = "notgitrepo";

/// HTTPS clone URL of `repo_id`, with `login:token@` credentials when given.
pub fn authenticated_url(host: &str, repo_id: &str, credentials: Option<(&str, &str)>) -> String {
    let base = host.trim_end_matches('/');
    if !base.contains("://") {
        return match credentials {
            Some((login, token)) => format!("https://{login}:{token}@{base}/{repo_id}.git"),
            None => format!("https://{base}/{repo_id}.git"),
        };
    }
    // Explicit scheme, e.g. a file:// mirror
    format!("{base}/{repo_id}.git")
}

/// Hide credentials embedded in URLs before anything is logged.
pub fn redact_credentials(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("://") {
        let (head, tail) = rest.split_at(idx + 3);
        out.push_str(head);
        let end = tail
            .find(|c: char| c.is_whitespace() || c == '/' || c == '\'' || c == '"')
            .unwrap_or(tail.len());
        match tail[..end].rfind('@') {
            Some(at) => {
                out.push_str("***");
                out.push_str(&tail[at..end]);
            }
            None => out.push_str(&tail[..end]),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone)]
pub struct GitRepo {
    workdir: PathBuf,
}

impl GitRepo {
    pub fn open(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    #[instrument(skip(url), fields(url = %redact_credentials(url)))]
    pub async fn clone_from(url: &str, path: &Path) -> Result<Self, SdkError> {
        let output = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| git_error("clone", e.to_string()))?;
        if !output.status.success() {
            return Err(git_error(
                "clone",
                redact_credentials(&String::from_utf8_lossy(&output.stderr)),
            ));
        }
        info!("Clone success");
        Ok(Self::open(path))
    }

    async fn output(&self, args: &[&str]) -> Result<std::process::Output, SdkError> {
        Command::new("git")
            .arg("-C")
            .arg(&self.workdir)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| git_error(args.first().copied().unwrap_or("git"), e.to_string()))
    }

    async fn run(&self, args: &[&str]) -> Result<String, SdkError> {
        let output = self.output(args).await?;
        if !output.status.success() {
            return Err(git_error(
                args.first().copied().unwrap_or("git"),
                redact_credentials(String::from_utf8_lossy(&output.stderr).trim()),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!("git {}: {}", args.join(" "), redact_credentials(&stdout));
        Ok(stdout)
    }

    async fn succeeds(&self, args: &[&str]) -> Result<bool, SdkError> {
        Ok(self.output(args).await?.status.success())
    }

    pub async fn checkout(&self, name: &str) -> Result<(), SdkError> {
        self.run(&["checkout", name]).await.map(|_| ())
    }

    pub async fn has_local_branch(&self, name: &str) -> Result<bool, SdkError> {
        let reference = format!("refs/heads/{name}");
        self.succeeds(&["rev-parse", "--verify", "--quiet", &reference])
            .await
    }

    pub async fn has_remote_branch(&self, remote: &str, name: &str) -> Result<bool, SdkError> {
        let reference = format!("refs/remotes/{remote}/{name}");
        self.succeeds(&["rev-parse", "--verify", "--quiet", &reference])
            .await
    }

    /// Checkout `name`, creating it when neither a local nor an `origin`
    /// branch exists.
    pub async fn checkout_or_create_branch(&self, name: &str) -> Result<(), SdkError> {
        if self.has_local_branch(name).await? {
            return self.checkout(name).await;
        }
        if self.has_remote_branch("origin", name).await? {
            // Creates the local branch tracking origin
            return self.checkout(name).await;
        }
        self.run(&["checkout", "-b", name]).await.map(|_| ())
    }

    pub async fn add_all(&self) -> Result<(), SdkError> {
        self.run(&["add", "-A"]).await.map(|_| ())
    }

    pub async fn has_staged_changes(&self) -> Result<bool, SdkError> {
        let output = self.output(&["diff", "--cached", "--quiet"]).await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(git_error(
                "diff",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }

    pub async fn commit(&self, message: &str) -> Result<(), SdkError> {
        self.run(&["commit", "-m", message]).await.map(|_| ())
    }

    pub async fn push(&self, remote: &str, branch: &str, set_upstream: bool) -> Result<(), SdkError> {
        if set_upstream {
            self.run(&["push", "--set-upstream", remote, branch]).await?;
        } else {
            self.run(&["push", remote, branch]).await?;
        }
        Ok(())
    }

    pub async fn push_current(&self) -> Result<(), SdkError> {
        self.run(&["push"]).await.map(|_| ())
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), SdkError> {
        self.run(&["config", key, value]).await.map(|_| ())
    }

    pub async fn add_remote(&self, name: &str, url: &str) -> Result<(), SdkError> {
        self.run(&["remote", "add", name, url]).await.map(|_| ())
    }

    pub async fn fetch(&self, remote: &str) -> Result<(), SdkError> {
        self.run(&["fetch", remote]).await.map(|_| ())
    }

    pub async fn rebase(&self, upstream: &str) -> Result<String, SdkError> {
        self.run(&["rebase", upstream]).await
    }

    pub async fn active_branch(&self) -> Result<String, SdkError> {
        self.run(&["symbolic-ref", "--short", "HEAD"]).await
    }

    pub async fn head_sha(&self) -> Result<String, SdkError> {
        self.run(&["rev-parse", "HEAD"]).await
    }
}

/// SHA1 of the REST API checkout, or `notgitrepo` when it isn't a git repository.
pub async fn swagger_hexsha(restapi_git_folder: &Path) -> String {
    match GitRepo::open(restapi_git_folder).head_sha().await {
        Ok(hexsha) => {
            info!("Found REST API repo SHA1: {}", hexsha);
            hexsha
        }
        Err(e) => {
            warn!(
                "Not a git repo, SHA1 used will be: {} ({})",
                NOT_GIT_REPO_SHA, e
            );
            NOT_GIT_REPO_SHA.to_string()
        }
    }
}

fn git_error(command: &str, message: String) -> SdkError {
    SdkError::GitError {
        command: command.to_string(),
        message,
    }
}
