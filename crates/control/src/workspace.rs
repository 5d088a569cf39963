use sdk_invoker::{authenticated_url, GitRepo};
use sdk_models::SdkError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Temporary directory of one run: the SDK clone (`sdk/`), the AutoRest
/// installation and the generated code.
///
/// Dropping it removes everything. Read-only files (git packs) are made
/// writable first so the removal succeeds on every platform.
pub struct RunWorkspace {
    sdk_path: PathBuf,
    temp_dir: TempDir,
}

impl RunWorkspace {
    pub fn new() -> Result<Self, SdkError> {
        let temp_dir = tempfile::tempdir()?;
        let sdk_path = temp_dir.path().join("sdk");
        Ok(Self { sdk_path, temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn sdk_path(&self) -> &Path {
        &self.sdk_path
    }

    /// Clone `sdk_git_id` into `sdk/`, authenticated as `login` when a
    /// token is available.
    pub async fn clone_sdk(
        &self,
        host: &str,
        sdk_git_id: &str,
        credentials: Option<(&str, &str)>,
    ) -> Result<GitRepo, SdkError> {
        info!("Clone SDK repository {}", sdk_git_id);
        if credentials.is_none() {
            warn!("Will clone the repo without writing credentials");
        }
        let url = authenticated_url(host, sdk_git_id, credentials);
        let repo = GitRepo::clone_from(&url, &self.sdk_path).await?;
        debug!("SDK path {}", self.sdk_path.display());
        Ok(repo)
    }
}

impl Drop for RunWorkspace {
    fn drop(&mut self) {
        debug!("Preclean SDK folder");
        if self.sdk_path.exists() {
            clear_readonly(&self.sdk_path);
            if let Err(e) = std::fs::remove_dir_all(&self.sdk_path) {
                warn!("Unable to remove {}: {}", self.sdk_path.display(), e);
            }
        }
    }
}

fn clear_readonly(path: &Path) {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return;
    };
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        let _ = std::fs::set_permissions(path, permissions);
    }
    if metadata.is_dir() {
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.flatten() {
                clear_readonly(&entry.path());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_removes_readonly_tree() {
        let workspace = RunWorkspace::new().unwrap();
        let root = workspace.path().to_path_buf();
        let objects = workspace.sdk_path().join(".git/objects/ab");
        std::fs::create_dir_all(&objects).unwrap();
        let object = objects.join("cdef");
        std::fs::write(&object, "blob").unwrap();
        let mut permissions = std::fs::metadata(&object).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&object, permissions).unwrap();

        drop(workspace);
        assert!(!root.exists());
    }
}
