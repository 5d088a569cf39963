use crate::ZipHandler;
use bytes::Bytes;
use reqwest::Client;
use sdk_models::{AutorestSettings, SdkError, LATEST_TAG};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument};

/// Download link of an AutoRest NuGet package. `latest` uses the bare feed URL.
pub fn download_link(base_url: &str, version: &str) -> String {
    if version == LATEST_TAG {
        base_url.to_string()
    } else {
        format!("{base_url}{version}")
    }
}

pub struct AutorestInstaller {
    client: Client,
    settings: AutorestSettings,
    zip_handler: ZipHandler,
}

impl AutorestInstaller {
    pub fn new(client: Client, settings: AutorestSettings) -> Self {
        let zip_handler = ZipHandler::new(settings.max_package_size_mb * 1024 * 1024);
        Self {
            client,
            settings,
            zip_handler,
        }
    }

    /// Path of the AutoRest executable.
    ///
    /// With `autorest_dir` the executable must already be there. Otherwise the
    /// package for `version` is downloaded into `<temp_dir>/autorest`.
    #[instrument(skip(self))]
    pub async fn install(
        &self,
        temp_dir: &Path,
        version: &str,
        autorest_dir: Option<&Path>,
    ) -> Result<PathBuf, SdkError> {
        if let Some(dir) = autorest_dir {
            return self.locate(dir);
        }

        let output_dir = temp_dir.join("autorest");
        tokio::fs::create_dir(&output_dir).await?;

        let package = self.download(version).await?;
        self.install_package(&package, &output_dir).await
    }

    pub fn locate(&self, autorest_dir: &Path) -> Result<PathBuf, SdkError> {
        let autorest_path = autorest_dir.join(&self.settings.executable);
        if autorest_path.exists() {
            Ok(autorest_path)
        } else {
            Err(SdkError::AutorestNotFound {
                path: autorest_path.display().to_string(),
            })
        }
    }

    #[instrument(skip(self))]
    pub async fn download(&self, version: &str) -> Result<Bytes, SdkError> {
        let link = download_link(&self.settings.download_base_url, version);
        info!("Download Autorest from: {}", link);

        let response = self.client.get(&link).send().await.map_err(|e| {
            let err = SdkError::AutorestDownload {
                version: version.to_string(),
                link: link.clone(),
            };
            error!("{} ({})", err, e);
            err
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| SdkError::InternalError {
            reason: e.to_string(),
        })?;

        if status != reqwest::StatusCode::OK {
            return Err(SdkError::InvalidPackage {
                reason: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        info!("Downloaded");
        Ok(body)
    }

    /// Extract a downloaded package and return `<output_dir>/tools/<executable>`.
    pub async fn install_package(
        &self,
        package: &[u8],
        output_dir: &Path,
    ) -> Result<PathBuf, SdkError> {
        self.zip_handler.process_zip(package).await?;
        self.zip_handler
            .extract_to_directory(package, output_dir)
            .await?;
        Ok(output_dir.join("tools").join(&self.settings.executable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk_models::Settings;

    fn installer() -> AutorestInstaller {
        AutorestInstaller::new(Client::new(), Settings::default().autorest)
    }

    #[test]
    fn test_download_link() {
        let base = "https://www.myget.org/F/autorest/api/v2/package/AutoRest/";
        assert_eq!(download_link(base, "latest"), base);
        assert_eq!(
            download_link(base, "0.17.3"),
            "https://www.myget.org/F/autorest/api/v2/package/AutoRest/0.17.3"
        );
    }

    #[test]
    fn test_locate_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let err = installer().locate(dir.path()).unwrap_err();
        assert!(matches!(err, SdkError::AutorestNotFound { .. }));
        assert!(err.to_string().ends_with("AutoRest.exe does not exists"));
    }

    #[test]
    fn test_locate_existing_executable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AutoRest.exe"), b"MZ").unwrap();
        assert_eq!(
            installer().locate(dir.path()).unwrap(),
            dir.path().join("AutoRest.exe")
        );
    }

    #[tokio::test]
    async fn test_install_with_explicit_dir_skips_download() {
        let temp = tempfile::tempdir().unwrap();
        let autorest_dir = tempfile::tempdir().unwrap();
        std::fs::write(autorest_dir.path().join("AutoRest.exe"), b"MZ").unwrap();

        let path = installer()
            .install(temp.path(), "latest", Some(autorest_dir.path()))
            .await
            .unwrap();
        assert_eq!(path, autorest_dir.path().join("AutoRest.exe"));
        assert!(!temp.path().join("autorest").exists());
    }
}
