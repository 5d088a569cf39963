use sdk_models::SdkError;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument, warn};
use zip::ZipArchive;

pub struct ZipHandler {
    max_zip_size: u64,
}

impl ZipHandler {
    pub fn new(max_zip_size: u64) -> Self {
        Self { max_zip_size }
    }

    #[instrument(skip(self, zip_data))]
    pub async fn process_zip(&self, zip_data: &[u8]) -> Result<PackageInfo, SdkError> {
        self.check_size(zip_data)?;

        let mut hasher = Sha256::new();
        hasher.update(zip_data);
        let sha256 = format!("{:x}", hasher.finalize());

        let mut archive = open_archive(zip_data)?;
        let mut files = Vec::new();
        let mut total_size = 0;

        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(invalid_package)?;
            total_size += file.size();
            files.push(PackageFileInfo {
                name: file.name().to_string(),
                size: file.size(),
            });
        }

        info!(
            "Processed package with {} files, total size: {} bytes, SHA256: {}",
            files.len(),
            total_size,
            sha256
        );

        Ok(PackageInfo {
            sha256,
            files,
            total_size,
        })
    }

    #[instrument(skip(self, zip_data))]
    pub async fn extract_to_directory(
        &self,
        zip_data: &[u8],
        target_dir: &Path,
    ) -> Result<(), SdkError> {
        self.check_size(zip_data)?;
        let mut archive = open_archive(zip_data)?;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(invalid_package)?;

            // Entries escaping the target directory are refused
            let relative = match file.enclosed_name() {
                Some(name) => name.to_path_buf(),
                None => {
                    warn!("Refusing package entry outside of target: {}", file.name());
                    return Err(SdkError::InvalidPackage {
                        reason: format!("unsafe entry path: {}", file.name()),
                    });
                }
            };
            let file_path = target_dir.join(relative);

            if file.is_dir() {
                std::fs::create_dir_all(&file_path)?;
                continue;
            }

            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut file_data = Vec::new();
            file.read_to_end(&mut file_data).map_err(|e| SdkError::InvalidPackage {
                reason: e.to_string(),
            })?;
            std::fs::write(&file_path, file_data)?;

            if let Some(mode) = file.unix_mode() {
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(&file_path, std::fs::Permissions::from_mode(mode))?;
                }
                #[cfg(not(unix))]
                let _ = mode;
            }
        }

        info!("Extracted package to directory: {}", target_dir.display());
        Ok(())
    }

    fn check_size(&self, zip_data: &[u8]) -> Result<(), SdkError> {
        if zip_data.len() as u64 > self.max_zip_size {
            return Err(SdkError::InvalidPackage {
                reason: format!(
                    "package too large: {} bytes (max: {})",
                    zip_data.len(),
                    self.max_zip_size
                ),
            });
        }
        Ok(())
    }
}

fn open_archive(zip_data: &[u8]) -> Result<ZipArchive<std::io::Cursor<&[u8]>>, SdkError> {
    ZipArchive::new(std::io::Cursor::new(zip_data)).map_err(invalid_package)
}

fn invalid_package(e: zip::result::ZipError) -> SdkError {
    SdkError::InvalidPackage {
        reason: e.to_string(),
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageInfo {
    pub sha256: String,
    pub files: Vec<PackageFileInfo>,
    pub total_size: u64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageFileInfo {
    pub name: String,
    pub size: u64,
}
