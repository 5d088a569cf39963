//! Replacement of an SDK destination folder by freshly generated code.

use crate::glob::{glob, relative_slash_path};
use sdk_models::{MergedOptions, SdkError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Move `generated_folder` (or its `generated_relative_base_directory`
/// match) into `destination_folder`.
///
/// Wrapper files are taken from the current destination and kept, the
/// `delete_filesOrDirs` entries are removed from the generated tree, then the
/// destination is replaced.
#[instrument(skip(options))]
pub fn update(
    generated_folder: &Path,
    destination_folder: &Path,
    options: &MergedOptions,
) -> Result<(), SdkError> {
    let client_generated_path = match &options.generated_relative_base_directory {
        Some(pattern) => glob(generated_folder, pattern)?
            .into_iter()
            .next()
            .ok_or_else(|| SdkError::ConfigError {
                reason: format!(
                    "generated_relative_base_directory '{}' matches nothing in {}",
                    pattern,
                    generated_folder.display()
                ),
            })?,
        None => generated_folder.to_path_buf(),
    };

    for pattern in &options.wrapper_files_or_dirs {
        for file_path in glob(destination_folder, pattern)? {
            // Already moved along with a matching parent
            if !file_path.exists() {
                continue;
            }
            let relative = relative_slash_path(destination_folder, &file_path);
            let target = client_generated_path.join(&relative);
            debug!("Keep wrapper {}", relative);
            replace(&file_path, &target)?;
        }
    }

    for pattern in &options.delete_files_or_dirs {
        for file_path in glob(&client_generated_path, pattern)? {
            if !file_path.exists() {
                continue;
            }
            debug!("Delete generated {}", file_path.display());
            remove(&file_path)?;
        }
    }

    std::fs::remove_dir_all(destination_folder)?;
    move_path(&client_generated_path, destination_folder)?;
    info!("Updated {}", destination_folder.display());
    Ok(())
}

/// Move `source` onto `target`, replacing whatever is there.
fn replace(source: &Path, target: &Path) -> Result<(), SdkError> {
    if target.exists() {
        remove(target)?;
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    move_path(source, target)
}

fn remove(path: &Path) -> Result<(), SdkError> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)?;
    } else {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Rename, falling back to copy + delete across file systems.
fn move_path(source: &Path, target: &Path) -> Result<(), SdkError> {
    if std::fs::rename(source, target).is_ok() {
        return Ok(());
    }
    copy_recursive(source, target)?;
    remove(source)
}

fn copy_recursive(source: &Path, target: &Path) -> Result<(), SdkError> {
    if source.is_dir() {
        std::fs::create_dir_all(target)?;
        for entry in std::fs::read_dir(source)? {
            let entry = entry?;
            let child: PathBuf = target.join(entry.file_name());
            copy_recursive(&entry.path(), &child)?;
        }
    } else {
        std::fs::copy(source, target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read(root: &Path, relative: &str) -> Option<String> {
        std::fs::read_to_string(root.join(relative)).ok()
    }

    #[test]
    fn test_update_keeps_wrappers_and_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated");
        let destination = dir.path().join("sdk/azure-mgmt-web");

        write(&generated, "azure/mgmt/web/client.py", "new client");
        write(&generated, "azure/mgmt/web/version.py", "generated version");
        write(&generated, "azure/__init__.py", "generated namespace");
        write(&destination, "azure/mgmt/web/client.py", "old client");
        write(&destination, "azure/mgmt/web/version.py", "VERSION = '0.30.0'");
        write(&destination, "setup.py", "setup()");

        let options = MergedOptions {
            wrapper_files_or_dirs: vec!["azure/mgmt/web/version.py".into(), "setup.py".into()],
            delete_files_or_dirs: vec!["azure/__init__.py".into()],
            ..Default::default()
        };
        update(&generated, &destination, &options).unwrap();

        assert_eq!(read(&destination, "azure/mgmt/web/client.py").unwrap(), "new client");
        assert_eq!(
            read(&destination, "azure/mgmt/web/version.py").unwrap(),
            "VERSION = '0.30.0'"
        );
        assert_eq!(read(&destination, "setup.py").unwrap(), "setup()");
        assert!(read(&destination, "azure/__init__.py").is_none());
        assert!(!generated.exists());
    }

    #[test]
    fn test_update_keeps_wrapper_directory_with_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated");
        let destination = dir.path().join("sdk/azure-mgmt");

        write(&generated, "azure/mgmt/web/client.py", "new client");
        write(&destination, "azure/mgmt/__init__.py", "namespace");
        write(&destination, "azure/mgmt/extras/helpers.py", "helpers");

        let options = MergedOptions {
            wrapper_files_or_dirs: vec!["azure/mgmt/extras/".into()],
            ..Default::default()
        };
        update(&generated, &destination, &options).unwrap();

        assert_eq!(read(&destination, "azure/mgmt/web/client.py").unwrap(), "new client");
        assert_eq!(
            read(&destination, "azure/mgmt/extras/helpers.py").unwrap(),
            "helpers"
        );
        assert!(read(&destination, "azure/mgmt/__init__.py").is_none());
    }

    #[test]
    fn test_update_with_relative_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated");
        let destination = dir.path().join("azure-sdk-for-node/lib/services/webSiteManagement");

        write(&generated, "lib/services/webSiteManagement/lib/client.js", "client");
        write(&generated, "lib/services/webSiteManagement/lib/models/index.js", "models");
        write(&destination, "package.json", "{}");
        write(&destination, "lib/stale.js", "stale");

        let options = MergedOptions {
            wrapper_files_or_dirs: vec!["package.json".into()],
            delete_files_or_dirs: vec!["lib/models".into()],
            generated_relative_base_directory: Some("*/*/webSiteManagement".into()),
            ..Default::default()
        };
        update(&generated, &destination, &options).unwrap();

        assert_eq!(read(&destination, "lib/client.js").unwrap(), "client");
        assert_eq!(read(&destination, "package.json").unwrap(), "{}");
        assert!(!destination.join("lib/models").exists());
        assert!(read(&destination, "lib/stale.js").is_none());
    }

    #[test]
    fn test_update_relative_base_directory_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let generated = dir.path().join("generated");
        let destination = dir.path().join("dest");
        write(&generated, "a.py", "");
        write(&destination, "b.py", "");

        let options = MergedOptions {
            generated_relative_base_directory: Some("missing*".into()),
            ..Default::default()
        };
        assert!(matches!(
            update(&generated, &destination, &options),
            Err(SdkError::ConfigError { .. })
        ));
        // Nothing was touched
        assert!(destination.join("b.py").exists());
    }
}
