//! The `swagger_to_sdk_config.json` file read from the SDK repository.
//!
//! Options can be given both in `meta` (global) and per project (local).
//! Local options take precedence: maps are overridden key by key, lists are
//! unioned.

use crate::SdkError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const CONFIG_FILE: &str = "swagger_to_sdk_config.json";
pub const LATEST_TAG: &str = "latest";

/// Options that can appear both in `meta` and in a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autorest_options: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(
        rename = "wrapper_filesOrDirs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub wrapper_files_or_dirs: Option<Vec<String>>,
    #[serde(
        rename = "delete_filesOrDirs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delete_files_or_dirs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_relative_base_directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetaConfig {
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autorest: Option<String>,
    #[serde(flatten)]
    pub options: OptionLayer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub swagger: String,
    pub output_dir: String,
    #[serde(flatten)]
    pub options: OptionLayer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SdkConfig {
    pub meta: MetaConfig,
    #[serde(default)]
    pub projects: IndexMap<String, ProjectConfig>,
}

impl SdkConfig {
    /// Read the configuration file relative to the SDK working tree.
    pub fn load(sdk_folder: &Path, config_file: &str) -> Result<Self, SdkError> {
        let config_path = sdk_folder.join(config_file);
        let content = std::fs::read_to_string(&config_path).map_err(|e| SdkError::ConfigError {
            reason: format!("cannot read {}: {}", config_path.display(), e),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, SdkError> {
        serde_json::from_str(content).map_err(|e| SdkError::ConfigError {
            reason: e.to_string(),
        })
    }

    pub fn language(&self) -> &str {
        &self.meta.language
    }

    pub fn autorest_version(&self) -> &str {
        self.meta.autorest.as_deref().unwrap_or(LATEST_TAG)
    }
}

/// Effective options of one project once `meta` and the project are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedOptions {
    pub autorest_options: BTreeMap<String, serde_json::Value>,
    pub wrapper_files_or_dirs: Vec<String>,
    pub delete_files_or_dirs: Vec<String>,
    pub generated_relative_base_directory: Option<String>,
}

impl MergedOptions {
    pub fn merge(global: &OptionLayer, local: &OptionLayer) -> Self {
        Self {
            autorest_options: merge_map(
                global.autorest_options.as_ref(),
                local.autorest_options.as_ref(),
            )
            .unwrap_or_default(),
            wrapper_files_or_dirs: merge_list(
                global.wrapper_files_or_dirs.as_deref(),
                local.wrapper_files_or_dirs.as_deref(),
            )
            .unwrap_or_default(),
            delete_files_or_dirs: merge_list(
                global.delete_files_or_dirs.as_deref(),
                local.delete_files_or_dirs.as_deref(),
            )
            .unwrap_or_default(),
            generated_relative_base_directory: local
                .generated_relative_base_directory
                .clone()
                .or_else(|| global.generated_relative_base_directory.clone()),
        }
    }

    /// AutoRest command line options for `language`, sorted by key.
    ///
    /// `CodeGenerator` defaults to `Azure.<language>`.
    pub fn autorest_arguments(&self, language: &str) -> Vec<String> {
        let mut options = self.autorest_options.clone();
        options
            .entry("CodeGenerator".to_string())
            .or_insert_with(|| serde_json::Value::String(format!("Azure.{language}")));

        options
            .iter()
            .flat_map(|(key, value)| [format!("-{key}"), option_value(value)])
            .collect()
    }
}

fn option_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Local entries override global ones. `None` only if both sides are absent.
pub fn merge_map<V: Clone>(
    global: Option<&BTreeMap<String, V>>,
    local: Option<&BTreeMap<String, V>>,
) -> Option<BTreeMap<String, V>> {
    match (global, local) {
        (None, None) => None,
        (Some(g), None) => Some(g.clone()),
        (None, Some(l)) => Some(l.clone()),
        (Some(g), Some(l)) => {
            let mut merged = g.clone();
            merged.extend(l.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
    }
}

/// Union of both lists, global entries first, without duplicates.
pub fn merge_list(global: Option<&[String]>, local: Option<&[String]>) -> Option<Vec<String>> {
    match (global, local) {
        (None, None) => None,
        (g, l) => {
            let mut merged: Vec<String> = Vec::new();
            for item in g.unwrap_or_default().iter().chain(l.unwrap_or_default()) {
                if !merged.contains(item) {
                    merged.push(item.clone());
                }
            }
            Some(merged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE: &str = r#"{
        "meta": {
            "language": "Python",
            "autorest": "1.0.1-20170301",
            "autorest_options": {"Header": "MICROSOFT_MIT", "PayloadFlatteningThreshold": 2},
            "wrapper_filesOrDirs": ["azure/__init__.py"],
            "delete_filesOrDirs": ["credentials.py"],
            "generated_relative_base_directory": "*client"
        },
        "projects": {
            "storage": {
                "swagger": "arm-storage/2016-01-01/swagger/storage.json",
                "output_dir": "azure-mgmt-storage",
                "autorest_options": {"Namespace": "azure.mgmt.storage", "Header": "NONE"},
                "wrapper_filesOrDirs": ["azure/__init__.py", "azure/mgmt/__init__.py"]
            },
            "batch": {
                "swagger": "arm-batch/swagger/batch.json",
                "output_dir": "azure-mgmt-batch"
            }
        }
    }"#;

    #[test]
    fn test_parse_keeps_project_order() {
        let config = SdkConfig::from_json(SAMPLE).unwrap();
        let names: Vec<&String> = config.projects.keys().collect();
        assert_eq!(names, vec!["storage", "batch"]);
        assert_eq!(config.language(), "Python");
        assert_eq!(config.autorest_version(), "1.0.1-20170301");
    }

    #[test]
    fn test_autorest_version_defaults_to_latest() {
        let config = SdkConfig::from_json(r#"{"meta": {"language": "Java"}}"#).unwrap();
        assert_eq!(config.autorest_version(), LATEST_TAG);
        assert!(config.projects.is_empty());
    }

    #[test]
    fn test_missing_language_is_config_error() {
        let err = SdkConfig::from_json(r#"{"meta": {}}"#).unwrap_err();
        assert!(matches!(err, SdkError::ConfigError { .. }));
    }

    #[test]
    fn test_merge_local_overrides_global() {
        let config = SdkConfig::from_json(SAMPLE).unwrap();
        let merged = MergedOptions::merge(&config.meta.options, &config.projects["storage"].options);

        assert_eq!(merged.autorest_options["Header"], json!("NONE"));
        assert_eq!(merged.autorest_options["Namespace"], json!("azure.mgmt.storage"));
        assert_eq!(merged.autorest_options["PayloadFlatteningThreshold"], json!(2));
        assert_eq!(
            merged.wrapper_files_or_dirs,
            vec!["azure/__init__.py", "azure/mgmt/__init__.py"]
        );
        assert_eq!(merged.delete_files_or_dirs, vec!["credentials.py"]);
        assert_eq!(merged.generated_relative_base_directory.as_deref(), Some("*client"));
    }

    #[test]
    fn test_merge_absent_sides() {
        assert_eq!(merge_list(None, None), None);
        let local = vec!["a".to_string()];
        assert_eq!(merge_list(None, Some(local.as_slice())), Some(local.clone()));
        assert_eq!(merge_map::<i32>(None, None), None);
    }

    #[test]
    fn test_autorest_arguments_sorted_with_code_generator() {
        let config = SdkConfig::from_json(SAMPLE).unwrap();
        let merged = MergedOptions::merge(&config.meta.options, &config.projects["batch"].options);
        assert_eq!(
            merged.autorest_arguments("Python"),
            vec![
                "-CodeGenerator",
                "Azure.Python",
                "-Header",
                "MICROSOFT_MIT",
                "-PayloadFlatteningThreshold",
                "2",
            ]
        );
    }

    #[test]
    fn test_explicit_code_generator_is_kept() {
        let mut options = MergedOptions::default();
        options
            .autorest_options
            .insert("CodeGenerator".to_string(), json!("Ruby"));
        assert_eq!(options.autorest_arguments("Python"), vec!["-CodeGenerator", "Ruby"]);
    }
}
