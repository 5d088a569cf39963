use sdk_models::ProjectConfig;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected,
    /// No `--project` prefix matches the project name.
    NotInPatterns,
    /// The project's swagger is not part of the initial PR.
    NotInPr,
}

/// Which projects of the SDK configuration a run generates.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    patterns: Vec<String>,
    pr_files: Option<BTreeSet<String>>,
}

impl ProjectFilter {
    /// Empty `patterns` selects every project. `pr_files` is set when the run
    /// was triggered by a REST API PR.
    pub fn new(patterns: Vec<String>, pr_files: Option<BTreeSet<String>>) -> Self {
        Self { patterns, pr_files }
    }

    pub fn select(&self, name: &str, project: &ProjectConfig) -> Selection {
        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| name.starts_with(p.as_str())) {
            return Selection::NotInPatterns;
        }
        match &self.pr_files {
            Some(files) if !files.contains(&project.swagger) => Selection::NotInPr,
            _ => Selection::Selected,
        }
    }
}
