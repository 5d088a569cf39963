//! The REST API pull request a CI build was triggered by.

use crate::composite::swagger_index_from_composite;
use regex::Regex;
use sdk_github::{GithubApi, PullRequest};
use sdk_models::{CiContext, SdkError};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPr {
    /// Repository the PR belongs to (`TRAVIS_REPO_SLUG`).
    pub repo_id: String,
    pub pull: PullRequest,
}

/// Travis PR number first, otherwise a merged PR referenced as `#<n>` in the
/// build commit message. Always `None` outside Travis.
#[instrument(skip(github, ci))]
pub async fn resolve_initial_pr(
    github: &dyn GithubApi,
    ci: &CiContext,
) -> Result<Option<InitialPr>, SdkError> {
    let Some(travis) = &ci.travis else {
        return Ok(None);
    };
    let Some(repo_id) = travis.repo_slug.clone() else {
        warn!("TRAVIS_REPO_SLUG is not set, cannot find the initial PR");
        return Ok(None);
    };

    if let Some(number) = travis.pull_request {
        let pull = github.pull_request(&repo_id, number).await?;
        return Ok(Some(InitialPr { repo_id, pull }));
    }
    info!("This build don't come from a PR");

    let Some(commit) = &travis.commit else {
        return Ok(None);
    };
    let message = github.commit_message(&repo_id, commit).await?;

    for number in referenced_numbers(&message) {
        info!("Check if {} is a PR", number);
        match github.pull_request(&repo_id, number).await {
            Ok(pull) if pull.merged => return Ok(Some(InitialPr { repo_id, pull })),
            // Unmerged PR, or a plain issue (404 on the pulls endpoint)
            _ => continue,
        }
    }
    warn!("Was not able to found PR commit message");
    Ok(None)
}

static PR_REFERENCE: OnceLock<Regex> = OnceLock::new();
static SWAGGER_FILE: OnceLock<Regex> = OnceLock::new();

fn pr_reference() -> &'static Regex {
    PR_REFERENCE.get_or_init(|| Regex::new(r"#(\d+)").expect("PR reference pattern is valid"))
}

fn swagger_file() -> &'static Regex {
    SWAGGER_FILE.get_or_init(|| {
        Regex::new(r"(?i)^.*/swagger/.*\.json").expect("swagger file pattern is valid")
    })
}

/// `#<n>` references of a commit message, in order.
pub fn referenced_numbers(message: &str) -> Vec<u64> {
    pr_reference()
        .captures_iter(message)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

pub fn is_swagger_file(filename: &str) -> bool {
    swagger_file().is_match(filename)
}

/// Swagger files changed by the PR.
pub async fn swagger_files_in_pr(
    github: &dyn GithubApi,
    initial_pr: &InitialPr,
) -> Result<BTreeSet<String>, SdkError> {
    Ok(github
        .pull_request_files(&initial_pr.repo_id, initial_pr.pull.number)
        .await?
        .into_iter()
        .map(|f| f.filename)
        .filter(|f| is_swagger_file(f))
        .collect())
}

/// Swagger files of the PR plus the composite files referencing them.
#[instrument(skip(github, initial_pr), fields(pr = initial_pr.pull.number))]
pub async fn swagger_project_files_in_pr(
    github: &dyn GithubApi,
    initial_pr: &InitialPr,
    restapi_git_folder: &Path,
) -> Result<BTreeSet<String>, SdkError> {
    let mut files = swagger_files_in_pr(github, initial_pr).await?;
    let index = swagger_index_from_composite(restapi_git_folder)?;

    let composites: Vec<String> = files
        .iter()
        .filter_map(|swagger| index.get(swagger).cloned())
        .collect();
    files.extend(composites);

    info!("Project files in PR: {:?}", files);
    Ok(files)
}

/// Travis badge of the SDK fork branch followed by `comment`.
pub fn compute_pr_comment_with_sdk_pr(comment: &str, sdk_fork_id: &str, branch_name: &str) -> String {
    format!(
        "[![Build Status](https://travis-ci.org/{fork}.svg?branch={branch})](https://travis-ci.org/{fork}) {comment}",
        fork = sdk_fork_id,
        branch = branch_name,
    )
}

/// Comment the initial PR. `false` when there is none.
pub async fn add_comment_to_initial_pr(
    github: &dyn GithubApi,
    initial_pr: Option<&InitialPr>,
    comment: &str,
) -> Result<bool, SdkError> {
    let Some(initial_pr) = initial_pr else {
        return Ok(false);
    };
    github
        .create_issue_comment(&initial_pr.repo_id, initial_pr.pull.number, comment)
        .await?;
    info!("Commented {}", initial_pr.pull.html_url);
    Ok(true)
}
