//! Getting generated code back to GitHub: git identity, commit, fork sync
//! and pull request.

use crate::branch::commit_message;
use crate::initial_pr::{add_comment_to_initial_pr, compute_pr_comment_with_sdk_pr, InitialPr};
use sdk_github::{GithubApi, NewPullRequest, PullRequest};
use sdk_invoker::{authenticated_url, GitRepo};
use sdk_models::{GitSettings, SdkError};
use tracing::{debug, info, instrument, warn};

/// Commit as the token owner, with fallbacks for users without a public
/// name or email.
pub async fn configure_user(
    github: &dyn GithubApi,
    repo: &GitRepo,
    settings: &GitSettings,
) -> Result<(), SdkError> {
    let user = github.current_user().await?;
    let email = user
        .email
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| settings.fallback_user_email.clone());
    let name = user
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| settings.fallback_user_name.clone());
    repo.set_config("user.email", &email).await?;
    repo.set_config("user.name", &name).await
}

/// Commit every change of the working tree on `branch_name`. `false` when
/// there was nothing to commit.
#[instrument(skip(repo, message_template))]
pub async fn do_commit(
    repo: &GitRepo,
    message_template: &str,
    branch_name: &str,
    hexsha: &str,
) -> Result<bool, SdkError> {
    repo.add_all().await?;

    if !repo.has_staged_changes().await? {
        warn!("No modified files in this Autorest run");
        return Ok(false);
    }

    repo.checkout_or_create_branch(branch_name).await?;
    let message = commit_message(message_template, hexsha);
    repo.commit(&message).await?;
    info!("Commit done: {}", message);
    Ok(true)
}

/// `owner:branch` when the SDK id names an owner, `branch` otherwise.
pub fn pr_head(sdk_git_id: &str, branch_name: &str) -> String {
    match sdk_git_id.split_once('/') {
        Some((owner, _)) => format!("{owner}:{branch_name}"),
        None => branch_name.to_string(),
    }
}

/// Open the SDK pull request and advertise it on the initial PR.
///
/// `Ok(None)` when a PR already exists for this branch.
#[instrument(skip(github, initial_pr))]
pub async fn do_pr(
    github: &dyn GithubApi,
    sdk_git_id: &str,
    sdk_pr_target_repo_id: &str,
    branch_name: &str,
    base_branch: &str,
    initial_pr: Option<&InitialPr>,
) -> Result<Option<PullRequest>, SdkError> {
    let head = pr_head(sdk_git_id, branch_name);
    info!("Do the PR from {}", head);

    let body = initial_pr
        .map(|pr| format!("Generated from RestAPI PR: {}", pr.pull.html_url))
        .unwrap_or_default();

    let request = NewPullRequest {
        title: format!("Automatic PR from {branch_name}"),
        body,
        head,
        base: base_branch.to_string(),
    };

    let Some(github_pr) = github
        .create_pull_request(sdk_pr_target_repo_id, &request)
        .await?
    else {
        info!("PR already exists, it was a commit on an open PR");
        return Ok(None);
    };
    info!("Made PR {}", github_pr.html_url);

    let comment = compute_pr_comment_with_sdk_pr(&github_pr.html_url, sdk_git_id, branch_name);
    add_comment_to_initial_pr(github, initial_pr, &comment).await?;
    Ok(Some(github_pr))
}

/// Rebase the current branch of a fork on its GitHub parent and push.
///
/// Nothing happens when the repository is not a fork or the parent has no
/// branch of the same name. Returns whether a rebase was done.
#[instrument(skip(github, repo))]
pub async fn sync_fork(
    github: &dyn GithubApi,
    host: &str,
    github_repo_id: &str,
    repo: &GitRepo,
) -> Result<bool, SdkError> {
    info!("Check if repo has to be sync with upstream");
    let github_repo = github.repository(github_repo_id).await?;
    let Some(parent) = github_repo.parent else {
        info!("{} is not a fork, nothing to sync", github_repo_id);
        return Ok(false);
    };

    let upstream_url = authenticated_url(host, &parent.full_name, None);
    repo.add_remote("upstream", &upstream_url).await?;
    repo.fetch("upstream").await?;

    let active_branch = repo.active_branch().await?;
    if !repo.has_remote_branch("upstream", &active_branch).await? {
        info!("Upstream has no branch {} to merge from", active_branch);
        return Ok(false);
    }
    info!("Merge from upstream");
    let msg = repo.rebase(&format!("upstream/{active_branch}")).await?;
    debug!("{}", msg);
    repo.push_current().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_head() {
        assert_eq!(
            pr_head("lmazuel/azure-sdk-for-python", "RestAPI-PR12"),
            "lmazuel:RestAPI-PR12"
        );
        assert_eq!(pr_head("azure-sdk-for-python", "autorest"), "autorest");
    }
}
