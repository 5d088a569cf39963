use crate::branch::compute_branch_name;
use crate::initial_pr::{
    add_comment_to_initial_pr, resolve_initial_pr, swagger_project_files_in_pr, InitialPr,
};
use crate::publish::{configure_user, do_commit, do_pr, sync_fork};
use crate::selection::{ProjectFilter, Selection};
use crate::update::update;
use crate::workspace::RunWorkspace;
use sdk_github::{GithubApi, PullRequest};
use sdk_invoker::{generate_code, swagger_hexsha, AutorestCommand, GitRepo};
use sdk_models::{CiContext, MergedOptions, ProjectConfig, SdkConfig, SdkError, Settings};
use sdk_packaging::AutorestInstaller;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Parameters of one generation run, as given on the command line.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// `owner/repo`, or `repo` for a repository of the token owner.
    pub sdk_git_id: String,
    pub config_path: String,
    /// Project name prefixes. Empty means every project.
    pub project_patterns: Vec<String>,
    pub restapi_git_folder: PathBuf,
    pub pr_repo_id: Option<String>,
    pub message_template: String,
    pub base_branch: String,
    pub branch: Option<String>,
    pub autorest_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub sdk_git_id: String,
    /// Destination branch, only computed when a token is available.
    pub branch: Option<String>,
    pub generated: Vec<String>,
    pub skipped: Vec<(String, Selection)>,
    pub committed: bool,
    pub pull_request: Option<PullRequest>,
}

enum Published {
    Unchanged,
    /// Branch pushed, with the SDK PR when one was opened.
    Pushed(Option<PullRequest>),
}

pub struct SdkBuilder {
    settings: Settings,
    github: Arc<dyn GithubApi>,
    token: Option<String>,
    ci: CiContext,
    installer: AutorestInstaller,
}

impl SdkBuilder {
    /// `token` gates everything that writes to GitHub. The `github` client
    /// is still used without it for public repositories.
    pub fn new(
        settings: Settings,
        github: Arc<dyn GithubApi>,
        token: Option<String>,
        ci: CiContext,
    ) -> Self {
        let installer = AutorestInstaller::new(reqwest::Client::new(), settings.autorest.clone());
        Self {
            settings,
            github,
            token,
            ci,
            installer,
        }
    }

    #[instrument(skip(self, request), fields(sdk = %request.sdk_git_id))]
    pub async fn build_libraries(&self, request: &BuildRequest) -> Result<BuildOutcome, SdkError> {
        let github = self.github.as_ref();
        let sdk_git_id = get_full_sdk_id(github, &request.sdk_git_id).await?;
        let mut outcome = BuildOutcome {
            sdk_git_id: sdk_git_id.clone(),
            ..Default::default()
        };

        let workspace = RunWorkspace::new()?;
        let login = match &self.token {
            Some(_) => Some(github.current_user().await?.login),
            None => None,
        };
        let credentials = login.as_deref().zip(self.token.as_deref());
        let sdk_repo = workspace
            .clone_sdk(&self.settings.github.host, &sdk_git_id, credentials)
            .await?;

        let initial_pr = resolve_initial_pr(github, &self.ci).await?;

        if self.token.is_some() {
            let branch_name = compute_branch_name(
                request.branch.as_deref(),
                &self.ci,
                initial_pr.as_ref(),
                &self.settings.branches,
            );
            info!("Destination branch for generated code is {}", branch_name);
            configure_user(github, &sdk_repo, &self.settings.git).await?;

            info!("Try to checkout the destination branch if it already exists");
            if sdk_repo.checkout(&branch_name).await.is_err() {
                info!("Destination branch does not exists");
                sdk_repo.checkout(&request.base_branch).await?;
            }
            sync_fork(github, &self.settings.github.host, &sdk_git_id, &sdk_repo).await?;
            outcome.branch = Some(branch_name);
        } else {
            info!("No token provided, simply checkout base branch");
            sdk_repo.checkout(&request.base_branch).await?;
        }

        let config = SdkConfig::load(sdk_repo.workdir(), &request.config_path)?;
        let hexsha = swagger_hexsha(&request.restapi_git_folder).await;

        let pr_files = match &initial_pr {
            Some(pr) => {
                Some(swagger_project_files_in_pr(github, pr, &request.restapi_git_folder).await?)
            }
            None => None,
        };
        let filter = ProjectFilter::new(request.project_patterns.clone(), pr_files);

        let autorest_exe = self
            .installer
            .install(
                workspace.path(),
                config.autorest_version(),
                request.autorest_dir.as_deref(),
            )
            .await?;

        for (name, project) in &config.projects {
            match filter.select(name, project) {
                Selection::Selected => {}
                Selection::NotInPatterns => {
                    info!("Skip project {}", name);
                    outcome.skipped.push((name.clone(), Selection::NotInPatterns));
                    continue;
                }
                Selection::NotInPr => {
                    info!("Skip file not in PR {}", name);
                    outcome.skipped.push((name.clone(), Selection::NotInPr));
                    continue;
                }
            }

            self.generate_project(
                &config,
                project,
                &request.restapi_git_folder,
                sdk_repo.workdir(),
                workspace.path(),
                &autorest_exe,
            )
            .await?;
            outcome.generated.push(name.clone());
        }

        match &outcome.branch {
            Some(branch_name) => {
                let published = self
                    .publish(
                        &sdk_repo,
                        request,
                        &sdk_git_id,
                        branch_name,
                        &hexsha,
                        config.language(),
                        initial_pr.as_ref(),
                    )
                    .await?;
                if let Published::Pushed(pull) = published {
                    outcome.committed = true;
                    outcome.pull_request = pull;
                }
            }
            None => warn!("Skipping commit creation since no token is provided"),
        }

        drop(workspace);
        info!("Build SDK finished and cleaned");
        Ok(outcome)
    }

    /// Run AutoRest for one project and move the result into the SDK tree.
    async fn generate_project(
        &self,
        config: &SdkConfig,
        project: &ProjectConfig,
        restapi_git_folder: &Path,
        sdk_folder: &Path,
        temp_dir: &Path,
        autorest_exe: &Path,
    ) -> Result<(), SdkError> {
        info!("Working on {}", project.swagger);

        let swagger_file = restapi_git_folder.join(&project.swagger);
        if !swagger_file.is_file() {
            let err = SdkError::SwaggerNotFound {
                path: swagger_file.display().to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        let dest_folder = sdk_folder.join(&project.output_dir);
        if !dest_folder.is_dir() {
            let err = SdkError::DestinationNotFound {
                path: dest_folder.display().to_string(),
            };
            error!("{}", err);
            return Err(err);
        }

        let options = MergedOptions::merge(&config.meta.options, &project.options);
        let generated_path = temp_dir.join(swagger_file.file_name().unwrap_or_default());
        let command = AutorestCommand::new(
            autorest_exe,
            self.settings.autorest.use_mono,
            &swagger_file,
            &generated_path,
            options.autorest_arguments(config.language()),
        );
        generate_code(&command).await?;
        update(&generated_path, &dest_folder, &options)
    }

    /// Commit, push and open the PR.
    #[allow(clippy::too_many_arguments)]
    async fn publish(
        &self,
        sdk_repo: &GitRepo,
        request: &BuildRequest,
        sdk_git_id: &str,
        branch_name: &str,
        hexsha: &str,
        language: &str,
        initial_pr: Option<&InitialPr>,
    ) -> Result<Published, SdkError> {
        let github = self.github.as_ref();

        if !do_commit(sdk_repo, &request.message_template, branch_name, hexsha).await? {
            add_comment_to_initial_pr(github, initial_pr, &format!("No modification for {language}"))
                .await?;
            return Ok(Published::Unchanged);
        }

        sdk_repo.push("origin", branch_name, true).await?;
        let Some(pr_repo_id) = &request.pr_repo_id else {
            info!("Skipping the PR, no target repo id");
            return Ok(Published::Pushed(None));
        };
        let pull = do_pr(
            github,
            sdk_git_id,
            pr_repo_id,
            branch_name,
            &request.base_branch,
            initial_pr,
        )
        .await?;
        Ok(Published::Pushed(pull))
    }
}

/// Prefix a bare repository name with the token owner's login.
pub async fn get_full_sdk_id(github: &dyn GithubApi, sdk_git_id: &str) -> Result<String, SdkError> {
    if sdk_git_id.contains('/') {
        return Ok(sdk_git_id.to_string());
    }
    let login = github.current_user().await?.login;
    Ok(format!("{login}/{sdk_git_id}"))
}
