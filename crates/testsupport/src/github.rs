use async_trait::async_trait;
use sdk_github::*;
use sdk_models::SdkError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedComment {
    pub repo_id: String,
    pub number: u64,
    pub body: String,
}

/// In-memory GitHub. Unknown repositories, PRs and commits answer 404.
#[derive(Clone)]
pub struct FakeGithub {
    pub user: User,
    pub repositories: HashMap<String, Repository>,
    pub pulls: HashMap<(String, u64), (PullRequest, Vec<String>)>,
    pub commits: HashMap<(String, String), String>,
    /// Heads that already have an open PR.
    pub existing_heads: Vec<String>,
    pub created_pulls: Arc<Mutex<Vec<(String, NewPullRequest)>>>,
    pub comments: Arc<Mutex<Vec<RecordedComment>>>,
}

impl FakeGithub {
    pub fn new(login: &str) -> Self {
        Self {
            user: User {
                login: login.to_string(),
                name: None,
                email: None,
            },
            repositories: HashMap::new(),
            pulls: HashMap::new(),
            commits: HashMap::new(),
            existing_heads: Vec::new(),
            created_pulls: Arc::new(Mutex::new(Vec::new())),
            comments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_repository(mut self, full_name: &str, parent: Option<&str>) -> Self {
        self.repositories.insert(
            full_name.to_string(),
            Repository {
                full_name: full_name.to_string(),
                parent: parent.map(|p| RepositoryRef {
                    full_name: p.to_string(),
                }),
            },
        );
        self
    }

    pub fn with_pull(mut self, repo_id: &str, number: u64, merged: bool, files: &[&str]) -> Self {
        let pull = PullRequest {
            number,
            html_url: format!("https://github.com/{repo_id}/pull/{number}"),
            merged,
        };
        self.pulls.insert(
            (repo_id.to_string(), number),
            (pull, files.iter().map(|f| f.to_string()).collect()),
        );
        self
    }

    pub fn with_commit(mut self, repo_id: &str, sha: &str, message: &str) -> Self {
        self.commits
            .insert((repo_id.to_string(), sha.to_string()), message.to_string());
        self
    }

    pub async fn recorded_comments(&self) -> Vec<RecordedComment> {
        self.comments.lock().await.clone()
    }

    pub async fn recorded_pulls(&self) -> Vec<(String, NewPullRequest)> {
        self.created_pulls.lock().await.clone()
    }
}

fn not_found(what: String) -> SdkError {
    SdkError::GithubError {
        status: 404,
        message: format!("Not Found: {what}"),
    }
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn current_user(&self) -> Result<User, SdkError> {
        Ok(self.user.clone())
    }

    async fn repository(&self, repo_id: &str) -> Result<Repository, SdkError> {
        self.repositories
            .get(repo_id)
            .cloned()
            .ok_or_else(|| not_found(repo_id.to_string()))
    }

    async fn pull_request(&self, repo_id: &str, number: u64) -> Result<PullRequest, SdkError> {
        self.pulls
            .get(&(repo_id.to_string(), number))
            .map(|(pull, _)| pull.clone())
            .ok_or_else(|| not_found(format!("{repo_id}#{number}")))
    }

    async fn pull_request_files(
        &self,
        repo_id: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, SdkError> {
        self.pulls
            .get(&(repo_id.to_string(), number))
            .map(|(_, files)| {
                files
                    .iter()
                    .map(|f| PullRequestFile {
                        filename: f.clone(),
                    })
                    .collect()
            })
            .ok_or_else(|| not_found(format!("{repo_id}#{number}")))
    }

    async fn commit_message(&self, repo_id: &str, sha: &str) -> Result<String, SdkError> {
        self.commits
            .get(&(repo_id.to_string(), sha.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("{repo_id}@{sha}")))
    }

    async fn create_pull_request(
        &self,
        repo_id: &str,
        request: &NewPullRequest,
    ) -> Result<Option<PullRequest>, SdkError> {
        if self.existing_heads.contains(&request.head) {
            return Ok(None);
        }
        let mut created = self.created_pulls.lock().await;
        created.push((repo_id.to_string(), request.clone()));
        Ok(Some(PullRequest {
            number: 1000 + created.len() as u64,
            html_url: format!("https://github.com/{repo_id}/pull/{}", 1000 + created.len()),
            merged: false,
        }))
    }

    async fn create_issue_comment(
        &self,
        repo_id: &str,
        number: u64,
        body: &str,
    ) -> Result<(), SdkError> {
        self.comments.lock().await.push(RecordedComment {
            repo_id: repo_id.to_string(),
            number,
            body: body.to_string(),
        });
        Ok(())
    }
}
