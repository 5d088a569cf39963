use crate::models::*;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use sdk_models::{GithubSettings, SdkError};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

const PER_PAGE: usize = 100;

#[async_trait]
pub trait GithubApi: Send + Sync + 'static {
    /// The user owning the token.
    async fn current_user(&self) -> Result<User, SdkError>;
    async fn repository(&self, repo_id: &str) -> Result<Repository, SdkError>;
    async fn pull_request(&self, repo_id: &str, number: u64) -> Result<PullRequest, SdkError>;
    async fn pull_request_files(
        &self,
        repo_id: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, SdkError>;
    async fn commit_message(&self, repo_id: &str, sha: &str) -> Result<String, SdkError>;
    /// `Ok(None)` when a pull request already exists for this head.
    async fn create_pull_request(
        &self,
        repo_id: &str,
        request: &NewPullRequest,
    ) -> Result<Option<PullRequest>, SdkError>;
    async fn create_issue_comment(
        &self,
        repo_id: &str,
        number: u64,
        body: &str,
    ) -> Result<(), SdkError>;
}

pub struct GithubClient {
    client: Client,
    api_url: String,
    user_agent: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(client: Client, settings: &GithubSettings, token: Option<String>) -> Self {
        Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            user_agent: settings.user_agent.clone(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.api_url, path))
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/vnd.github.v3+json");
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("token {token}")),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, SdkError> {
        builder.send().await.map_err(|e| SdkError::GithubError {
            status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        debug!("GET {}", path);
        let response = self.send(self.request(Method::GET, path)).await?;
        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, SdkError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| SdkError::GithubError {
        status: status.as_u16(),
        message: e.to_string(),
    })?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| SdkError::GithubError {
        status: status.as_u16(),
        message: format!("unexpected response: {e}"),
    })
}

pub fn api_error(status: StatusCode, body: &str) -> SdkError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = match (parsed.message.is_empty(), parsed.first_error_message()) {
        (false, Some(detail)) => format!("{}: {}", parsed.message, detail),
        (false, None) => parsed.message.clone(),
        (true, _) => body.to_string(),
    };
    SdkError::GithubError {
        status: status.as_u16(),
        message,
    }
}

/// GitHub answers 422 with this message when the head already has an open PR.
pub fn is_existing_pull_request(status: StatusCode, body: &str) -> bool {
    if status != StatusCode::UNPROCESSABLE_ENTITY {
        return false;
    }
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.first_error_message().map(|m| m.starts_with("A pull request already exists")))
        .unwrap_or(false)
}

#[async_trait]
impl GithubApi for GithubClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<User, SdkError> {
        self.get_json("/user").await
    }

    #[instrument(skip(self))]
    async fn repository(&self, repo_id: &str) -> Result<Repository, SdkError> {
        self.get_json(&format!("/repos/{repo_id}")).await
    }

    #[instrument(skip(self))]
    async fn pull_request(&self, repo_id: &str, number: u64) -> Result<PullRequest, SdkError> {
        self.get_json(&format!("/repos/{repo_id}/pulls/{number}"))
            .await
    }

    #[instrument(skip(self))]
    async fn pull_request_files(
        &self,
        repo_id: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, SdkError> {
        let mut files = Vec::new();
        let mut page = 1;
        loop {
            let batch: Vec<PullRequestFile> = self
                .get_json(&format!(
                    "/repos/{repo_id}/pulls/{number}/files?per_page={PER_PAGE}&page={page}"
                ))
                .await?;
            let last = batch.len() < PER_PAGE;
            files.extend(batch);
            if last {
                break;
            }
            page += 1;
        }
        Ok(files)
    }

    #[instrument(skip(self))]
    async fn commit_message(&self, repo_id: &str, sha: &str) -> Result<String, SdkError> {
        let commit: Commit = self
            .get_json(&format!("/repos/{repo_id}/commits/{sha}"))
            .await?;
        Ok(commit.commit.message)
    }

    #[instrument(skip(self, request))]
    async fn create_pull_request(
        &self,
        repo_id: &str,
        request: &NewPullRequest,
    ) -> Result<Option<PullRequest>, SdkError> {
        let response = self
            .send(
                self.request(Method::POST, &format!("/repos/{repo_id}/pulls"))
                    .json(request),
            )
            .await?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            if is_existing_pull_request(status, &body) {
                info!("PR already exists, it was a commit on an open PR");
                return Ok(None);
            }
            return Err(api_error(status, &body));
        }

        parse_response(response).await.map(Some)
    }

    #[instrument(skip(self, body))]
    async fn create_issue_comment(
        &self,
        repo_id: &str,
        number: u64,
        body: &str,
    ) -> Result<(), SdkError> {
        let response = self
            .send(
                self.request(
                    Method::POST,
                    &format!("/repos/{repo_id}/issues/{number}/comments"),
                )
                .json(&NewComment {
                    body: body.to_string(),
                }),
            )
            .await?;
        let _: serde_json::Value = parse_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_pull_request_detection() {
        let body = r#"{"message":"Validation Failed","errors":[{"resource":"PullRequest","code":"custom","message":"A pull request already exists for lmazuel:autorest."}]}"#;
        assert!(is_existing_pull_request(StatusCode::UNPROCESSABLE_ENTITY, body));
        assert!(!is_existing_pull_request(StatusCode::BAD_REQUEST, body));

        let other = r#"{"message":"Validation Failed","errors":[{"message":"No commits between master and autorest"}]}"#;
        assert!(!is_existing_pull_request(StatusCode::UNPROCESSABLE_ENTITY, other));
        assert!(!is_existing_pull_request(StatusCode::UNPROCESSABLE_ENTITY, "not json"));
    }

    #[test]
    fn test_api_error_message() {
        let err = api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Validation Failed","errors":[{"message":"No commits between master and autorest"}]}"#,
        );
        match err {
            SdkError::GithubError { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation Failed: No commits between master and autorest");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "GitHub error (502): upstream down");
    }

    #[test]
    fn test_models_deserialize() {
        let repo: Repository = serde_json::from_str(
            r#"{"full_name":"lmazuel/azure-sdk-for-python","parent":{"full_name":"Azure/azure-sdk-for-python"},"fork":true}"#,
        )
        .unwrap();
        assert_eq!(repo.parent.unwrap().full_name, "Azure/azure-sdk-for-python");

        let user: User = serde_json::from_str(r#"{"login":"lmazuel","name":null}"#).unwrap();
        assert_eq!(user.login, "lmazuel");
        assert_eq!(user.email, None);
    }
}
