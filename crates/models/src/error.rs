use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Invalid image spec: {reason}")]
    InvalidImageSpec { reason: String },

    #[error("Provisioning step '{step}' failed: {reason}")]
    ProvisionFailed { step: String, reason: String },

    #[error("Unable to download Autorest for '{version}', please check this link and/or version tag: {link}")]
    AutorestDownload { version: String, link: String },

    #[error("{path} does not exists")]
    AutorestNotFound { path: String },

    #[error("Invalid Autorest package: {reason}")]
    InvalidPackage { reason: String },

    #[error("Autorest failed with status {status}: {output}")]
    AutorestFailed { status: i32, output: String },

    #[error("Swagger file does not exist or is not readable: {path}")]
    SwaggerNotFound { path: String },

    #[error("Dest folder does not exist or is not accessible: {path}")]
    DestinationNotFound { path: String },

    #[error("Git error ({command}): {message}")]
    GitError { command: String, message: String },

    #[error("GitHub error ({status}): {message}")]
    GithubError { status: u16, message: String },

    #[error("Docker error: {message}")]
    DockerError { message: String },

    #[error("Image does not match spec: {reason}")]
    ImageMismatch { reason: String },

    #[error("Internal error: {reason}")]
    InternalError { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SdkError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            SdkError::ConfigError { .. } => "ConfigurationError",
            SdkError::InvalidImageSpec { .. } => "ConfigurationError",
            SdkError::ProvisionFailed { .. } => "ProvisioningError",
            SdkError::AutorestDownload { .. } => "AutorestError",
            SdkError::AutorestNotFound { .. } => "AutorestError",
            SdkError::InvalidPackage { .. } => "AutorestError",
            SdkError::AutorestFailed { .. } => "AutorestError",
            SdkError::SwaggerNotFound { .. } => "ProjectError",
            SdkError::DestinationNotFound { .. } => "ProjectError",
            SdkError::GitError { .. } => "GitError",
            SdkError::GithubError { .. } => "GithubError",
            SdkError::DockerError { .. } => "DockerError",
            SdkError::ImageMismatch { .. } => "ProvisioningError",
            SdkError::InternalError { .. } => "InternalError",
            SdkError::Io(_) => "InternalError",
            SdkError::Json(_) => "ConfigurationError",
        }
    }

    /// Process exit code used by the command line tools.
    pub fn exit_code(&self) -> i32 {
        match self {
            SdkError::ConfigError { .. } => 2,
            SdkError::InvalidImageSpec { .. } => 2,
            SdkError::Json(_) => 2,
            SdkError::ProvisionFailed { .. } => 3,
            SdkError::ImageMismatch { .. } => 3,
            SdkError::AutorestDownload { .. } => 4,
            SdkError::AutorestNotFound { .. } => 4,
            SdkError::InvalidPackage { .. } => 4,
            SdkError::AutorestFailed { .. } => 4,
            SdkError::SwaggerNotFound { .. } => 5,
            SdkError::DestinationNotFound { .. } => 5,
            SdkError::GitError { .. } => 6,
            SdkError::GithubError { .. } => 7,
            SdkError::DockerError { .. } => 125,
            SdkError::InternalError { .. } => 1,
            SdkError::Io(_) => 1,
        }
    }
}
