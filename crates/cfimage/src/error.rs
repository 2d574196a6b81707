//! Error types for the Cloudflare Images client

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single image API operation.
///
/// Each variant maps onto one [`ErrorKind`]. The display string is the
/// human-readable message that ends up in the `error` field of an
/// [`OperationResult`](crate::OperationResult).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageApiError {
    #[error("{0}")]
    Configuration(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Remote(String),
}

impl ImageApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageApiError::Configuration(_) => ErrorKind::Configuration,
            ImageApiError::Authentication(_) => ErrorKind::Authentication,
            ImageApiError::Transport(_) => ErrorKind::Transport,
            ImageApiError::Validation(_) => ErrorKind::Validation,
            ImageApiError::Remote(_) => ErrorKind::Remote,
        }
    }

    /// Prefix the message with `context`, keeping the kind of the root cause.
    pub fn context(self, context: &str) -> Self {
        let kind = self.kind();
        kind.error(format!("{}{}", context, self))
    }
}

impl From<reqwest::Error> for ImageApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ImageApiError::Transport(format!("request timed out: {}", err))
        } else {
            ImageApiError::Transport(err.to_string())
        }
    }
}

/// Classification of an operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credential missing or empty before a call that needs it
    Configuration,
    /// Remote rejected the credential
    Authentication,
    /// Network failure reaching the remote service; the caller may retry
    Transport,
    /// Local input could not be resolved
    Validation,
    /// Remote answered with a non-success status or an unexpected body
    Remote,
}

impl ErrorKind {
    /// HTTP-like status code reported for this kind of failure
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Configuration => 500,
            ErrorKind::Authentication => 401,
            ErrorKind::Transport => 502,
            ErrorKind::Validation => 422,
            ErrorKind::Remote => 502,
        }
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport)
    }

    pub(crate) fn error(self, message: String) -> ImageApiError {
        match self {
            ErrorKind::Configuration => ImageApiError::Configuration(message),
            ErrorKind::Authentication => ImageApiError::Authentication(message),
            ErrorKind::Transport => ImageApiError::Transport(message),
            ErrorKind::Validation => ImageApiError::Validation(message),
            ErrorKind::Remote => ImageApiError::Remote(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImageApiError>;

/// Errors raised while loading the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {}", .0.display())]
    SettingsNotFound(PathBuf),

    #[error("Invalid settings file {}: {source}", .path.display())]
    InvalidSettings {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client could not be built: {0}")]
    HttpClient(#[from] reqwest::Error),
}
