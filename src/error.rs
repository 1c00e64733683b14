//! Application error types.
//!
//! Every stage of the assignment pipeline returns these errors unchanged up to
//! the top-level runner, which is the single place failures are reported.
//! They serialize to a structured JSON object for `--format json` output.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// The reviewer configuration document could not be retrieved.
    #[error("Config fetch error: {message}")]
    ConfigFetch {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        document_id: Option<String>,
    },

    /// The reviewer configuration document is malformed.
    #[error("Config parse error: {message}")]
    ConfigParse {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// A review-load search query failed.
    #[error("Load query error: {message}")]
    LoadQuery {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        query: Option<String>,
    },

    /// Requesting reviewers on the pull request failed.
    #[error("Submission error: {message}")]
    Submission {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// An outbound call did not finish within its deadline.
    #[error("Timed out: {operation}")]
    Timeout {
        operation: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },

    /// GitHub API request failed.
    #[error("GitHub API error: {message}")]
    GitHubApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Authentication failed or credentials invalid.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a config fetch error for a specific document.
    pub fn config_fetch_for(message: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::ConfigFetch {
            message: message.into(),
            document_id: Some(document_id.into()),
        }
    }

    /// Create a config parse error.
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config parse error naming the offending field.
    pub fn config_parse_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a load query error carrying the filter expression.
    pub fn load_query(message: impl Into<String>, query: impl Into<String>) -> Self {
        Self::LoadQuery {
            message: message.into(),
            query: Some(query.into()),
        }
    }

    /// Create a submission error.
    pub fn submission(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Submission {
            message: message.into(),
            status_code,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_secs: Some(timeout_secs),
        }
    }

    /// Create a GitHub API error.
    pub fn github_api(message: impl Into<String>) -> Self {
        Self::GitHubApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a GitHub API error with status code and endpoint.
    pub fn github_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::GitHubApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code attached to this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::GitHubApi { status_code, .. } | Self::Submission { status_code, .. } => {
                *status_code
            }
            _ => None,
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Network failures, timeouts, throttling (429 and GitHub's secondary
    /// rate limit 403) and server-side 5xx responses are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::GitHubApi {
                status_code: Some(code),
                message,
                ..
            } => match *code {
                429 => true,
                403 => message.to_lowercase().contains("rate limit"),
                500..=599 => true,
                _ => false,
            },
            _ => false,
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: err
                    .url()
                    .map(|u| u.path().to_string())
                    .unwrap_or_else(|| "request".to_string()),
                timeout_secs: None,
            }
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_status() {
            Self::github_api(format!("HTTP error: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_parse(err.to_string())
    }
}
