use crate::config::ConfigError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Failures surfaced by the client orchestration layer.
///
/// Validation failures are raised before any request leaves the process.
/// Everything else originates from the remote collaborator or local storage.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("remote request failed{}: {}", status_suffix(.status), .detail.as_deref().unwrap_or("no detail"))]
    Remote {
        status: Option<u16>,
        detail: Option<String>,
    },
    #[error("backend unreachable: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn remote(status: Option<u16>, detail: Option<String>) -> Self {
        Self::Remote { status, detail }
    }

    /// Text shown to the user: the server supplied detail when there is one,
    /// otherwise `fallback`. Validation messages are shown as-is.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Remote {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({code})")).unwrap_or_default()
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::remote(err.status().map(|s| s.as_u16()), None)
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
