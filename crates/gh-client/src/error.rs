//! Error taxonomy for upstream API calls
//!
//! Every failure surfaced by the client maps onto one of a small set of
//! variants so callers can react without inspecting HTTP details:
//! re-authenticate on [`ClientError::AuthRequired`], back off on
//! [`ClientError::RateLimited`], report anything else.

use thiserror::Error;

/// Errors returned by GitHub client operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The bearer token is invalid or expired (HTTP 401)
    ///
    /// The session's client has been evicted; the caller must sign in again.
    #[error("authentication required")]
    AuthRequired,

    /// The upstream quota is exhausted
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other upstream failure, carrying the underlying message
    #[error("upstream error: {0}")]
    Upstream(String),

    /// No client is registered for the session
    #[error("no client initialized for session '{0}'")]
    Uninitialized(String),

    /// A repository name that is not in `owner/name` form
    #[error("invalid repository name '{0}', expected owner/name")]
    InvalidRepository(String),
}

impl ClientError {
    /// Classify an HTTP error status and message
    ///
    /// 401 always means the token is unusable. GitHub reports quota exhaustion
    /// as 403 (primary limit) or 429 (secondary limit) with a message that
    /// mentions the rate limit; a 403 without that message is a plain
    /// permission failure.
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            401 => ClientError::AuthRequired,
            403 | 429 if is_rate_limit_message(message) => {
                ClientError::RateLimited(message.to_string())
            }
            _ => ClientError::Upstream(format!("HTTP {}: {}", status, message)),
        }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, ClientError::AuthRequired)
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    message.to_lowercase().contains("rate limit")
}

impl From<octocrab::Error> for ClientError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                ClientError::from_status(source.status_code.as_u16(), &source.message)
            }
            _ => ClientError::Upstream(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
