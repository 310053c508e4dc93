//! Mapping of backend HTTP failures onto lexlib errors.

use lexlib_core::Error;
use serde::Deserialize;

/// Backend failure classes, by HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaasErrorCode {
    /// 401 / 403: missing, invalid or under-privileged credentials.
    Unauthorized,
    /// 404
    NotFound,
    /// 400 / 409 / 422: the request was rejected as invalid.
    Rejected,
    /// 429
    RateLimited,
    /// 5xx
    ServerError,
    Unknown,
}

impl BaasErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Rejected,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerError)
    }
}

/// Error bodies differ between the row API, storage and auth; read
/// whichever message field is present.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    details: Option<String>,
}

/// Extract a human-readable message from an error response body.
pub fn error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error_description)
        .or(parsed.msg)
        .or(parsed.error);
    match (message, parsed.details) {
        (Some(m), Some(d)) if !d.is_empty() => format!("{} ({})", m, d),
        (Some(m), _) => m,
        (None, _) if !body.trim().is_empty() => body.trim().chars().take(200).collect(),
        (None, _) => "no error details".to_string(),
    }
}

/// Convert a failed backend response into a lexlib error.
pub fn to_lexlib_error(status: u16, message: &str) -> Error {
    match BaasErrorCode::from_status(status) {
        BaasErrorCode::Unauthorized => Error::Unauthorized(message.to_string()),
        BaasErrorCode::NotFound => Error::NotFound(message.to_string()),
        BaasErrorCode::Rejected => Error::InvalidInput(message.to_string()),
        BaasErrorCode::RateLimited | BaasErrorCode::ServerError | BaasErrorCode::Unknown => {
            Error::Remote {
                status,
                message: message.to_string(),
            }
        }
    }
}
