//! Custom error types for the common library
//!
//! This module defines the error returned by every call made through the
//! backend request client, plus the configuration error raised at startup.

use serde_json::Value;
use thiserror::Error;

/// Default message used when the backend gives nothing better
const DEFAULT_MESSAGE: &str = "An error occurred while contacting the backend";

/// Custom error type for backend API calls
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend answered 401; the session token is no longer accepted
    #[error("Backend rejected the session token")]
    Unauthorized { data: Value },

    /// The backend answered with a non-success status
    #[error("Backend returned {status}: {message}")]
    Status {
        status: u16,
        data: Value,
        message: String,
    },

    /// The request never produced a response (connection refused, timeout...)
    #[error("Backend transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be decoded into the expected shape
    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    /// Build the error for a non-success response, normalizing the message
    pub fn from_status(status: u16, data: Value) -> Self {
        if status == 401 {
            return BackendError::Unauthorized { data };
        }

        let message = extract_message(&data).unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
        BackendError::Status {
            status,
            data,
            message,
        }
    }

    /// HTTP status of the normalized `{status, data, message}` view
    pub fn status(&self) -> u16 {
        match self {
            BackendError::Unauthorized { .. } => 401,
            BackendError::Status { status, .. } => *status,
            BackendError::Transport(_) | BackendError::Decode(_) => 500,
        }
    }

    /// Raw payload returned by the backend, `Null` when there was none
    pub fn data(&self) -> Value {
        match self {
            BackendError::Unauthorized { data } | BackendError::Status { data, .. } => data.clone(),
            BackendError::Transport(_) | BackendError::Decode(_) => Value::Null,
        }
    }

    /// Message safe to show to an end user
    pub fn message(&self) -> String {
        match self {
            BackendError::Unauthorized { .. } => "Session expired".to_string(),
            BackendError::Status { message, .. } => message.clone(),
            BackendError::Transport(_) => "Backend unavailable".to_string(),
            BackendError::Decode(_) => "Unexpected response from backend".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::Unauthorized { .. })
    }
}

/// Pick a human readable message out of a DRF-style error body
fn extract_message(data: &Value) -> Option<String> {
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Type alias for Result with BackendError
pub type BackendResult<T> = Result<T, BackendError>;

/// Error raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// A setting is present but unusable
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// The config source itself failed
    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),
}
