//! Custom error types for the portal service
//!
//! Domain actions return [`ActionError`]; handlers wrap it into
//! [`PortalError`], which decides how the failure reaches the browser.

use auth::{AuthError, validation::FieldErrors};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{BackendError, models::TransitionError};
use export::ExportError;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

/// Keys of a DRF error body that are not form fields
const NON_FIELD_KEYS: [&str; 4] = ["message", "detail", "error", "non_field_errors"];

/// Failure of a domain action
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The hour record is no longer pending
    #[error("Este registro ya fue procesado")]
    AlreadyDecided(#[from] TransitionError),

    /// The submitted form did not validate
    #[error("Por favor corrige los errores en el formulario")]
    Validation(FieldErrors),
}

impl ActionError {
    pub fn status(&self) -> u16 {
        match self {
            ActionError::Backend(e) => e.status(),
            ActionError::AlreadyDecided(_) => 409,
            ActionError::Validation(_) => 422,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ActionError::Backend(e) if e.is_unauthorized())
    }

    /// Message shown on a page that failed to load
    pub fn message(&self) -> String {
        match self {
            ActionError::Backend(e) => e.message(),
            other => other.to_string(),
        }
    }

    /// Per-field errors, from local validation or a backend 400 body
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            ActionError::Validation(errors) => Some(errors.clone()),
            ActionError::Backend(BackendError::Status { status: 400, data, .. }) => {
                field_errors_from_backend(data)
            }
            _ => None,
        }
    }
}

/// Map a `{field: [msg, ...]}` body onto form fields, messages joined by a space
pub fn field_errors_from_backend(data: &Value) -> Option<FieldErrors> {
    let object = data.as_object()?;
    let mut errors = FieldErrors::default();

    for (field, value) in object {
        if NON_FIELD_KEYS.contains(&field.as_str()) {
            continue;
        }
        let message = match value {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            Value::String(text) => text.clone(),
            _ => continue,
        };
        if !message.is_empty() {
            errors.add(field, message);
        }
    }

    (!errors.is_empty()).then_some(errors)
}

/// Uniform result envelope of every domain action
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub status: u16,
    pub data: Option<T>,
    pub error: bool,
    #[serde(rename = "originalError")]
    pub original_error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(message: impl Into<String>, status: u16, data: T) -> Self {
        Envelope {
            message: message.into(),
            status,
            data: Some(data),
            error: false,
            original_error: None,
        }
    }
}

impl Envelope<Value> {
    /// Failed action; `fallback` is used when the backend gave no message
    pub fn failure(fallback: &str, err: &ActionError) -> Self {
        let (message, original_error) = match err {
            ActionError::Backend(e @ BackendError::Status { .. }) => (e.message(), Some(e.to_string())),
            ActionError::Backend(BackendError::Transport(_) | BackendError::Decode(_)) => {
                (fallback.to_string(), None)
            }
            other => (other.to_string(), Some(other.to_string())),
        };

        Envelope {
            message,
            status: err.status(),
            data: None,
            error: true,
            original_error,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Custom error type for the portal service
#[derive(Error, Debug)]
pub enum PortalError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A form submission or mutation failed
    #[error("{fallback}: {source}")]
    Action {
        fallback: &'static str,
        #[source]
        source: ActionError,
    },

    /// Data needed to build a page could not be fetched
    #[error("Error loading data: {}", .0.message())]
    LoadData(ActionError),

    /// API route called without a session
    #[error("No autorizado")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Error generating export: {0}")]
    Export(#[from] ExportError),

    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PortalError {
    /// Wrap an action failure with the message shown when the backend gives none
    pub fn action(fallback: &'static str) -> impl FnOnce(ActionError) -> PortalError {
        move |source| PortalError::Action { fallback, source }
    }
}

/// 422 body shared by local and backend validation failures
fn validation_response(message: String, errors: FieldErrors) -> Response {
    let body = Json(json!({
        "error": true,
        "message": message,
        "fieldErrors": errors.into_map(),
    }));
    (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            PortalError::Auth(e) => return e.into_response(),
            PortalError::Action { source, .. } | PortalError::LoadData(source)
                if source.is_unauthorized() =>
            {
                return AuthError::SessionExpired.into_response();
            }
            PortalError::Action { fallback, source } => {
                if let Some(errors) = source.field_errors() {
                    return validation_response(
                        ActionError::Validation(FieldErrors::default()).to_string(),
                        errors,
                    );
                }
                return Envelope::failure(fallback, &source).into_response();
            }
            PortalError::LoadData(ref source) => {
                let status = if source.status() == 404 {
                    StatusCode::NOT_FOUND
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (status, self.to_string())
            }
            PortalError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            PortalError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            PortalError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            PortalError::Export(_) | PortalError::Task(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error generating export".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for portal handler results
pub type PortalResult<T> = Result<T, PortalError>;
