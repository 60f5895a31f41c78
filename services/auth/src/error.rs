//! Custom error types for the session bridge

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::{LOGIN_ROUTE, SECURE_SESSION_COOKIE, SESSION_COOKIE};

/// Error raised by the session bridge and its extractors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend refused the credentials, or could not be reached
    #[error("Credenciales inválidas")]
    InvalidCredentials,

    /// Too many login attempts for this email
    #[error("Demasiados intentos, inténtalo más tarde")]
    TooManyAttempts,

    /// Login form failed validation
    #[error("Datos de acceso inválidos")]
    Validation(BTreeMap<String, String>),

    /// No usable session on an API route
    #[error("Unauthorized")]
    Unauthorized,

    /// Session cookie missing, tampered with or expired on a page route
    #[error("Session expired")]
    SessionExpired,

    /// Logged in, but the page needs another role
    #[error("Forbidden")]
    Forbidden,

    /// Session token could not be signed or verified
    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Cookie jar removing the session cookie under both of its names
pub fn clear_session_cookies() -> CookieJar {
    [SESSION_COOKIE, SECURE_SESSION_COOKIE]
        .into_iter()
        .fold(CookieJar::new(), |jar, name| {
            let mut cookie = Cookie::build((name, ""))
                .path("/")
                .http_only(true)
                .secure(name == SECURE_SESSION_COOKIE)
                .build();
            cookie.make_removal();
            jar.add(cookie)
        })
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::SessionExpired => {
                return (clear_session_cookies(), Redirect::to(LOGIN_ROUTE)).into_response();
            }
            AuthError::Forbidden => {
                return Redirect::to(common::models::Role::Becario.landing_route()).into_response();
            }
            AuthError::Validation(field_errors) => {
                let body = Json(json!({
                    "error": true,
                    "message": AuthError::Validation(BTreeMap::new()).to_string(),
                    "fieldErrors": field_errors,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::TooManyAttempts => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AuthError::Token(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_invalid_credentials_is_401() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_session_expired_clears_cookie_and_redirects() {
        let response = AuthError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], LOGIN_ROUTE);

        let cookies: Vec<&str> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        assert!(cookies.iter().any(|c| c.starts_with("session-token=")));
        assert!(cookies.iter().any(|c| c.starts_with("__Secure-session-token=")));
    }

    #[test]
    fn test_forbidden_sends_interns_home() {
        let response = AuthError::Forbidden.into_response();
        assert_eq!(response.headers()[header::LOCATION], "/dashboard/interns/overview");
    }
}
