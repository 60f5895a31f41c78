//! Session bridge for the hours portal
//!
//! Exchanges credentials with the backend, keeps the resulting sessions on
//! the server and hands the browser a signed cookie referencing them.

pub mod bridge;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod rate_limiter;
pub mod routes;
pub mod session;
pub mod validation;

use axum_extra::extract::cookie::{Cookie, SameSite};
use common::{BackendClient, BackendResult, Settings};

pub use error::AuthError;
pub use middleware::{CurrentSession, RequireAdmin, session_gate};
pub use models::Session;
pub use session::SessionManager;

use crate::jwt::SessionTokenService;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};

pub const SESSION_COOKIE: &str = "session-token";
pub const SECURE_SESSION_COOKIE: &str = "__Secure-session-token";
pub const LOGIN_ROUTE: &str = "/auth/login";

/// State shared by the session bridge handlers and extractors
#[derive(Clone)]
pub struct AuthState {
    /// Client for the login endpoint, bound to `BACKEND_URL`
    pub backend: BackendClient,
    pub sessions: SessionManager,
    pub rate_limiter: RateLimiter,
    pub secure_cookies: bool,
}

impl AuthState {
    pub fn new(backend: BackendClient, sessions: SessionManager, secure_cookies: bool) -> Self {
        AuthState {
            backend,
            sessions,
            rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
            secure_cookies,
        }
    }

    pub fn from_settings(settings: &Settings) -> BackendResult<Self> {
        let backend = BackendClient::new(settings.backend_url.clone(), settings.backend_timeout)?;
        let tokens = SessionTokenService::new(&settings.auth_secret, settings.session_ttl);
        Ok(Self::new(
            backend,
            SessionManager::new(tokens),
            settings.secure_cookies,
        ))
    }

    pub fn cookie_name(&self) -> &'static str {
        if self.secure_cookies {
            SECURE_SESSION_COOKIE
        } else {
            SESSION_COOKIE
        }
    }

    /// Session cookie carrying a signed token
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }
}
