//! Route gate and session extractors
//!
//! The gate only checks that a session cookie is present. Whether the
//! session is valid, and whether its role may see a page, is decided by the
//! [`CurrentSession`] and [`RequireAdmin`] extractors on each route.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use reqwest::Url;
use tracing::debug;

use crate::{AuthState, LOGIN_ROUTE, SECURE_SESSION_COOKIE, SESSION_COOKIE, error::AuthError, models::Session};

/// Path prefixes reachable without a session cookie
pub const PUBLIC_PREFIXES: [&str; 7] = [
    "/auth",
    "/api/auth",
    "/api",
    "/_next",
    "/static",
    "/health",
    "/favicon.ico",
];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Session cookie value, under either cookie name
pub fn session_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .or_else(|| jar.get(SECURE_SESSION_COOKIE))
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// `/auth/login?callbackUrl=<path>` with the path form-encoded
pub fn login_redirect_target(path: &str) -> String {
    match Url::parse("http://portal.local/auth/login") {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("callbackUrl", path);
            format!("{}?{}", LOGIN_ROUTE, url.query().unwrap_or_default())
        }
        Err(_) => LOGIN_ROUTE.to_string(),
    }
}

/// Redirect requests without a session cookie to the login page
pub async fn session_gate(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path();
    if is_public(path) {
        return next.run(req).await;
    }

    let jar = CookieJar::from_headers(req.headers());
    if session_cookie_value(&jar).is_none() {
        debug!("No session cookie for {}, redirecting to login", path);
        return Redirect::temporary(&login_redirect_target(path)).into_response();
    }

    next.run(req).await
}

/// The resolved session of the caller
///
/// Rejects with [`AuthError::SessionExpired`]; API routes that must answer
/// 401 instead take `Option<CurrentSession>`.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let value = session_cookie_value(&jar).ok_or(AuthError::SessionExpired)?;

        auth.sessions
            .resolve(&value)
            .await
            .map(CurrentSession)
            .ok_or(AuthError::SessionExpired)
    }
}

/// A session whose user is an administrator
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        if !session.role().is_admin() {
            debug!("User {} is not an administrator", session.user_id());
            return Err(AuthError::Forbidden);
        }
        Ok(RequireAdmin(session))
    }
}
