//! Session bridge routes

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use common::models::{Role, User};
use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    AuthState, bridge,
    error::{AuthError, clear_session_cookies},
    middleware::{CurrentSession, session_cookie_value},
    models::{LoginRequest, SessionView},
    validation::validate_login,
};

/// Response for user login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub redirect: String,
    pub user: User,
}

/// Create the router for the session bridge
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(current_session))
        .route("/dashboard", get(dashboard_home))
        .with_state(state)
}

/// Where to go after login: a local callback path, else the role landing page
pub fn post_login_redirect(callback_url: Option<&str>, role: Role) -> String {
    match callback_url {
        Some(url) if is_local_path(url) => url.to_string(),
        _ => role.landing_route().to_string(),
    }
}

/// A path on this origin, without backslashes or control characters
fn is_local_path(url: &str) -> bool {
    if !url.starts_with('/') || url.starts_with("//") {
        return false;
    }
    if url.chars().any(|c| c == '\\' || c.is_control()) {
        return false;
    }

    let Ok(base) = Url::parse("http://portal.local/") else {
        return false;
    };
    base.join(url)
        .is_ok_and(|joined| joined.origin() == base.origin())
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let credentials = &payload.credentials;
    validate_login(credentials).map_err(|errors| AuthError::Validation(errors.into_map()))?;

    if !state.rate_limiter.is_allowed(&credentials.email).await {
        info!("Login throttled for: {}", credentials.email);
        return Err(AuthError::TooManyAttempts);
    }

    let login = bridge::authorize(&state.backend, credentials)
        .await
        .ok_or(AuthError::InvalidCredentials)?;
    state.rate_limiter.reset(&credentials.email).await;

    let (session, token) = state.sessions.create_session(login.user, login.token).await?;
    let redirect = post_login_redirect(payload.callback_url.as_deref(), session.role());
    info!("User {} logged in, redirecting to {}", session.user_id(), redirect);

    let response = LoginResponse {
        redirect,
        user: session.user,
    };
    Ok((jar.add(state.session_cookie(token)), Json(response)))
}

/// Logout endpoint
pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(value) = session_cookie_value(&jar) {
        if let Some(session) = state.sessions.resolve(&value).await {
            state.sessions.delete_session(session.id).await;
        }
    }

    (
        clear_session_cookies(),
        Json(json!({"message": "Logged out successfully"})),
    )
}

/// Current user and role, without the backend token
pub async fn current_session(
    session: Option<CurrentSession>,
) -> Result<Json<SessionView>, AuthError> {
    let CurrentSession(session) = session.ok_or(AuthError::Unauthorized)?;
    Ok(Json(session.view()))
}

/// Role based landing redirect
pub async fn dashboard_home(CurrentSession(session): CurrentSession) -> Redirect {
    Redirect::to(session.role().landing_route())
}
