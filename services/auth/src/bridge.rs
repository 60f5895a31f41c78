//! Credentials exchange with the backend
//!
//! The bridge never fails loudly: a rejected login, a malformed answer and
//! an unreachable backend all come back as `None`, so no session is issued.

use common::BackendClient;
use tracing::{error, info, warn};

use crate::models::{BackendLogin, LoginCredentials};

pub const LOGIN_PATH: &str = "/api/users/auth/login/";

/// Exchange credentials for a backend token and user profile
pub async fn authorize(backend: &BackendClient, credentials: &LoginCredentials) -> Option<BackendLogin> {
    info!("Login attempt for: {}", credentials.email);

    match backend
        .post::<_, BackendLogin>(LOGIN_PATH, None, credentials)
        .await
    {
        Ok(login) => {
            info!("Backend accepted login for user {}", login.user.id);
            Some(login)
        }
        Err(e) if e.status() < 500 => {
            warn!("Backend rejected login for {}: {}", credentials.email, e.status());
            None
        }
        Err(e) => {
            error!("Error during authorization: {}", e);
            None
        }
    }
}
