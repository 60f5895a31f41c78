//! Login payloads

use common::models::User;
use serde::{Deserialize, Serialize};

/// Credentials forwarded to the backend login endpoint
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(flatten)]
    pub credentials: LoginCredentials,
    /// Page the user was heading to before the gate sent them to login
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Successful answer of `/api/users/auth/login/`
#[derive(Debug, Clone, Deserialize)]
pub struct BackendLogin {
    pub token: String,
    pub user: User,
}
