//! Account actions: first login setup and password recovery
//!
//! These go to `BACKEND_URL` and hand the backend payload back untouched,
//! since the browser shows the backend's own answer.

use auth::Session;
use common::BackendClient;
use serde_json::Value;
use tracing::info;

use super::ActionResult;
use crate::forms::{InitialSetupForm, ResetPasswordForm, SecurityQuestionForm};

pub const INITIAL_SETUP_PATH: &str = "/api/users/usuarios/configuracion_inicial/";
pub const SECURITY_QUESTION_PATH: &str = "/api/users/usuarios/obtener_pregunta_seguridad/";
pub const RESET_PASSWORD_PATH: &str = "/api/users/usuarios/resetear_password_seguridad/";

#[derive(Debug, Clone)]
pub struct AccountActions {
    backend: BackendClient,
}

impl AccountActions {
    pub fn new(backend: BackendClient) -> Self {
        AccountActions { backend }
    }

    /// New password plus security question, on first login
    pub async fn initial_setup(&self, session: &Session, form: &InitialSetupForm) -> ActionResult<Value> {
        info!("Initial setup for user {}", session.user_id());
        Ok(self
            .backend
            .post(INITIAL_SETUP_PATH, Some(session.token()), form)
            .await?)
    }

    /// Security question of the account behind an email; no session needed
    pub async fn security_question(&self, form: &SecurityQuestionForm) -> ActionResult<Value> {
        info!("Security question requested for {}", form.email);
        Ok(self.backend.post(SECURITY_QUESTION_PATH, None, form).await?)
    }

    /// Reset a password by answering the security question; no session needed
    pub async fn reset_password_security(&self, form: &ResetPasswordForm) -> ActionResult<Value> {
        info!("Password reset requested for {}", form.email);
        Ok(self.backend.post(RESET_PASSWORD_PATH, None, form).await?)
    }
}
