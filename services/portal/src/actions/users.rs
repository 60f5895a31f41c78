//! User actions

use auth::{Session, validation::FieldErrors};
use chrono::Local;
use common::{
    BackendClient,
    models::{NewUser, UpdateUser, User, user::meets_minimum_age},
};
use tracing::{info, warn};

use super::{ActionResult, fetch_list, item_path};
use crate::error::ActionError;

pub const USERS_PATH: &str = "/api/users/usuarios/";
pub const MY_PROFILE_PATH: &str = "/api/users/usuarios/mi_perfil/";

/// Message shown when the birth date fails the age gate
pub const UNDERAGE_MESSAGE: &str = "El usuario debe tener al menos 15 años";

/// Actions on `/api/users/usuarios/`
#[derive(Debug, Clone)]
pub struct UserActions {
    backend: BackendClient,
}

impl UserActions {
    pub fn new(backend: BackendClient) -> Self {
        UserActions { backend }
    }

    pub async fn list_users(&self, session: &Session) -> ActionResult<Vec<User>> {
        info!("Listing users for user {}", session.user_id());
        fetch_list(&self.backend, USERS_PATH, session.token()).await
    }

    pub async fn get_user(&self, session: &Session, id: i64) -> ActionResult<User> {
        info!("Fetching user {}", id);
        Ok(self.backend.get(&item_path(USERS_PATH, id), session.token()).await?)
    }

    /// Create a user; the age gate is checked again before calling the backend
    pub async fn create_user(&self, session: &Session, user: &NewUser) -> ActionResult<User> {
        info!("Creating user {}", user.username);

        let today = Local::now().date_naive();
        if !meets_minimum_age(user.fecha_nacimiento, today) {
            warn!("Refusing to create underage user {}", user.username);
            let mut errors = FieldErrors::default();
            errors.add("fecha_nacimiento", UNDERAGE_MESSAGE);
            return Err(ActionError::Validation(errors));
        }

        Ok(self.backend.post(USERS_PATH, Some(session.token()), user).await?)
    }

    pub async fn update_user(&self, session: &Session, id: i64, patch: &UpdateUser) -> ActionResult<User> {
        info!("Updating user {}", id);
        Ok(self
            .backend
            .patch(&item_path(USERS_PATH, id), session.token(), patch)
            .await?)
    }

    pub async fn delete_user(&self, session: &Session, id: i64) -> ActionResult<()> {
        info!("Deleting user {}", id);
        Ok(self.backend.delete(&item_path(USERS_PATH, id), session.token()).await?)
    }

    /// Profile of the session's own user
    pub async fn my_profile(&self, session: &Session) -> ActionResult<User> {
        info!("Fetching profile of user {}", session.user_id());
        Ok(self.backend.get(MY_PROFILE_PATH, session.token()).await?)
    }
}
