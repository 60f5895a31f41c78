//! Session model and related functionality

use chrono::{DateTime, Utc};
use common::models::{Role, User};
use serde::Serialize;
use uuid::Uuid;

/// Server-side session
///
/// The backend bearer token stays here; the browser only holds a signed
/// reference to the session id.
#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub user: User,
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: User, access_token: String, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            user,
            access_token,
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn role(&self) -> Role {
        self.user.rol
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    /// Token used in the `Authorization: Token ...` header
    pub fn token(&self) -> &str {
        &self.access_token
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// What the browser may see of the session
    pub fn view(&self) -> SessionView {
        SessionView {
            user: self.user.clone(),
            rol: self.user.rol,
            expires: self.expires_at,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user.id)
            .field("rol", &self.user.rol)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Public part of a session, returned by `GET /auth/session`
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user: User,
    pub rol: Role,
    pub expires: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_huge_ttl_saturates() {
        let user: User =
            serde_json::from_value(json!({"id": 4, "username": "u", "email": "u@x.org"})).unwrap();
        let session = Session::new(user, "t".into(), chrono::Duration::MAX);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(session.expires_at > session.created_at);
    }
}
