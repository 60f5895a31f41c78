//! In-process session store

use chrono::Utc;
use common::models::User;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::jwt::SessionTokenService;
use crate::models::Session;

/// Session manager keeping sessions in memory, keyed by session id
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    tokens: SessionTokenService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(tokens: SessionTokenService) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tokens,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.tokens.ttl()
    }

    /// Create a session and return it with its signed cookie value
    pub async fn create_session(
        &self,
        user: User,
        access_token: String,
    ) -> Result<(Session, String), AuthError> {
        let ttl = chrono::Duration::from_std(self.tokens.ttl())
            .unwrap_or_else(|_| chrono::Duration::days(30));
        let session = Session::new(user, access_token, ttl);
        let token = self.tokens.issue(&session)?;

        info!("Creating session for user: {}", session.user_id());
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());

        Ok((session, token))
    }

    /// Resolve the session referenced by a cookie value
    ///
    /// Bad signatures, expired tokens and unknown or expired sessions all
    /// resolve to `None`.
    pub async fn resolve(&self, cookie_value: &str) -> Option<Session> {
        let claims = match self.tokens.validate(cookie_value) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Rejected session token: {}", e);
                return None;
            }
        };

        let sessions = self.sessions.read().await;
        let session = sessions.get(&claims.sub)?;
        if session.is_expired(Utc::now()) {
            return None;
        }
        if session.user_id() != claims.uid {
            warn!("Session {} does not belong to user {}", claims.sub, claims.uid);
            return None;
        }
        Some(session.clone())
    }

    /// Delete a session
    pub async fn delete_session(&self, id: Uuid) -> bool {
        info!("Deleting session: {}", id);
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Remove expired sessions and return how many were dropped
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Cleaned up {} expired sessions", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Purge expired sessions every `every` on a background task
    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                manager.cleanup_expired_sessions().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: i64) -> User {
        serde_json::from_value(json!({"id": id, "username": "u", "email": "u@x.org"})).unwrap()
    }

    fn manager(ttl: Duration) -> SessionManager {
        SessionManager::new(SessionTokenService::new("secret", ttl))
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let sessions = manager(Duration::from_secs(60));
        let (session, cookie) = sessions.create_session(user(4), "tok".into()).await.unwrap();

        let resolved = sessions.resolve(&cookie).await.expect("session");
        assert_eq!(resolved.id, session.id);
        assert_eq!(resolved.token(), "tok");
        assert!(sessions.resolve("garbage").await.is_none());
    }

    #[tokio::test]
    async fn test_deleted_session_no_longer_resolves() {
        let sessions = manager(Duration::from_secs(60));
        let (session, cookie) = sessions.create_session(user(4), "tok".into()).await.unwrap();

        assert!(sessions.delete_session(session.id).await);
        assert!(sessions.resolve(&cookie).await.is_none());
        assert!(!sessions.delete_session(session.id).await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired() {
        let sessions = manager(Duration::from_secs(60));
        let (live, _) = sessions.create_session(user(1), "a".into()).await.unwrap();
        let (stale, _) = sessions.create_session(user(2), "b".into()).await.unwrap();

        sessions
            .sessions
            .write()
            .await
            .entry(stale.id)
            .and_modify(|s| s.expires_at = Utc::now() - chrono::Duration::seconds(1));

        assert_eq!(sessions.cleanup_expired_sessions().await, 1);
        assert_eq!(sessions.len().await, 1);
        assert!(sessions.sessions.read().await.contains_key(&live.id));
    }
}
