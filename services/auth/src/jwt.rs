//! Signed session tokens
//!
//! The session cookie carries an HS256 JWT signed with `AUTH_SECRET`. It
//! only references a server-side session; the backend bearer token is never
//! part of the claims.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::AuthError;
use crate::models::{Role, Session};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Session id
    pub sub: Uuid,
    /// Backend user id
    pub uid: i64,
    /// User role
    pub rol: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        SessionTokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `session`, expiring with it
    pub fn issue(&self, session: &Session) -> Result<String, AuthError> {
        let iat = session.created_at.timestamp().max(0) as u64;
        let claims = Claims {
            sub: session.id,
            uid: session.user_id(),
            rol: session.role(),
            iat,
            exp: session.expires_at.timestamp().max(0) as u64,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Validate a token and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
