//! Portal settings
//!
//! Settings are read with the `config` crate from environment variables on
//! top of built-in defaults. Several keys have a fallback chain inherited
//! from the web front-end naming (`BACKEND_URL` then `NEXT_PUBLIC_BACKEND_URL`,
//! `AUTH_SECRET` then `NEXTAUTH_SECRET`).

use config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Longest accepted session lifetime: one year
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Raw view of the environment, before fallbacks are resolved
#[derive(Debug, Deserialize)]
struct RawSettings {
    backend_url: Option<String>,
    next_public_backend_url: Option<String>,
    api_url: Option<String>,
    auth_secret: Option<String>,
    nextauth_secret: Option<String>,
    portal_bind_addr: String,
    backend_timeout_secs: u64,
    session_ttl_secs: u64,
    session_cookie_secure: bool,
    report_logo_path: String,
}

/// Resolved application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the backend REST API
    pub backend_url: String,
    /// Alternate base used by the request client (`API_URL`), defaults to `backend_url`
    pub api_url: String,
    /// Secret used to sign session tokens
    pub auth_secret: String,
    /// Listen address of the portal
    pub bind_addr: String,
    /// Timeout applied to every outbound backend call
    pub backend_timeout: Duration,
    /// Lifetime of a session
    pub session_ttl: Duration,
    /// Whether the session cookie is issued with the `Secure` attribute
    pub secure_cookies: bool,
    /// Logo embedded in PDF reports, when the file exists
    pub report_logo_path: PathBuf,
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// # Environment Variables
    /// - `BACKEND_URL` / `NEXT_PUBLIC_BACKEND_URL`: backend base URL (default: "http://127.0.0.1:8000")
    /// - `API_URL`: alternate base URL for the request client (default: backend URL)
    /// - `AUTH_SECRET` / `NEXTAUTH_SECRET`: session signing secret (required)
    /// - `PORTAL_BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `BACKEND_TIMEOUT_SECS`: outbound timeout (default: 15)
    /// - `SESSION_TTL_SECS`: session lifetime (default: 30 days)
    /// - `SESSION_COOKIE_SECURE`: issue `__Secure-` cookies (default: false)
    /// - `REPORT_LOGO_PATH`: PNG/JPEG logo for reports (default: "public/img/logo/logo.png")
    pub fn from_env() -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?.add_source(Environment::default());
        Self::from_config(builder.build()?)
    }

    /// Register the built-in defaults on a config builder
    pub fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(builder
            .set_default("portal_bind_addr", "0.0.0.0:3000")?
            .set_default("backend_timeout_secs", 15)?
            .set_default("session_ttl_secs", 30 * 24 * 60 * 60)?
            .set_default("session_cookie_secure", false)?
            .set_default("report_logo_path", "public/img/logo/logo.png")?)
    }

    /// Resolve settings from an already built config
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let raw: RawSettings = config.try_deserialize()?;

        let backend_url = first_set([raw.backend_url, raw.next_public_backend_url])
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let backend_url = backend_url.trim_end_matches('/').to_string();

        let api_url = first_set([raw.api_url])
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| backend_url.clone());

        let auth_secret = first_set([raw.auth_secret, raw.nextauth_secret])
            .ok_or(ConfigError::Missing("AUTH_SECRET"))?;

        if raw.backend_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "BACKEND_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        if raw.session_ttl_secs == 0 || raw.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_SECS",
                reason: format!("must be between 1 and {}", MAX_SESSION_TTL_SECS),
            });
        }

        Ok(Settings {
            backend_url,
            api_url,
            auth_secret,
            bind_addr: raw.portal_bind_addr,
            backend_timeout: Duration::from_secs(raw.backend_timeout_secs),
            session_ttl: Duration::from_secs(raw.session_ttl_secs),
            secure_cookies: raw.session_cookie_secure,
            report_logo_path: PathBuf::from(raw.report_logo_path),
        })
    }
}

/// First non-blank value of a fallback chain
fn first_set<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}
