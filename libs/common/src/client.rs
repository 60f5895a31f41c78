//! Authenticated request client for the backend REST API
//!
//! Every outbound call goes through [`BackendClient`], which attaches the
//! session's `Authorization: Token <token>` header, applies the configured
//! timeout and normalizes failures into [`BackendError`].
//!
//! A 401 is only logged and returned here. This client runs inside request
//! handlers that already own the response, so redirecting is left to the
//! caller.

use reqwest::{Client, StatusCode, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

pub use reqwest::Method;

use crate::config::Settings;
use crate::error::{BackendError, BackendResult};

/// HTTP client bound to the backend base URL
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BackendError::Transport)?;

        Ok(BackendClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create the client described by the application settings
    pub fn from_settings(settings: &Settings) -> BackendResult<Self> {
        Self::new(settings.api_url.clone(), settings.backend_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Execute a call and decode the JSON payload into `T`
    ///
    /// An empty success body decodes as JSON `null`, so `()` and
    /// `serde_json::Value` work for 204 responses.
    pub async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> BackendResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, path);

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(header::ACCEPT, "application/json");

        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Backend request {} {} failed: {}", method, path, e);
            BackendError::Transport(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            error!("Failed to read backend response for {} {}: {}", method, path, e);
            BackendError::Transport(e)
        })?;

        if !status.is_success() {
            let data = parse_error_body(&bytes);
            if status == StatusCode::UNAUTHORIZED {
                warn!(
                    "Backend answered 401 for {} {}; caller must handle the redirect",
                    method, path
                );
            } else {
                warn!("Backend answered {} for {} {}", status, method, path);
            }
            return Err(BackendError::from_status(status.as_u16(), data));
        }

        let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        serde_json::from_slice(payload).map_err(|e| {
            error!("Failed to decode backend response for {} {}: {}", method, path, e);
            BackendError::Decode(e.to_string())
        })
    }

    /// Authenticated GET
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> BackendResult<T> {
        self.send::<(), T>(Method::GET, path, Some(token), None).await
    }

    /// POST, authenticated when a token is given
    pub async fn post<B, T>(&self, path: &str, token: Option<&str>, body: &B) -> BackendResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, path, token, Some(body)).await
    }

    /// Authenticated PATCH
    pub async fn patch<B, T>(&self, path: &str, token: &str, body: &B) -> BackendResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::PATCH, path, Some(token), Some(body)).await
    }

    /// Authenticated DELETE; any success body is discarded
    pub async fn delete(&self, path: &str, token: &str) -> BackendResult<()> {
        self.send::<(), Value>(Method::DELETE, path, Some(token), None)
            .await
            .map(|_| ())
    }
}

/// Error bodies are usually JSON; keep plain text bodies as a string
fn parse_error_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = BackendClient::new("http://api.local/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://api.local");
        assert_eq!(client.url("/api/users/"), "http://api.local/api/users/");
        assert_eq!(client.url("api/users/"), "http://api.local/api/users/");
    }

    #[test]
    fn test_error_body_parsing() {
        assert_eq!(parse_error_body(b""), Value::Null);
        assert_eq!(parse_error_body(b"{\"detail\":\"x\"}")["detail"], "x");
        assert_eq!(parse_error_body(b"Bad Gateway"), Value::String("Bad Gateway".into()));
    }
}
