//! Application state shared across handlers

use auth::AuthState;
use axum::extract::FromRef;
use common::{BackendClient, BackendResult, Settings};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::actions::{AccountActions, ActivityActions, HourRecordActions, UserActions};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub users: UserActions,
    pub accounts: AccountActions,
    pub activities: ActivityActions,
    pub records: HourRecordActions,
    /// Report logo, read once at startup
    pub logo: Option<Arc<Vec<u8>>>,
}

impl AppState {
    /// `api` serves the domain actions; the account endpoints use the
    /// session bridge's client (`BACKEND_URL`)
    pub fn new(auth: AuthState, api: BackendClient, logo: Option<Vec<u8>>) -> Self {
        AppState {
            users: UserActions::new(api.clone()),
            accounts: AccountActions::new(auth.backend.clone()),
            activities: ActivityActions::new(api.clone()),
            records: HourRecordActions::new(api),
            auth,
            logo: logo.map(Arc::new),
        }
    }

    pub fn from_settings(settings: &Settings) -> BackendResult<Self> {
        let auth = AuthState::from_settings(settings)?;
        let api = BackendClient::from_settings(settings)?;
        Ok(Self::new(auth, api, load_logo(&settings.report_logo_path)))
    }

    pub fn logo(&self) -> Option<&[u8]> {
        self.logo.as_deref().map(Vec::as_slice)
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> AuthState {
        state.auth.clone()
    }
}

/// Read the report logo; a missing file only disables the logo
pub fn load_logo(path: &Path) -> Option<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => {
            info!("Loaded report logo from {}", path.display());
            Some(bytes)
        }
        Err(e) => {
            warn!("No report logo at {}: {}", path.display(), e);
            None
        }
    }
}
