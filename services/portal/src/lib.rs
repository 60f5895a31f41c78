//! Backend-for-frontend of the hours portal
//!
//! Serves the dashboard pages as JSON view-models, validates forms, runs
//! the domain actions against the backend API with the session's token and
//! produces the CSV and PDF exports.

pub mod actions;
pub mod dashboard;
pub mod error;
pub mod forms;
pub mod routes;
pub mod state;
pub mod tables;

pub use error::{ActionError, Envelope, PortalError, PortalResult};
pub use state::AppState;
