//! Session bridge models

pub mod credentials;
pub mod session;

// Re-export for convenience
pub use common::models::Role;
pub use credentials::{BackendLogin, LoginCredentials, LoginRequest};
pub use session::{Session, SessionView};
