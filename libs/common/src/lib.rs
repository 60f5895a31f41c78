//! Common library for the hours portal
//!
//! This crate provides the pieces shared by the portal services: the DTOs
//! mirrored from the backend API, settings loading, and the authenticated
//! request client every server action goes through.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::BackendClient;
pub use config::Settings;
pub use error::{BackendError, BackendResult, ConfigError};
