//! Common types and utilities shared across fedinbox crates.
//!
//! This crate holds the workspace-wide error type and the observability
//! helpers used by both the gateway and the terminal client. It stays
//! small so every crate can depend on it without dragging in the HTTP or
//! UI stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`FedinboxError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use fedinbox_common::FedinboxError;
//!
//! let err = FedinboxError::Config("missing gateway.access_token".into());
//! assert_eq!(
//!     err.to_string(),
//!     "Configuration error: missing gateway.access_token"
//! );
//! ```
pub mod observability;

/// Error types used at the boundaries between fedinbox crates.
#[derive(thiserror::Error, Debug)]
pub enum FedinboxError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`FedinboxError`].
pub type Result<T> = std::result::Result<T, FedinboxError>;
