//! Error types used by the adflow runtime and its capabilities.
//!
//! This module defines three error enums:
//!
//! - [`ConfigError`]: the configuration document could not be decoded.
//! - [`LoadError`]: a single content load failed (never fatal, feeds the rotation policy).
//! - [`RuntimeError`]: the runtime actor is gone and a handle call could not be delivered.
//!
//! All types provide `as_label` for logs/analytics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while decoding the configuration document.
///
/// Only document-level failures surface here. A single malformed step is
/// omitted from the flow instead (see [`FlowConfig::from_json`](crate::FlowConfig::from_json)).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid JSON or misses a required field.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),

    /// A field decoded but carries a value the runtime cannot use.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/analytics.
    ///
    /// # Example
    /// ```
    /// use adflow::ConfigError;
    ///
    /// let err = ConfigError::InvalidField { field: "appId", reason: "empty".into() };
    /// assert_eq!(err.as_label(), "config_invalid_field");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Json(_) => "config_json",
            ConfigError::InvalidField { .. } => "config_invalid_field",
        }
    }
}

/// # Errors produced by a content load.
///
/// Every variant is handled by the scheduler's failure policy; none of them
/// stops the supply pipeline.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The loader reported a failure for this source unit.
    #[error("load failed: {reason}")]
    Failed {
        /// Loader supplied reason.
        reason: String,
    },

    /// The load did not resolve within the configured timeout.
    #[error("load timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The loader backend has not been initialized.
    #[error("loader not initialized")]
    NotInitialized,
}

impl LoadError {
    /// Shorthand for [`LoadError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        LoadError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/analytics.
    ///
    /// # Example
    /// ```
    /// use adflow::LoadError;
    /// use std::time::Duration;
    ///
    /// let err = LoadError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "load_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::Failed { .. } => "load_failed",
            LoadError::Timeout { .. } => "load_timeout",
            LoadError::NotInitialized => "load_not_initialized",
        }
    }
}

/// # Errors produced by the runtime handle.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime actor has stopped; the request was not delivered.
    #[error("runtime closed")]
    Closed,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/analytics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Closed => "runtime_closed",
        }
    }
}
