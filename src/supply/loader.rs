//! # Loader capability.
//!
//! [`Loader`] resolves a [`SourceUnit`] into an opaque [`ContentHandle`]. The
//! scheduler issues at most one load at a time and redelivers the result onto
//! the runtime context before touching the pool.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use adflow::{ContentHandle, LoadError, Loader, SourceUnit};
//!
//! struct Network;
//!
//! #[async_trait]
//! impl Loader for Network {
//!     async fn load(&self, unit: SourceUnit) -> Result<ContentHandle, LoadError> {
//!         if unit.source_id.is_empty() {
//!             return Err(LoadError::failed("empty source id"));
//!         }
//!         Ok(ContentHandle::new(unit.source_id.to_string()))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::LoadError;
use crate::supply::content::{ContentHandle, SourceUnit};

/// Asynchronous content loader.
#[async_trait]
pub trait Loader: Send + Sync + 'static {
    /// One-time backend initialization.
    ///
    /// Called at most once per successful launch; the runtime guards against
    /// duplicate and concurrent calls.
    async fn initialize(&self) -> Result<(), LoadError> {
        Ok(())
    }

    /// Loads one source unit.
    async fn load(&self, unit: SourceUnit) -> Result<ContentHandle, LoadError>;
}
