//! # Run a single load.
//!
//! Executes one [`Loader::load`] with an optional timeout. The result is not
//! applied here: the caller posts it back to the runtime mailbox with its
//! correlation ticket.
//!
//! ```text
//! Success:  loader.load() → Ok(handle)
//! Failure:  loader.load() → Err(Failed/NotInitialized)
//! Timeout:  timeout exceeded → Err(Timeout), the load future is dropped
//! ```

use std::time::Duration;

use tokio::time;

use crate::error::LoadError;
use crate::supply::{ContentHandle, Loader, SourceUnit};

/// Loads `unit`, wrapping the call in `tokio::time::timeout` when `timeout`
/// is `Some` and non-zero.
pub(crate) async fn run_load<L: Loader + ?Sized>(
    loader: &L,
    unit: SourceUnit,
    timeout: Option<Duration>,
) -> Result<ContentHandle, LoadError> {
    match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, loader.load(unit)).await {
            Ok(r) => r,
            Err(_elapsed) => Err(LoadError::Timeout { timeout: dur }),
        },
        None => loader.load(unit).await,
    }
}
