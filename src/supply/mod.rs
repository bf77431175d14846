//! Content supply: registry, pool, cursor and the fill scheduler.
//!
//! ## Contents
//! - [`ContentType`], [`SourceUnit`], [`ContentHandle`], [`CachedItem`] content model
//! - [`ContentUnitRegistry`] per-type source lists and target size
//! - [`Pool`] bounded FIFO of loaded items
//! - [`SchedulerCursor`] round-robin position with failure backoff
//! - [`Loader`] loader capability
//! - `SupplyScheduler` (crate-internal) the serial fill loop

mod content;
mod cursor;
mod loader;
mod pool;
mod registry;
mod scheduler;

pub use content::{CachedItem, ContentHandle, ContentType, SourceUnit};
pub use cursor::{CursorMove, SchedulerCursor};
pub use loader::Loader;
pub use pool::Pool;
pub use registry::ContentUnitRegistry;
pub use scheduler::SupplySnapshot;
pub(crate) use scheduler::{ItemSource, NoSupply, SupplyScheduler};
