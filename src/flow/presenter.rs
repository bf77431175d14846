//! # Presenter capability.
//!
//! A [`Presenter`] displays one pooled item and reports what happened as a
//! stream of [`PresentEvent`]s. `Closed` and `Failed` are terminal; a stream
//! that ends without a terminal event is treated as `Failed`.

use futures::stream::BoxStream;

use crate::supply::CachedItem;

/// Outcome reported while an item is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentEvent {
    Shown,
    Clicked,
    Closed,
    Failed(String),
}

impl PresentEvent {
    /// True for `Closed` and `Failed`.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PresentEvent::Closed | PresentEvent::Failed(_))
    }
}

/// Displays pooled content.
///
/// The presenter is the only place allowed to look inside the
/// [`ContentHandle`](crate::ContentHandle).
pub trait Presenter: Send + Sync + 'static {
    /// Starts presenting `item` and returns its event stream.
    fn present(&self, item: CachedItem) -> BoxStream<'static, PresentEvent>;
}
