//! # Round-robin cursor with failure backoff.
//!
//! [`SchedulerCursor`] is the only mutable scheduling state of the supply
//! scheduler: `(kind, index, consecutive_failures)`.
//!
//! ## Rules
//! ```text
//! index out of bounds            → switch type
//! load ok                        → failures = 0; index += 1
//!                                    └─ past the end: Reward wraps to 0 in place,
//!                                                     other types switch
//! load failed                    → failures += 1
//!                                    ├─ failures >= len: switch type
//!                                    └─ otherwise: index += 1 (no wrap check)
//! switch type                    → index = 0; failures = 0; kind = kind.next()
//! ```
//! Reward is the primary type: it keeps cycling its own list on success while
//! the other types escalate to the next type.

use crate::supply::content::ContentType;

/// What a cursor transition did; used for event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    /// Moved to the next index of the same type.
    Advanced,
    /// Wrapped back to index 0 of the same type.
    Wrapped,
    /// Moved to index 0 of another type.
    Switched {
        from: ContentType,
        to: ContentType,
    },
}

/// Position of the scheduler within the per-type source lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerCursor {
    kind: ContentType,
    index: usize,
    failures: usize,
}

impl Default for SchedulerCursor {
    fn default() -> Self {
        Self {
            kind: ContentType::Reward,
            index: 0,
            failures: 0,
        }
    }
}

impl SchedulerCursor {
    /// Creates a cursor at `(Reward, 0, 0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content type.
    #[inline]
    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// Current index within the type's source list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consecutive failures recorded for the current type.
    #[inline]
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Resets to `(Reward, 0, 0)`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Switches to the next type, clearing index and failures.
    pub fn switch_type(&mut self) -> CursorMove {
        let from = self.kind;
        self.kind = self.kind.next();
        self.index = 0;
        self.failures = 0;
        CursorMove::Switched { from, to: self.kind }
    }

    /// Applies a successful load; `len` is the current type's list length.
    pub fn on_success(&mut self, len: usize) -> CursorMove {
        self.failures = 0;
        self.index += 1;
        if self.index < len {
            return CursorMove::Advanced;
        }
        match self.kind {
            ContentType::Reward => {
                self.index = 0;
                CursorMove::Wrapped
            }
            _ => self.switch_type(),
        }
    }

    /// Applies a failed load; `len` is the current type's list length.
    pub fn on_failure(&mut self, len: usize) -> CursorMove {
        self.failures += 1;
        if self.failures >= len {
            self.switch_type()
        } else {
            self.index += 1;
            CursorMove::Advanced
        }
    }
}
