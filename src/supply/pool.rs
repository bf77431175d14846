//! # Bounded FIFO pool of loaded content.
//!
//! Oldest-loaded items are served first. The pool never holds more than its
//! capacity: [`Pool::push`] hands the item back when full.

use std::collections::VecDeque;

use crate::supply::content::CachedItem;

/// Bounded FIFO of [`CachedItem`]s.
#[derive(Debug, Default)]
pub struct Pool {
    items: VecDeque<CachedItem>,
    capacity: usize,
}

impl Pool {
    /// Creates an empty pool holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an item at the tail; returns it back if the pool is full.
    pub fn push(&mut self, item: CachedItem) -> Result<(), CachedItem> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    /// Removes and returns the oldest item.
    pub fn pop(&mut self) -> Option<CachedItem> {
        self.items.pop_front()
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates items from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CachedItem> {
        self.items.iter()
    }
}
