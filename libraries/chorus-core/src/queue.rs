//! Top-level play queue
//!
//! Holds tracks and playlists in submission order. The head is the item that
//! is playing (or being fetched).

use crate::item::PlayableItem;
use std::collections::VecDeque;

/// Ordered queue of playable items
///
/// Structure:
/// ```text
/// Current (index 0): Playlist "Road Trip" (cursor 2 of 9)
/// ─────────────────────────────
/// Up next:
///   - Track "abc123" (bob)
///   - Track "xyz789" (carol)
/// ```
///
/// Moving through a playlist's members never touches this queue; only the
/// playlist's own cursor moves.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: VecDeque<PlayableItem>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add item to the tail
    pub fn append(&mut self, item: PlayableItem) {
        self.items.push_back(item);
    }

    /// Item at the head, if any
    pub fn current(&self) -> Option<&PlayableItem> {
        self.items.front()
    }

    pub fn current_mut(&mut self) -> Option<&mut PlayableItem> {
        self.items.front_mut()
    }

    /// Remove and return the head item
    pub fn advance(&mut self) -> Option<PlayableItem> {
        self.items.pop_front()
    }

    /// Remove every item, returning them for cleanup
    pub fn clear(&mut self) -> Vec<PlayableItem> {
        self.items.drain(..).collect()
    }

    /// Items after the head
    pub fn upcoming(&self) -> impl Iterator<Item = &PlayableItem> {
        self.items.iter().skip(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayableItem> {
        self.items.iter()
    }

    /// Total number of items in queue
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
