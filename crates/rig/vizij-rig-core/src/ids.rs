//! Identifiers and a simple allocator for track entries.

use serde::{Deserialize, Serialize};

/// Identity of one `play` call on a lane. A new entry is issued every time a
/// lane's track handle is replaced, so stale handles can be told apart.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Monotonic allocator for EntryId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_entry: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_entry(&mut self) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry = self.next_entry.wrapping_add(1);
        id
    }
}
