//! Overflow area for keys whose target bucket was full.

use crate::key::Key;

/// A key waiting outside its full target bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverflowEntry {
    pub key: Key,
    /// Bucket the key hashed to when it spilled.
    pub target_bucket: usize,
}

/// Overflow entries in arrival order.
///
/// Order matters only for promotion: when a bucket frees a slot, the oldest
/// entry targeting it moves in first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverflowTable {
    entries: Vec<OverflowEntry>,
}

impl OverflowTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, key: Key, target_bucket: usize) {
        self.entries.push(OverflowEntry { key, target_bucket });
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverflowEntry> {
        self.entries.iter()
    }

    pub fn get(&self, key: Key) -> Option<&OverflowEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Remove and return the entry for `key`.
    pub fn remove(&mut self, key: Key) -> Option<OverflowEntry> {
        let idx = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(idx))
    }

    /// Remove and return the oldest entry waiting for `bucket`.
    pub fn take_oldest_for(&mut self, bucket: usize) -> Option<OverflowEntry> {
        let idx = self.entries.iter().position(|e| e.target_bucket == bucket)?;
        Some(self.entries.remove(idx))
    }

    pub fn to_vec(&self) -> Vec<OverflowEntry> {
        self.entries.clone()
    }
}
