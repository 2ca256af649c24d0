//! Fixed-capacity sorted buckets.

use crate::key::Key;

/// A fixed-capacity slot array.
///
/// Occupied slots always form an ascending prefix of `slots`; every slot after
/// the prefix is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    slots: Vec<Option<Key>>,
    len: usize,
}

impl Bucket {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// All slots, occupied prefix first.
    pub fn slots(&self) -> &[Option<Key>] {
        &self.slots
    }

    /// Slot contents at `position`, `None` when empty or out of range.
    pub fn slot(&self, position: usize) -> Option<Key> {
        self.slots.get(position).copied().flatten()
    }

    /// Occupied keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.slots[..self.len].iter().filter_map(|slot| *slot)
    }

    /// Position of `key` within the occupied prefix.
    pub fn position_of(&self, key: Key) -> Option<usize> {
        self.keys_slice_search(key).ok()
    }

    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.position_of(key).is_some()
    }

    /// Index of the first occupied key `>= key`, or `len()` if none.
    pub fn lower_bound(&self, key: Key) -> usize {
        match self.keys_slice_search(key) {
            Ok(pos) | Err(pos) => pos,
        }
    }

    /// Place `key` keeping the sorted prefix. Returns the slot it landed in,
    /// or `None` when the bucket is full.
    pub fn insert(&mut self, key: Key) -> Option<usize> {
        if self.is_full() {
            return None;
        }
        let pos = self.lower_bound(key);
        // Shift the tail of the prefix one slot right.
        self.slots[pos..=self.len].rotate_right(1);
        self.slots[pos] = Some(key);
        self.len += 1;
        Some(pos)
    }

    /// Clear the slot holding `key` and compact the prefix. Returns the slot
    /// position the key occupied.
    pub fn remove(&mut self, key: Key) -> Option<usize> {
        let pos = self.position_of(key)?;
        self.slots[pos] = None;
        self.slots[pos..self.len].rotate_left(1);
        self.len -= 1;
        Some(pos)
    }

    fn keys_slice_search(&self, key: Key) -> Result<usize, usize> {
        // Occupied prefix is dense, so every slot in range is `Some`.
        self.slots[..self.len].binary_search(&Some(key))
    }
}
