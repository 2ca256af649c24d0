//! Structure lifecycle as seen by a front end.
//!
//! A [`Session`] starts without a structure; every operation fails with
//! [`HashError::StructureNotInitialized`] until [`Session::create_structure`]
//! succeeds. It also keeps the playback cursor of the most recent search,
//! dropping it on the next mutation since its steps may no longer match the
//! store.

use crate::config::StoreConfig;
use crate::error::{HashError, Result};
use crate::key::{parse_key, Key};
use crate::overflow::OverflowEntry;
use crate::playback::{HighlightState, PlaybackCursor};
use crate::store::{BucketStore, DeleteOutcome, InsertOutcome, ModifyOutcome, SearchResult};

#[derive(Clone, Debug, Default)]
pub struct Session {
    store: Option<BucketStore>,
    playback: Option<PlaybackCursor>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current structure with a fresh empty one. On error the
    /// previous structure (if any) is kept.
    pub fn create_structure(&mut self, config: StoreConfig) -> Result<&BucketStore> {
        let store = BucketStore::new(config)?;
        self.playback = None;
        Ok(self.store.insert(store))
    }

    pub fn is_created(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> Result<&BucketStore> {
        self.store.as_ref().ok_or(HashError::StructureNotInitialized)
    }

    fn store_mut(&mut self) -> Result<&mut BucketStore> {
        self.playback = None;
        self.store.as_mut().ok_or(HashError::StructureNotInitialized)
    }

    pub fn insert(&mut self, key: Key) -> Result<InsertOutcome> {
        self.store_mut()?.insert(key)
    }

    pub fn delete(&mut self, key: Key) -> Result<DeleteOutcome> {
        self.store_mut()?.delete(key)
    }

    pub fn modify(&mut self, old_key: Key, new_key: Key) -> Result<ModifyOutcome> {
        self.store_mut()?.modify(old_key, new_key)
    }

    /// Search for `key` and start a new playback over its step log.
    pub fn search(&mut self, key: Key) -> Result<SearchResult> {
        let result = self.store()?.search(key)?;
        self.playback = Some(PlaybackCursor::new(result.log.clone()));
        Ok(result)
    }

    // Text entry points: keys typed by a user, validated against the
    // configured width before anything else happens.

    pub fn insert_text(&mut self, text: &str) -> Result<InsertOutcome> {
        let key = self.parse(text)?;
        self.insert(key)
    }

    pub fn delete_text(&mut self, text: &str) -> Result<DeleteOutcome> {
        let key = self.parse(text)?;
        self.delete(key)
    }

    pub fn modify_text(&mut self, old_text: &str, new_text: &str) -> Result<ModifyOutcome> {
        let old_key = self.parse(old_text)?;
        let new_key = self.parse(new_text)?;
        self.modify(old_key, new_key)
    }

    pub fn search_text(&mut self, text: &str) -> Result<SearchResult> {
        let key = self.parse(text)?;
        self.search(key)
    }

    fn parse(&self, text: &str) -> Result<Key> {
        parse_key(text, self.store()?.key_digits())
    }

    // Playback

    pub fn playback(&self) -> Option<&PlaybackCursor> {
        self.playback.as_ref()
    }

    /// Advance the active playback. `Ok(None)` when no search is active.
    pub fn next_step(&mut self) -> Result<Option<HighlightState>> {
        let store = self.store.as_ref().ok_or(HashError::StructureNotInitialized)?;
        Ok(self.playback.as_mut().map(|cursor| cursor.next(store)))
    }

    /// Step the active playback back. `Ok(None)` when no search is active.
    pub fn prev_step(&mut self) -> Result<Option<HighlightState>> {
        let store = self.store.as_ref().ok_or(HashError::StructureNotInitialized)?;
        Ok(self.playback.as_mut().map(|cursor| cursor.prev(store)))
    }

    /// Rewind the active playback to its not-started state.
    pub fn reset_playback(&mut self) -> Result<Option<HighlightState>> {
        let store = self.store.as_ref().ok_or(HashError::StructureNotInitialized)?;
        Ok(self.playback.as_mut().map(|cursor| cursor.seek(None, store)))
    }

    // Introspection

    pub fn current_density(&self) -> Result<f64> {
        Ok(self.store()?.current_density())
    }

    pub fn bucket_count(&self) -> Result<usize> {
        Ok(self.store()?.bucket_count())
    }

    pub fn overflow_snapshot(&self) -> Result<Vec<OverflowEntry>> {
        Ok(self.store()?.overflow_snapshot())
    }
}
