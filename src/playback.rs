//! Search step logs and step-by-step playback.
//!
//! A search records which bucket slots it inspected, in order, as a
//! [`StepLog`]. A [`PlaybackCursor`] walks that log forwards and backwards;
//! the highlight at any index is recomputed from the log and the live store,
//! so visiting the same index twice always yields the same state.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::bucket::Bucket;
use crate::key::Key;
use crate::store::BucketStore;

/// How a search walks its target bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchProbe {
    /// One step: the slot the key occupies or would occupy.
    #[default]
    Direct,
    /// Slot by slot from the front, until a match or an empty slot.
    Linear,
    /// Binary search over the occupied slots.
    Binary,
}

/// One inspected slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SearchStep {
    pub bucket: usize,
    pub position: usize,
}

/// Ordered inspection steps produced by one search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepLog {
    key: Key,
    steps: SmallVec<[SearchStep; 8]>,
    /// Store generation the log was captured at.
    generation: u64,
}

impl StepLog {
    pub(crate) fn capture(
        probe: SearchProbe,
        key: Key,
        bucket_index: usize,
        bucket: &Bucket,
        generation: u64,
    ) -> Self {
        let mut steps = SmallVec::new();
        let mut push = |position| {
            steps.push(SearchStep {
                bucket: bucket_index,
                position,
            })
        };

        match probe {
            SearchProbe::Direct => {
                let last = bucket.capacity().saturating_sub(1);
                push(bucket.lower_bound(key).min(last));
            }
            SearchProbe::Linear => {
                for position in 0..bucket.capacity() {
                    push(position);
                    match bucket.slot(position) {
                        Some(k) if k != key => {}
                        _ => break,
                    }
                }
            }
            SearchProbe::Binary => {
                if bucket.is_empty() {
                    push(0);
                }
                let (mut lo, mut hi) = (0, bucket.len());
                while lo < hi {
                    let mid = lo + (hi - lo - 1) / 2;
                    push(mid);
                    match bucket.slot(mid) {
                        Some(k) if k == key => break,
                        Some(k) if k < key => lo = mid + 1,
                        _ => hi = mid,
                    }
                }
            }
        }

        Self {
            key,
            steps,
            generation,
        }
    }

    /// The searched key.
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn steps(&self) -> &[SearchStep] {
        &self.steps
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The slot under inspection at one playback index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
    pub step: SearchStep,
    /// Live value at the slot.
    pub value: Option<Key>,
    pub found: bool,
}

/// Highlight state at one playback index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightState {
    pub key: Key,
    /// `None` before the first step.
    pub index: Option<usize>,
    pub inspection: Option<Inspection>,
}

impl HighlightState {
    pub fn is_highlighted(&self, bucket: usize, position: usize) -> bool {
        self.inspection
            .as_ref()
            .is_some_and(|i| i.step == SearchStep { bucket, position })
    }

    pub fn is_found(&self, bucket: usize, position: usize) -> bool {
        self.is_highlighted(bucket, position) && self.inspection.as_ref().is_some_and(|i| i.found)
    }

    /// One-line explanation of this state, with 1-based bucket and position
    /// numbers.
    pub fn narration(&self) -> String {
        let Some(inspection) = &self.inspection else {
            return format!("search for {} not started", self.key);
        };
        let bucket = inspection.step.bucket + 1;
        let position = inspection.step.position + 1;
        match inspection.value {
            _ if inspection.found => {
                format!("key {} found in bucket {bucket}, position {position}", self.key)
            }
            None => format!(
                "position {position} in bucket {bucket} is empty: key {} is not stored here",
                self.key
            ),
            Some(value) => format!(
                "comparing bucket {bucket}, position {position}: {value} != {}",
                self.key
            ),
        }
    }
}

/// Forward/backward navigation over a [`StepLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackCursor {
    log: StepLog,
    index: Option<usize>,
}

impl PlaybackCursor {
    pub fn new(log: StepLog) -> Self {
        Self { log, index: None }
    }

    #[inline]
    pub fn log(&self) -> &StepLog {
        &self.log
    }

    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_finished(&self) -> bool {
        !self.log.is_empty() && self.index == Some(self.log.len() - 1)
    }

    /// Whether `store` has mutated since the log was captured.
    pub fn is_stale(&self, store: &BucketStore) -> bool {
        store.generation() != self.log.generation
    }

    /// Advance one step. No-op on the last step.
    pub fn next(&mut self, store: &BucketStore) -> HighlightState {
        let next = self.index.map_or(0, |i| i + 1);
        if next < self.log.len() {
            self.index = Some(next);
        }
        self.state(store)
    }

    /// Go back one step; stepping back from the first step clears the
    /// highlight. No-op before the first step.
    pub fn prev(&mut self, store: &BucketStore) -> HighlightState {
        self.index = self.index.and_then(|i| i.checked_sub(1));
        self.state(store)
    }

    /// Jump to `index`, clamped to the last step. `None` resets.
    pub fn seek(&mut self, index: Option<usize>, store: &BucketStore) -> HighlightState {
        self.index = match (index, self.log.len()) {
            (_, 0) | (None, _) => None,
            (Some(i), len) => Some(i.min(len - 1)),
        };
        self.state(store)
    }

    /// Highlight state at the current index.
    pub fn state(&self, store: &BucketStore) -> HighlightState {
        let inspection = self.index.map(|i| {
            let step = self.log.steps[i];
            let value = store
                .buckets()
                .get(step.bucket)
                .and_then(|b| b.slot(step.position));
            Inspection {
                step,
                value,
                found: value == Some(self.log.key),
            }
        });
        HighlightState {
            key: self.log.key,
            index: self.index,
            inspection,
        }
    }
}
