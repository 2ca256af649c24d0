//! # exthash
//!
//! An external-hashing engine with fixed-width numeric keys, fixed-capacity
//! buckets, an overflow table, and density-driven resizing.
//!
//! Keys are hashed to one of an even number of buckets. Each bucket keeps its
//! keys sorted in a dense prefix of its slots; when a bucket is full the key
//! goes to the overflow table, tagged with the bucket it wanted. After every
//! insert and delete the store compares its density (occupied slots over total
//! slots) with the configured thresholds and grows or shrinks the bucket
//! array, rehashing every key.
//!
//! Searches also produce a [`StepLog`] of the slots they inspected, which a
//! [`PlaybackCursor`] can walk one step at a time.
//!
//! ## Example
//!
//! ```rust
//! use exthash::{BucketStore, SearchVerdict, StoreConfig};
//!
//! let mut store = BucketStore::new(StoreConfig::default())?;
//! store.insert(1234)?;
//! store.insert(5678)?;
//!
//! let result = store.search(1234)?;
//! assert_eq!(result.verdict, SearchVerdict::InBucket { bucket: 2, position: 0 });
//! assert_eq!(store.len(), 2);
//! # Ok::<(), exthash::HashError>(())
//! ```

pub mod bucket;
pub mod config;
pub mod density;
pub mod error;
pub mod hash;
pub mod key;
pub mod overflow;
pub mod playback;
pub mod resize;
pub mod session;
pub mod store;

pub use bucket::Bucket;
pub use config::{ModifyMode, StoreConfig};
pub use density::{
    DensityConfig, DensityController, DensityDecision, Factor, FactorCursor, ResizeStrategy,
    EXPANSION_FACTORS, MIN_BUCKETS,
};
pub use error::{ConfigError, ConfigViolation, HashError, Result};
pub use hash::{HashKind, HashOutcome};
pub use key::{parse_key, Key, MAX_KEY_DIGITS};
pub use overflow::{OverflowEntry, OverflowTable};
pub use playback::{HighlightState, Inspection, PlaybackCursor, SearchProbe, SearchStep, StepLog};
pub use resize::{ResizeDirection, ResizePlan, ResizeReport};
pub use session::Session;
pub use store::{
    BucketStore, DeleteOutcome, InsertOutcome, ModifyOutcome, Placement, Removal, ResizeEvent,
    SearchResult, SearchVerdict,
};

#[cfg(test)]
mod proptests;
