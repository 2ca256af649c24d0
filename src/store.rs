//! The bucket store: hash placement, overflow, and density-driven resizing.

use log::{debug, info, warn};

use crate::bucket::Bucket;
use crate::config::{ModifyMode, StoreConfig};
use crate::density::{load_percent, DensityController, DensityDecision, FactorCursor, MIN_BUCKETS};
use crate::error::{HashError, Result};
use crate::hash::HashOutcome;
use crate::key::{self, Key};
use crate::overflow::{OverflowEntry, OverflowTable};
use crate::playback::StepLog;
use crate::resize::{self, Redistribution, ResizeDirection, ResizePlan, ResizeReport};

/// Where an inserted key went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Bucket { bucket: usize, position: usize },
    /// Target bucket was full.
    Overflow { target_bucket: usize },
}

/// Where a deleted key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    Bucket { bucket: usize, position: usize },
    Overflow { target_bucket: usize },
}

/// Structural change triggered by the density check after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeEvent {
    None,
    Resized(ResizeReport),
    /// Density fell below the minimum at the two-bucket floor; nothing changed.
    ReductionBlocked { bucket_count: usize },
}

impl ResizeEvent {
    pub fn report(&self) -> Option<&ResizeReport> {
        match self {
            ResizeEvent::Resized(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of [`BucketStore::insert`].
///
/// `placement` describes where the key landed before any resize; when
/// `resize` is [`ResizeEvent::Resized`] every key has since been rehashed.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertOutcome {
    pub key: Key,
    pub hash: HashOutcome,
    pub placement: Placement,
    /// Density after the operation, resize included.
    pub density: f64,
    pub resize: ResizeEvent,
}

/// Result of [`BucketStore::delete`].
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteOutcome {
    pub key: Key,
    pub removed: Removal,
    /// Overflow entry moved into the freed slot.
    pub promoted: Option<OverflowEntry>,
    pub density: f64,
    pub resize: ResizeEvent,
}

/// Result of [`BucketStore::modify`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModifyOutcome {
    pub mode: ModifyMode,
    pub deleted: DeleteOutcome,
    pub inserted: InsertOutcome,
}

/// Result of [`BucketStore::search`].
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    pub hash: HashOutcome,
    pub log: StepLog,
    pub verdict: SearchVerdict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchVerdict {
    InBucket { bucket: usize, position: usize },
    InOverflow { target_bucket: usize },
    Absent,
}

impl SearchResult {
    /// Whether the key is stored anywhere.
    pub fn found(&self) -> bool {
        !matches!(self.verdict, SearchVerdict::Absent)
    }
}

/// Bucket array plus overflow table.
///
/// Every key lives in exactly one place: a slot of the bucket it hashes to
/// under the current bucket count, or the overflow table.
#[derive(Clone, Debug)]
pub struct BucketStore {
    config: StoreConfig,
    buckets: Vec<Bucket>,
    overflow: OverflowTable,
    controller: DensityController,
    /// Bumped on every mutation; step logs remember the value they saw.
    generation: u64,
}

impl BucketStore {
    /// Create an empty store, rejecting invalid configurations.
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let buckets = (0..config.bucket_count)
            .map(|_| Bucket::new(config.bucket_capacity))
            .collect();
        info!(
            "created structure with {} buckets of capacity {} ({:?}, {:?} resize)",
            config.bucket_count, config.bucket_capacity, config.hash, config.density.strategy
        );
        Ok(Self {
            controller: DensityController::new(config.density),
            config,
            buckets,
            overflow: OverflowTable::new(),
            generation: 0,
        })
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn bucket_capacity(&self) -> usize {
        self.config.bucket_capacity
    }

    #[inline]
    pub fn key_digits(&self) -> u32 {
        self.config.key_digits
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn overflow(&self) -> &OverflowTable {
        &self.overflow
    }

    /// Copy of the overflow entries in arrival order.
    pub fn overflow_snapshot(&self) -> Vec<OverflowEntry> {
        self.overflow.to_vec()
    }

    /// Keys held in bucket slots.
    pub fn occupied(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    /// Keys held anywhere, overflow included.
    pub fn len(&self) -> usize {
        self.occupied() + self.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bucket keys (bucket order, slot order) followed by overflow keys.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.buckets
            .iter()
            .flat_map(Bucket::keys)
            .chain(self.overflow.iter().map(|e| e.key))
    }

    /// Occupied share of bucket capacity, in percent. Overflow is not counted.
    pub fn current_density(&self) -> f64 {
        load_percent(self.occupied(), self.bucket_count(), self.bucket_capacity())
    }

    pub fn factor_cursor(&self) -> FactorCursor {
        self.controller.cursor()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hash `key` against the current bucket count.
    pub fn hash(&self, key: Key) -> HashOutcome {
        self.config
            .hash
            .hash(key, self.bucket_count(), self.config.key_digits)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.buckets[self.hash(key).bucket].contains(key) || self.overflow.contains(key)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Insert `key`, spilling to overflow when its bucket is full, then expand
    /// if density rose above the maximum.
    pub fn insert(&mut self, key: Key) -> Result<InsertOutcome> {
        self.check_key(key)?;
        if self.contains(key) {
            return Err(HashError::DuplicateKey(key));
        }
        let (hash, placement) = self.place(key);
        self.generation += 1;
        let resize = self.settle_after_insert();
        Ok(InsertOutcome {
            key,
            hash,
            placement,
            density: self.current_density(),
            resize,
        })
    }

    /// Locate `key` and record the slots inspected along the way.
    pub fn search(&self, key: Key) -> Result<SearchResult> {
        self.check_key(key)?;
        let hash = self.hash(key);
        let bucket = &self.buckets[hash.bucket];
        let log = StepLog::capture(self.config.probe, key, hash.bucket, bucket, self.generation);
        let verdict = match bucket.position_of(key) {
            Some(position) => SearchVerdict::InBucket {
                bucket: hash.bucket,
                position,
            },
            None => match self.overflow.get(key) {
                Some(entry) => SearchVerdict::InOverflow {
                    target_bucket: entry.target_bucket,
                },
                None => SearchVerdict::Absent,
            },
        };
        debug!("search {key}: {} -> {verdict:?} in {} steps", hash.trace, log.len());
        Ok(SearchResult { hash, log, verdict })
    }

    /// Remove `key` from its bucket (promoting the oldest overflow entry that
    /// targets the same bucket) or from overflow, then reduce if density fell
    /// below the minimum.
    pub fn delete(&mut self, key: Key) -> Result<DeleteOutcome> {
        self.check_key(key)?;
        let (removed, promoted) = self.remove_key(key)?;
        self.generation += 1;
        let resize = self.settle_after_delete();
        Ok(DeleteOutcome {
            key,
            removed,
            promoted,
            density: self.current_density(),
            resize,
        })
    }

    /// Replace `old_key` with `new_key`.
    ///
    /// Both keys are validated, `old_key` must be present and `new_key`
    /// absent. In [`ModifyMode::TwoPhase`] this is `delete(old_key)` followed
    /// by `insert(new_key)`: each step runs its own density check and the
    /// pair is not transactional, so an error from the insert leaves
    /// `old_key` removed. [`ModifyMode::Atomic`] swaps the keys and runs a
    /// single density check afterwards.
    pub fn modify(&mut self, old_key: Key, new_key: Key) -> Result<ModifyOutcome> {
        self.check_key(old_key)?;
        self.check_key(new_key)?;
        if !self.contains(old_key) {
            return Err(HashError::KeyNotFound(old_key));
        }
        if self.contains(new_key) {
            return Err(HashError::DuplicateKey(new_key));
        }

        let mode = self.config.modify_mode;
        let (deleted, inserted) = match mode {
            ModifyMode::TwoPhase => {
                let deleted = self.delete(old_key)?;
                let inserted = self.insert(new_key)?;
                (deleted, inserted)
            }
            ModifyMode::Atomic => {
                let (removed, promoted) = self.remove_key(old_key)?;
                let density_between = self.current_density();
                let (hash, placement) = self.place(new_key);
                self.generation += 1;
                let resize = self.settle_after_swap();
                let deleted = DeleteOutcome {
                    key: old_key,
                    removed,
                    promoted,
                    density: density_between,
                    resize: ResizeEvent::None,
                };
                let inserted = InsertOutcome {
                    key: new_key,
                    hash,
                    placement,
                    density: self.current_density(),
                    resize,
                };
                (deleted, inserted)
            }
        };
        Ok(ModifyOutcome {
            mode,
            deleted,
            inserted,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_key(&self, key: Key) -> Result<()> {
        key::validate(key, self.config.key_digits)
    }

    /// Put `key` in its bucket or in overflow. No density check.
    fn place(&mut self, key: Key) -> (HashOutcome, Placement) {
        let hash = self.hash(key);
        let placement = match self.buckets[hash.bucket].insert(key) {
            Some(position) => {
                debug!("insert {key}: {} -> slot {position}", hash.trace);
                Placement::Bucket {
                    bucket: hash.bucket,
                    position,
                }
            }
            None => {
                debug!("insert {key}: {} -> bucket full, overflow", hash.trace);
                self.overflow.push(key, hash.bucket);
                Placement::Overflow {
                    target_bucket: hash.bucket,
                }
            }
        };
        (hash, placement)
    }

    /// Take `key` out of the store. No density check.
    fn remove_key(&mut self, key: Key) -> Result<(Removal, Option<OverflowEntry>)> {
        let target = self.hash(key).bucket;
        if let Some(position) = self.buckets[target].remove(key) {
            let promoted = self.overflow.take_oldest_for(target);
            if let Some(entry) = promoted {
                if self.buckets[target].insert(entry.key).is_none() {
                    self.overflow.push(entry.key, entry.target_bucket);
                }
                debug!("delete {key}: promoted {} from overflow into bucket {target}", entry.key);
            }
            return Ok((
                Removal::Bucket {
                    bucket: target,
                    position,
                },
                promoted,
            ));
        }

        match self.overflow.remove(key) {
            Some(entry) => {
                debug!("delete {key}: removed from overflow");
                Ok((
                    Removal::Overflow {
                        target_bucket: entry.target_bucket,
                    },
                    None,
                ))
            }
            None => Err(HashError::KeyNotFound(key)),
        }
    }

    fn settle_after_insert(&mut self) -> ResizeEvent {
        let decision = self.controller.after_insert(self.current_density());
        self.apply(decision)
    }

    fn settle_after_delete(&mut self) -> ResizeEvent {
        let decision = self
            .controller
            .after_delete(self.current_density(), self.bucket_count());
        self.apply(decision)
    }

    fn settle_after_swap(&mut self) -> ResizeEvent {
        let density = self.current_density();
        let decision = match self.controller.after_insert(density) {
            DensityDecision::Hold => self.controller.after_delete(density, self.bucket_count()),
            expand => expand,
        };
        self.apply(decision)
    }

    fn apply(&mut self, decision: DensityDecision) -> ResizeEvent {
        match decision {
            DensityDecision::Hold => ResizeEvent::None,
            DensityDecision::Expand => ResizeEvent::Resized(self.resize(ResizeDirection::Expand)),
            DensityDecision::Reduce => ResizeEvent::Resized(self.resize(ResizeDirection::Reduce)),
            DensityDecision::ReductionFloor => {
                warn!(
                    "density {:.1}% below minimum {}% but structure is at {MIN_BUCKETS} buckets; not reducing",
                    self.current_density(),
                    self.controller.config().min_density
                );
                ResizeEvent::ReductionBlocked {
                    bucket_count: self.bucket_count(),
                }
            }
        }
    }

    /// Rebuild the bucket array at the planned size and swap it in together
    /// with the rebuilt overflow table.
    fn resize(&mut self, direction: ResizeDirection) -> ResizeReport {
        let strategy = self.controller.strategy();
        let from = self.bucket_count();
        let plan: ResizePlan = match direction {
            ResizeDirection::Expand => {
                resize::plan_expansion(strategy, self.controller.cursor_mut(), from)
            }
            ResizeDirection::Reduce => {
                resize::plan_reduction(strategy, self.controller.cursor_mut(), from)
            }
        };

        let Redistribution {
            buckets,
            overflow,
            rehashed,
        } = resize::redistribute(
            &self.buckets,
            &self.overflow,
            plan.to,
            self.config.bucket_capacity,
            self.config.hash,
            self.config.key_digits,
        );
        self.buckets = buckets;
        self.overflow = overflow;
        self.generation += 1;

        info!(
            "{:?} {:?} resize: {} -> {} buckets (factor {}), {} keys rehashed, {} in overflow, density {:.1}%",
            plan.strategy,
            plan.direction,
            plan.from,
            plan.to,
            plan.factor.map_or_else(|| "-".to_string(), |f| f.to_string()),
            rehashed,
            self.overflow.len(),
            self.current_density()
        );

        ResizeReport {
            plan,
            rehashed,
            overflow_after: self.overflow.len(),
        }
    }
}
