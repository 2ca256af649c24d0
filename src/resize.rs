//! Expansion and reduction of the bucket array.
//!
//! A resize is two steps: a [`ResizePlan`] picks the new bucket count from the
//! strategy (and, for partial resizes, the factor cursor), then
//! [`redistribute`] rehashes every live key into a freshly built bucket array
//! and overflow table. The store swaps both in at once.

use crate::bucket::Bucket;
use crate::density::{Factor, FactorCursor, ResizeStrategy, MIN_BUCKETS};
use crate::hash::HashKind;
use crate::key::Key;
use crate::overflow::OverflowTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeDirection {
    Expand,
    Reduce,
}

/// New bucket count for one resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizePlan {
    pub direction: ResizeDirection,
    pub strategy: ResizeStrategy,
    pub from: usize,
    pub to: usize,
    /// Factor read from the cursor; `None` for total resizes.
    pub factor: Option<Factor>,
}

/// What a completed resize did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeReport {
    pub plan: ResizePlan,
    /// Keys rehashed (bucket keys plus former overflow entries).
    pub rehashed: usize,
    /// Overflow entries after redistribution.
    pub overflow_after: usize,
}

/// Plan an expansion from `bucket_count` buckets.
///
/// Partial expansion advances `cursor` before reading the factor.
pub fn plan_expansion(
    strategy: ResizeStrategy,
    cursor: &mut FactorCursor,
    bucket_count: usize,
) -> ResizePlan {
    let (to, factor) = match strategy {
        ResizeStrategy::Total => (bucket_count * 2, None),
        ResizeStrategy::Partial => {
            let factor = cursor.advance();
            let grown = factor.scale_up(bucket_count).max(bucket_count + 2);
            (round_up_even(grown), Some(factor))
        }
    };
    ResizePlan {
        direction: ResizeDirection::Expand,
        strategy,
        from: bucket_count,
        to,
        factor,
    }
}

/// Plan a reduction from `bucket_count` buckets. Never goes below
/// [`MIN_BUCKETS`].
///
/// Partial reduction steps `cursor` back before reading the factor.
pub fn plan_reduction(
    strategy: ResizeStrategy,
    cursor: &mut FactorCursor,
    bucket_count: usize,
) -> ResizePlan {
    let (to, factor) = match strategy {
        ResizeStrategy::Total => (round_down_even(bucket_count / 2), None),
        ResizeStrategy::Partial => {
            let factor = cursor.retreat();
            (round_down_even(factor.scale_down(bucket_count)), Some(factor))
        }
    };
    ResizePlan {
        direction: ResizeDirection::Reduce,
        strategy,
        from: bucket_count,
        to,
        factor,
    }
}

#[inline]
fn round_up_even(n: usize) -> usize {
    n + n % 2
}

#[inline]
fn round_down_even(n: usize) -> usize {
    (n - n % 2).max(MIN_BUCKETS)
}

/// Replacement bucket array and overflow table.
#[derive(Clone, Debug)]
pub struct Redistribution {
    pub buckets: Vec<Bucket>,
    pub overflow: OverflowTable,
    pub rehashed: usize,
}

/// Rehash every key in `buckets` and `overflow` into `new_count` empty buckets.
///
/// Bucket keys are visited first (bucket order, then slot order), then
/// overflow entries in arrival order. Keys that find their new bucket full go
/// to the new overflow table.
pub fn redistribute(
    buckets: &[Bucket],
    overflow: &OverflowTable,
    new_count: usize,
    bucket_capacity: usize,
    hash: HashKind,
    key_digits: u32,
) -> Redistribution {
    let live: Vec<Key> = buckets
        .iter()
        .flat_map(Bucket::keys)
        .chain(overflow.iter().map(|e| e.key))
        .collect();

    let mut new_buckets: Vec<Bucket> = (0..new_count).map(|_| Bucket::new(bucket_capacity)).collect();
    let mut new_overflow = OverflowTable::new();
    for &key in &live {
        let target = hash.hash(key, new_count, key_digits).bucket;
        if new_buckets[target].insert(key).is_none() {
            new_overflow.push(key, target);
        }
    }

    Redistribution {
        buckets: new_buckets,
        overflow: new_overflow,
        rehashed: live.len(),
    }
}
