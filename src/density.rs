//! Load-factor tracking and resize decisions.
//!
//! Density is the share of bucket slots that hold a key, in percent. Keys
//! waiting in overflow are not counted: they are pressure on the structure,
//! not stored capacity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest bucket count a reduction may produce.
pub const MIN_BUCKETS: usize = 2;

/// How the bucket count changes when a density threshold is crossed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeStrategy {
    /// Double on expansion, halve on reduction.
    #[default]
    Total,
    /// Step through [`EXPANSION_FACTORS`] with a cursor.
    Partial,
}

/// Density thresholds and resize strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Expand when density rises above this percentage.
    pub max_density: u8,
    /// Reduce when density falls below this percentage.
    pub min_density: u8,
    pub strategy: ResizeStrategy,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            max_density: 70,
            min_density: 30,
            strategy: ResizeStrategy::Total,
        }
    }
}

/// A resize factor held as an exact ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Factor {
    num: usize,
    den: usize,
}

impl Factor {
    const fn new(num: usize, den: usize) -> Self {
        Self { num, den }
    }

    /// `floor(n * factor)`.
    #[inline]
    pub fn scale_up(self, n: usize) -> usize {
        n * self.num / self.den
    }

    /// `floor(n / factor)`.
    #[inline]
    pub fn scale_down(self, n: usize) -> usize {
        n * self.den / self.num
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

/// Geometric factor sequence used by [`ResizeStrategy::Partial`].
pub const EXPANSION_FACTORS: [Factor; 8] = [
    Factor::new(1, 1),
    Factor::new(3, 2),
    Factor::new(2, 1),
    Factor::new(3, 1),
    Factor::new(4, 1),
    Factor::new(6, 1),
    Factor::new(8, 1),
    Factor::new(12, 1),
];

/// Position in [`EXPANSION_FACTORS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FactorCursor {
    index: usize,
}

impl FactorCursor {
    #[inline]
    pub fn index(self) -> usize {
        self.index
    }

    #[inline]
    pub fn factor(self) -> Factor {
        EXPANSION_FACTORS[self.index]
    }

    /// Step forward, wrapping to the first factor after the last.
    pub fn advance(&mut self) -> Factor {
        self.index = (self.index + 1) % EXPANSION_FACTORS.len();
        self.factor()
    }

    /// Step back, stopping at the first factor.
    pub fn retreat(&mut self) -> Factor {
        self.index = self.index.saturating_sub(1);
        self.factor()
    }
}

/// What the controller wants done after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DensityDecision {
    Hold,
    Expand,
    Reduce,
    /// Density is below the minimum but the structure is already at
    /// [`MIN_BUCKETS`].
    ReductionFloor,
}

/// `100 * occupied / (bucket_count * bucket_capacity)`.
pub fn load_percent(occupied: usize, bucket_count: usize, bucket_capacity: usize) -> f64 {
    let total = bucket_count * bucket_capacity;
    if total == 0 {
        return 0.0;
    }
    occupied as f64 * 100.0 / total as f64
}

/// Threshold checks plus the partial-resize cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityController {
    config: DensityConfig,
    cursor: FactorCursor,
}

impl DensityController {
    pub fn new(config: DensityConfig) -> Self {
        Self {
            config,
            cursor: FactorCursor::default(),
        }
    }

    #[inline]
    pub fn config(&self) -> DensityConfig {
        self.config
    }

    #[inline]
    pub fn strategy(&self) -> ResizeStrategy {
        self.config.strategy
    }

    #[inline]
    pub fn cursor(&self) -> FactorCursor {
        self.cursor
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut FactorCursor {
        &mut self.cursor
    }

    pub fn after_insert(&self, density: f64) -> DensityDecision {
        if density > self.config.max_density as f64 {
            DensityDecision::Expand
        } else {
            DensityDecision::Hold
        }
    }

    pub fn after_delete(&self, density: f64, bucket_count: usize) -> DensityDecision {
        if density >= self.config.min_density as f64 {
            DensityDecision::Hold
        } else if bucket_count > MIN_BUCKETS {
            DensityDecision::Reduce
        } else {
            DensityDecision::ReductionFloor
        }
    }
}
