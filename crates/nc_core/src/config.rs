use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_K_MIN: usize = 2;
pub const DEFAULT_K_MAX: usize = 20;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// Closed interval of candidate cluster counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KRange {
    pub min: usize,
    pub max: usize,
}

impl KRange {
    pub fn new(min: usize, max: usize) -> Result<Self> {
        if min == 0 {
            return Err(Error::InvalidInput("k range must start at 1 or above".to_string()));
        }
        if min > max {
            return Err(Error::InvalidInput(format!("empty k range [{}, {}]", min, max)));
        }
        Ok(Self { min, max })
    }

    /// Shrink the range so that `2 <= k <= n - 1`. Returns `None` when `n` is
    /// too small to cluster at all.
    pub fn clip_to(&self, n: usize) -> Option<KRange> {
        if n <= 2 {
            return None;
        }
        let max = self.max.min(n - 1).max(2);
        let min = self.min.max(2).min(max);
        Some(KRange { min, max })
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }

    pub fn contains(&self, k: usize) -> bool {
        self.iter().contains(&k)
    }

    pub fn len(&self) -> usize {
        self.max - self.min + 1
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn clamp(&self, k: usize) -> usize {
        k.clamp(self.min, self.max)
    }
}

impl Default for KRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_K_MIN,
            max: DEFAULT_K_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub k_range: KRange,
    pub seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Number of seeded restarts per k; the lowest inertia wins.
    pub n_init: usize,
    /// Expected embedding dimension. Inferred from the first usable row when unset.
    pub embedding_dim: Option<usize>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k_range: KRange::default(),
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            n_init: 1,
            embedding_dim: None,
        }
    }
}

impl ClusterConfig {
    pub fn with_k_range(mut self, k_range: KRange) -> Self {
        self.k_range = k_range;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = Some(dim);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub cluster: ClusterConfig,
    /// Upper bound on generation requests in flight at once.
    pub max_concurrency: usize,
    pub deadline: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline: Some(DEFAULT_DEADLINE),
        }
    }
}
