//! Adaptive sampling for high-volume call sites
//!
//! Each handle owns one [`AdaptiveSampler`]. For the `n`th accepted call
//! (counting from 1) the sampler emits when:
//!
//! - `n` is a multiple of the heartbeat interval (50,000 by default), or
//! - a uniform draw falls below `1 / ln(1 + n)^2`.
//!
//! Early calls are logged almost always; the probability then decays without
//! ever reaching zero, and the heartbeat keeps a very long-running call site
//! visible. The only state is the monotonic counter, so concurrent callers
//! need nothing beyond one atomic increment and a thread-local draw.
//!
//! # Example
//!
//! ```
//! use lll_logger::{AdaptiveSampler, SamplingConfig};
//!
//! let sampler = AdaptiveSampler::new(SamplingConfig::default());
//!
//! // The first call always passes: p(1) = 1 / ln(2)^2 > 1
//! assert!(sampler.admit());
//! assert_eq!(sampler.count(), 1);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of calls between guaranteed emissions
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 50_000;

/// Configuration for adaptive sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Every `heartbeat_interval`th call is emitted regardless of the draw.
    ///
    /// Zero disables the heartbeat.
    pub heartbeat_interval: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

impl SamplingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heartbeat interval
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: u64) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

/// Metrics for sampling observability
///
/// Tracks how many lines were sampled vs dropped.
///
/// # Example
///
/// ```
/// use lll_logger::SamplerMetrics;
///
/// let metrics = SamplerMetrics::new();
/// assert_eq!(metrics.sampled_count(), 0);
/// assert_eq!(metrics.dropped_count(), 0);
/// ```
#[derive(Debug)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
        }
    }

    /// Get the number of sampled (logged) entries
    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    /// Get the number of dropped entries
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.sampled_count() + self.dropped_count()
    }

    #[inline]
    pub(crate) fn record_sampled(&self) {
        self.sampled_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the effective sample rate based on actual sampling
    ///
    /// Returns 1.0 if no lines have been processed yet.
    pub fn effective_sample_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            1.0
        } else {
            self.sampled_count() as f64 / total as f64
        }
    }
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Probability that the `n`th call is emitted, ignoring the heartbeat.
///
/// Capped at 1.0; `n = 0` is treated as certain.
pub fn emit_probability(n: u64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let ln = (1.0 + n as f64).ln();
    (1.0 / (ln * ln)).min(1.0)
}

/// Per-handle adaptive sampler
pub struct AdaptiveSampler {
    config: SamplingConfig,
    counter: AtomicU64,
    metrics: SamplerMetrics,
}

impl AdaptiveSampler {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            config,
            counter: AtomicU64::new(0),
            metrics: SamplerMetrics::new(),
        }
    }

    /// Count one call and decide whether it is emitted.
    pub fn admit(&self) -> bool {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let draw = rand::thread_rng().gen::<f64>();
        let emit = Self::decide(self.config.heartbeat_interval, n, draw);

        if emit {
            self.metrics.record_sampled();
        } else {
            self.metrics.record_dropped();
        }
        emit
    }

    /// Pure decision for call number `n` given a uniform draw in `[0, 1)`.
    pub fn decide(heartbeat_interval: u64, n: u64, draw: f64) -> bool {
        if heartbeat_interval != 0 && n % heartbeat_interval == 0 {
            return true;
        }
        draw < emit_probability(n)
    }

    /// Number of calls counted so far
    #[inline]
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }
}

impl std::fmt::Debug for AdaptiveSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveSampler")
            .field("config", &self.config)
            .field("count", &self.count())
            .field("metrics", &self.metrics)
            .finish()
    }
}
