//! Per-module logger handles

use super::{
    channel::Channel,
    error::{LoggerError, Result},
    line::format_line,
    sampling::{AdaptiveSampler, SamplerMetrics, SamplingConfig},
    sink::SinkManager,
};
use chrono::Local;
use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Maximum module name length in bytes
pub const MAX_MODULE_LEN: usize = 50;

/// A leveled logger bound to one module name.
///
/// Handles are cheap and independent: each has its own threshold and its own
/// adaptive-sampling counter, and all of them write through the same
/// [`SinkManager`]. Share one between threads with `Arc`.
///
/// # Example
///
/// ```
/// use lll_logger::{LoggerHandle, MemoryBuffer, SinkManager};
/// use std::sync::Arc;
///
/// let buffer = MemoryBuffer::new();
/// let manager = Arc::new(SinkManager::default());
/// manager.override_sink(buffer.clone());
///
/// let log = LoggerHandle::builder("conn")
///     .level("state")
///     .manager(manager)
///     .build()
///     .unwrap();
///
/// log.log_state("accepted");
/// log.log_network("dropped: below threshold");
///
/// let lines = buffer.lines();
/// assert_eq!(lines.len(), 1);
/// assert!(lines[0].ends_with(" conn accepted"));
/// ```
pub struct LoggerHandle {
    module: String,
    threshold: AtomicU8,
    sampler: AdaptiveSampler,
    manager: Arc<SinkManager>,
}

impl LoggerHandle {
    /// Create a handle on the process-wide sink.
    ///
    /// # Panics
    ///
    /// Panics if the module name is longer than [`MAX_MODULE_LEN`] or the
    /// sink cannot be initialized
    pub fn create(module: &str, level: &str) -> Self {
        match Self::try_create(module, level) {
            Ok(handle) => handle,
            Err(e) => panic!("Cannot create logger '{}': {}", module, e),
        }
    }

    /// Create a handle on the process-wide sink.
    ///
    /// # Errors
    ///
    /// Returns error if the module name is longer than [`MAX_MODULE_LEN`] or
    /// the sink cannot be initialized
    pub fn try_create(module: &str, level: &str) -> Result<Self> {
        Self::builder(module).level(level).build()
    }

    #[must_use]
    pub fn builder(module: impl Into<String>) -> HandleBuilder {
        HandleBuilder::new(module)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// Set the threshold from a level name.
    ///
    /// `"network"`, `"state"` and `"none"` select those thresholds; any other
    /// name selects `Always`.
    pub fn set_threshold(&self, level: &str) {
        self.set_channel_threshold(Channel::from_level_name(level));
    }

    pub fn set_channel_threshold(&self, threshold: Channel) {
        self.threshold.store(threshold.ordinal(), Ordering::Relaxed);
    }

    #[inline]
    pub fn threshold(&self) -> Channel {
        Channel::from_ordinal(self.threshold.load(Ordering::Relaxed))
    }

    /// Whether a line on `channel` would currently pass the threshold
    #[inline]
    pub fn enabled(&self, channel: Channel) -> bool {
        self.threshold().permits(channel)
    }

    /// Network traffic, the most voluminous channel
    pub fn log_network(&self, message: impl Display) {
        if self.enabled(Channel::Network) {
            self.emit(&message);
        }
    }

    /// Connection state: reads and writes (but not what), accept, close
    pub fn log_state(&self, message: impl Display) {
        if self.enabled(Channel::State) {
            self.emit(&message);
        }
    }

    /// Listens, serious errors
    pub fn log_always(&self, message: impl Display) {
        if self.enabled(Channel::Always) {
            self.emit(&message);
        }
    }

    /// High-volume call sites: gated like `log_always`, then sampled.
    pub fn log_adaptive(&self, message: impl Display) {
        if self.enabled(Channel::Always) && self.sampler.admit() {
            self.emit(&message);
        }
    }

    /// Adaptive calls counted so far
    pub fn adaptive_count(&self) -> u64 {
        self.sampler.count()
    }

    pub fn sampler_metrics(&self) -> &SamplerMetrics {
        self.sampler.metrics()
    }

    pub fn manager(&self) -> &Arc<SinkManager> {
        &self.manager
    }

    fn emit(&self, message: &dyn Display) {
        let line = format_line(&Local::now(), &self.module, message);
        self.manager.write_line(&line);
    }
}

impl std::fmt::Debug for LoggerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerHandle")
            .field("module", &self.module)
            .field("threshold", &self.threshold())
            .field("sampler", &self.sampler)
            .finish()
    }
}

/// Builder for [`LoggerHandle`]
///
/// Defaults to the process-wide manager, the `Always` threshold and the
/// default sampling configuration.
pub struct HandleBuilder {
    module: String,
    threshold: Channel,
    sampling: SamplingConfig,
    manager: Option<Arc<SinkManager>>,
}

impl HandleBuilder {
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            threshold: Channel::Always,
            sampling: SamplingConfig::default(),
            manager: None,
        }
    }

    /// Initial threshold from a level name, mapped like `set_threshold`
    #[must_use]
    pub fn level(mut self, level: &str) -> Self {
        self.threshold = Channel::from_level_name(level);
        self
    }

    #[must_use]
    pub fn threshold(mut self, threshold: Channel) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn sampling(mut self, config: SamplingConfig) -> Self {
        self.sampling = config;
        self
    }

    /// Write through `manager` instead of the process-wide one
    #[must_use]
    pub fn manager(mut self, manager: Arc<SinkManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Initialize the sink if needed and build the handle.
    ///
    /// # Errors
    ///
    /// Returns error if the sink cannot be initialized or the module name is
    /// longer than [`MAX_MODULE_LEN`]
    pub fn build(self) -> Result<LoggerHandle> {
        let manager = self
            .manager
            .unwrap_or_else(|| Arc::clone(SinkManager::global()));
        manager.try_ensure_initialized()?;

        if self.module.len() > MAX_MODULE_LEN {
            return Err(LoggerError::module_name_too_long(self.module, MAX_MODULE_LEN));
        }

        Ok(LoggerHandle {
            module: self.module,
            threshold: AtomicU8::new(self.threshold.ordinal()),
            sampler: AdaptiveSampler::new(self.sampling),
            manager,
        })
    }
}
