//! # lll_logger
//!
//! A low-level, channel-gated logger. Handles are bound to a module name and
//! filter on four channels (network, state, always, and the sampled adaptive
//! channel). Every handle in the process writes through one lazily created
//! sink: a date-named rotating file, or an injected stream.
//!
//! ## Features
//!
//! - **Lock-free gating**: a suppressed call is one atomic load and a compare
//! - **Single sink**: created exactly once, even under concurrent first use
//! - **Adaptive sampling**: high-volume call sites throttle themselves with a
//!   decaying probability and a periodic heartbeat
//! - **Rotation**: by date, by size, with age-based cleanup
//!
//! ## Example
//!
//! ```no_run
//! use lll_logger::{log_always, log_state};
//!
//! lll_logger::set_log_path("/tmp");
//! let log = lll_logger::init("server", "state");
//!
//! log_always!(log, "listening on", 8080);
//! log_state!(log, "accepted", "10.0.0.7:51234");
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{
        MemoryBuffer, PathTemplate, RotatingFileAppender, RotationPolicy, StreamAppender,
    };
    pub use crate::core::{
        Appender, Channel, HandleBuilder, LoggerError, LoggerHandle, Result, SamplingConfig,
        SinkConfig, SinkManager, MAX_MODULE_LEN,
    };
    pub use crate::{log_adaptive, log_always, log_network, log_state};
}

pub use crate::appenders::{MemoryBuffer, RotatingFileAppender, RotationPolicy, StreamAppender};
pub use crate::core::{
    emit_probability, format_line, AdaptiveSampler, Appender, Channel, HandleBuilder, Joined,
    LoggerError, LoggerHandle, Result, SamplerMetrics, SamplingConfig, SinkConfig, SinkManager,
    SinkMetrics, DEFAULT_HEARTBEAT_INTERVAL, LINE_TIMESTAMP_FORMAT, MAX_MODULE_LEN,
};

use std::io::Write;
use std::path::Path;

/// Set the process-wide fallback directory for unprivileged processes.
///
/// # Panics
///
/// Panics if any handle has already been created
pub fn set_log_path(path: impl AsRef<Path>) {
    SinkManager::global().configure_fallback_dir(path);
}

/// Send process-wide output to `writer` instead of the rotating file.
///
/// # Panics
///
/// Panics if any handle has already been created
pub fn set_writer<W: Write + Send + 'static>(writer: W) {
    SinkManager::global().override_sink(writer);
}

/// Create a handle on the process-wide sink.
///
/// # Panics
///
/// Panics if the module name is longer than [`MAX_MODULE_LEN`] or the sink
/// cannot be initialized
pub fn init(module: &str, level: &str) -> LoggerHandle {
    LoggerHandle::create(module, level)
}

pub fn set_level(handle: &LoggerHandle, level: &str) {
    handle.set_threshold(level);
}

/// Current threshold ordinal of `handle`
pub fn get_level(handle: &LoggerHandle) -> u8 {
    handle.threshold().ordinal()
}
