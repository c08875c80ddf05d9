//! Core logger types and traits

pub mod appender;
pub mod channel;
pub mod error;
pub mod handle;
pub mod line;
pub mod sampling;
pub mod sink;

pub use appender::Appender;
pub use channel::Channel;
pub use error::{LoggerError, Result};
pub use handle::{HandleBuilder, LoggerHandle, MAX_MODULE_LEN};
pub use line::{format_line, Joined, LINE_TIMESTAMP_FORMAT};
pub use sampling::{
    emit_probability, AdaptiveSampler, SamplerMetrics, SamplingConfig, DEFAULT_HEARTBEAT_INTERVAL,
};
pub use sink::{SinkConfig, SinkManager, SinkMetrics};
