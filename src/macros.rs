//! Variadic logging macros.
//!
//! Each macro takes a handle followed by any number of `Display` values,
//! which are joined with single spaces. Arguments are only formatted when the
//! channel passes the handle's threshold.
//!
//! # Examples
//!
//! ```
//! use lll_logger::{log_always, log_network, LoggerHandle, MemoryBuffer, SinkManager};
//! use std::sync::Arc;
//!
//! let buffer = MemoryBuffer::new();
//! let manager = Arc::new(SinkManager::default());
//! manager.override_sink(buffer.clone());
//! let log = LoggerHandle::builder("srv").manager(manager).build().unwrap();
//!
//! let port = 8080;
//! log_always!(log, "listening on", port);
//! log_network!(log, "not emitted at the default threshold");
//!
//! assert!(buffer.lines()[0].ends_with(" srv listening on 8080"));
//! assert_eq!(buffer.lines().len(), 1);
//! ```

/// Log on the network channel.
#[macro_export]
macro_rules! log_network {
    ($handle:expr, $($arg:expr),+ $(,)?) => {
        $handle.log_network($crate::Joined(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log on the state channel.
#[macro_export]
macro_rules! log_state {
    ($handle:expr, $($arg:expr),+ $(,)?) => {
        $handle.log_state($crate::Joined(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log on the always channel.
#[macro_export]
macro_rules! log_always {
    ($handle:expr, $($arg:expr),+ $(,)?) => {
        $handle.log_always($crate::Joined(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}

/// Log on the adaptive (sampled) channel.
///
/// ```
/// # use lll_logger::{log_adaptive, LoggerHandle, SinkManager};
/// # use std::sync::Arc;
/// # let manager = Arc::new(SinkManager::default());
/// # manager.override_sink(std::io::sink());
/// # let log = LoggerHandle::builder("pkt").manager(manager).build().unwrap();
/// for seq in 0..1_000 {
///     log_adaptive!(log, "packet", seq);
/// }
/// assert_eq!(log.adaptive_count(), 1_000);
/// ```
#[macro_export]
macro_rules! log_adaptive {
    ($handle:expr, $($arg:expr),+ $(,)?) => {
        $handle.log_adaptive($crate::Joined(&[$(&$arg as &dyn ::std::fmt::Display),+]))
    };
}
