//! Appender trait for log output destinations
//!
//! Appenders take `&self` and serialize writes internally: the appender's own
//! lock is the only point where concurrent lines are ordered.

use super::error::Result;

pub trait Appender: Send + Sync {
    /// Write one complete, newline-terminated line.
    fn append(&self, line: &str) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
