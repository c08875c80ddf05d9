//! Appender implementations

pub mod rotating_file;
pub mod stream;

pub use rotating_file::{PathTemplate, RotatingFileAppender, RotationPolicy};
pub use stream::{MemoryBuffer, StreamAppender};

pub use crate::core::Appender;
