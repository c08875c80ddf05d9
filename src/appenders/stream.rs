//! Appender over an injected byte stream

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Writes lines to any `io::Write`, one `write_all` per line.
///
/// Used when a host program overrides the default rotating file, for example
/// to hand lines to an already-configured pipeline or to capture them in
/// tests.
pub struct StreamAppender {
    name: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StreamAppender {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::with_name("StreamAppender", writer)
    }

    pub fn with_name<W: Write + Send + 'static>(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Appender writing to the process's standard error
    ///
    /// ```
    /// use lll_logger::{LoggerHandle, SinkManager, StreamAppender};
    /// use std::sync::Arc;
    ///
    /// let manager = Arc::new(SinkManager::with_appender(Box::new(StreamAppender::stderr())));
    /// let log = LoggerHandle::builder("cli").manager(manager).build().unwrap();
    /// log.log_always("written to stderr");
    /// ```
    pub fn stderr() -> Self {
        Self::with_name("stderr", io::stderr())
    }
}

impl Appender for StreamAppender {
    fn append(&self, line: &str) -> Result<()> {
        self.writer
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::writer(format!("{}: {}", self.name, e)))
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::writer(format!("{}: {}", self.name, e)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Cloneable in-memory byte buffer.
///
/// Every clone shares the same storage, so one clone can be handed to a
/// [`StreamAppender`] while another is kept to read back what was written.
///
/// ```
/// use lll_logger::MemoryBuffer;
/// use std::io::Write;
///
/// let buffer = MemoryBuffer::new();
/// let mut writer = buffer.clone();
/// writer.write_all(b"one\ntwo\n").unwrap();
/// assert_eq!(buffer.lines(), vec!["one", "two"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
