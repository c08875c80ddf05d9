//! Process-wide sink management
//!
//! A [`SinkManager`] owns the single output every handle writes through. The
//! sink is created lazily, exactly once: the first caller of
//! [`SinkManager::ensure_initialized`] claims the work with a compare-and-swap
//! and builds it, every other caller returns immediately. Lines written while
//! the winner is still building are dropped and counted.
//!
//! Configuration (fallback directory, sink override) is only accepted before
//! that claim. Afterwards the manager is committed and any change is an error.

use super::appender::Appender;
use super::error::{LoggerError, Result};
use crate::appenders::rotating_file::{PathTemplate, RotatingFileAppender, RotationPolicy};
use crate::appenders::stream::StreamAppender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

const UNINITIALIZED: u8 = 0;
const CLAIMED: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

/// Alert on the first write failure and every this many thereafter
const FAILURE_ALERT_INTERVAL: u64 = 1000;

/// Where and how the default rotating sink is created
///
/// # Examples
///
/// ```
/// use lll_logger::SinkConfig;
///
/// let config = SinkConfig::new()
///     .with_fallback_dir("/tmp/logs")
///     .with_program_name("server")
///     .with_privileged(false);
///
/// let template = config.log_template().unwrap();
/// assert_eq!(template.pattern().to_str(), Some("/tmp/logs/server.log.%Y%m%d"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Directory for unprivileged processes
    pub fallback_dir: PathBuf,
    /// Directory for privileged processes
    pub system_log_dir: PathBuf,
    /// Executable name used in file names; resolved from the running binary
    /// when absent
    pub program_name: Option<String>,
    /// Whether the process is privileged; resolved from the effective uid
    /// when absent
    pub privileged: Option<bool>,
    pub rotation: RotationPolicy,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            fallback_dir: PathBuf::from("."),
            system_log_dir: PathBuf::from("/var/log"),
            program_name: None,
            privileged: None,
            rotation: RotationPolicy::default(),
        }
    }
}

impl SinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_fallback_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_system_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_log_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = Some(privileged);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, policy: RotationPolicy) -> Self {
        self.rotation = policy;
        self
    }

    /// Resolve the file template, looking up the executable name and the
    /// privilege level when they were not injected.
    ///
    /// # Errors
    ///
    /// Returns error if the executable or user identity cannot be resolved
    pub fn log_template(&self) -> Result<PathTemplate> {
        let program = match &self.program_name {
            Some(name) => name.clone(),
            None => current_program_name()?,
        };
        let privileged = match self.privileged {
            Some(privileged) => privileged,
            None => running_privileged()?,
        };

        let dir = if privileged {
            &self.system_log_dir
        } else {
            &self.fallback_dir
        };
        Ok(PathTemplate::new(dir, &program, self.rotation.date_pattern.clone()))
    }
}

fn current_program_name() -> Result<String> {
    let exe = std::env::current_exe()
        .map_err(|e| LoggerError::ExecutableIdentity(e.to_string()))?;
    exe.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            LoggerError::ExecutableIdentity(format!("no file name in '{}'", exe.display()))
        })
}

#[cfg(unix)]
fn running_privileged() -> Result<bool> {
    Ok(rustix::process::geteuid().is_root())
}

#[cfg(not(unix))]
fn running_privileged() -> Result<bool> {
    Err(LoggerError::UserIdentity(
        "privilege detection is unsupported on this platform; set SinkConfig::privileged".into(),
    ))
}

/// Sink health counters
#[derive(Debug, Default)]
pub struct SinkMetrics {
    lines_written: AtomicU64,
    failed_writes: AtomicU64,
    lost_before_init: AtomicU64,
    sinks_opened: AtomicU64,
}

impl SinkMetrics {
    #[inline]
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    /// Lines the sink failed to write
    #[inline]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Lines dropped because the sink was not yet published
    #[inline]
    pub fn lost_before_init(&self) -> u64 {
        self.lost_before_init.load(Ordering::Relaxed)
    }

    /// Number of sinks constructed; never more than one
    #[inline]
    pub fn sinks_opened(&self) -> u64 {
        self.sinks_opened.load(Ordering::Relaxed)
    }
}

/// Owner of the single shared output
pub struct SinkManager {
    state: AtomicU8,
    config: Mutex<SinkConfig>,
    pending_override: Mutex<Option<Box<dyn Appender>>>,
    sink: OnceLock<Box<dyn Appender>>,
    metrics: SinkMetrics,
}

static GLOBAL: OnceLock<Arc<SinkManager>> = OnceLock::new();

impl SinkManager {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
            config: Mutex::new(config),
            pending_override: Mutex::new(None),
            sink: OnceLock::new(),
            metrics: SinkMetrics::default(),
        }
    }

    /// Manager that writes to `appender` once initialized
    pub fn with_appender(appender: Box<dyn Appender>) -> Self {
        let manager = Self::new(SinkConfig::default());
        *manager.pending_override.lock() = Some(appender);
        manager
    }

    /// The process-wide manager, created with the default configuration
    pub fn global() -> &'static Arc<SinkManager> {
        GLOBAL.get_or_init(|| Arc::new(SinkManager::new(SinkConfig::default())))
    }

    /// Whether initialization has been claimed; configuration is frozen
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) != UNINITIALIZED
    }

    /// Set the directory used for unprivileged rotation targets.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` once the sink has been committed
    pub fn try_configure_fallback_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        // Checked under the config lock so a racing initializer either sees
        // the new value or this call fails
        let mut config = self.config.lock();
        if self.is_initialized() {
            return Err(LoggerError::already_initialized("fallback directory"));
        }
        config.fallback_dir = dir.as_ref().to_path_buf();
        Ok(())
    }

    /// Set the directory used for unprivileged rotation targets.
    ///
    /// # Panics
    ///
    /// Panics if the sink is already initialized
    pub fn configure_fallback_dir(&self, dir: impl AsRef<Path>) {
        if let Err(e) = self.try_configure_fallback_dir(dir) {
            panic!("{}", e);
        }
    }

    /// Replace the whole configuration before first use.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` once the sink has been committed
    pub fn try_configure(&self, new_config: SinkConfig) -> Result<()> {
        let mut config = self.config.lock();
        if self.is_initialized() {
            return Err(LoggerError::already_initialized("sink configuration"));
        }
        *config = new_config;
        Ok(())
    }

    /// Register an appender to use instead of the rotating file.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` once the sink has been committed
    pub fn try_override_appender(&self, appender: Box<dyn Appender>) -> Result<()> {
        let mut pending = self.pending_override.lock();
        if self.is_initialized() {
            return Err(LoggerError::already_initialized("sink"));
        }
        *pending = Some(appender);
        Ok(())
    }

    /// Register a stream to use instead of the rotating file.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` once the sink has been committed
    pub fn try_override_sink<W: Write + Send + 'static>(&self, writer: W) -> Result<()> {
        self.try_override_appender(Box::new(StreamAppender::new(writer)))
    }

    /// Register a stream to use instead of the rotating file.
    ///
    /// # Panics
    ///
    /// Panics if the sink is already initialized
    pub fn override_sink<W: Write + Send + 'static>(&self, writer: W) {
        if let Err(e) = self.try_override_sink(writer) {
            panic!("{}", e);
        }
    }

    /// Build the sink if nobody has claimed it yet.
    ///
    /// Only the claiming call can fail; later calls return `Ok(())` at once,
    /// even if the claiming call failed.
    ///
    /// # Errors
    ///
    /// Returns error if the executable or user identity cannot be resolved, or
    /// the rotating file cannot be opened
    pub fn try_ensure_initialized(&self) -> Result<()> {
        if self
            .state
            .compare_exchange(UNINITIALIZED, CLAIMED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        match self.build_sink() {
            Ok(sink) => {
                self.metrics.sinks_opened.fetch_add(1, Ordering::Relaxed);
                // Only the claiming thread reaches this point
                let _ = self.sink.set(sink);
                self.state.store(READY, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                self.state.store(FAILED, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Build the sink if nobody has claimed it yet.
    ///
    /// # Panics
    ///
    /// Panics if this call claims initialization and the sink cannot be built;
    /// logging cannot proceed without a writable sink
    pub fn ensure_initialized(&self) {
        if let Err(e) = self.try_ensure_initialized() {
            panic!("Cannot initialize log sink: {}", e);
        }
    }

    fn build_sink(&self) -> Result<Box<dyn Appender>> {
        if let Some(appender) = self.pending_override.lock().take() {
            return Ok(appender);
        }

        let config = self.config.lock().clone();
        let template = config.log_template()?;
        let appender = RotatingFileAppender::with_policy(template, config.rotation)?;
        Ok(Box::new(appender))
    }

    /// Hand one rendered line to the sink.
    ///
    /// Never fails: write errors are counted and reported on stderr.
    pub fn write_line(&self, line: &str) {
        let Some(sink) = self.sink.get() else {
            self.metrics.lost_before_init.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match sink.append(line) {
            Ok(()) => {
                self.metrics.lines_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                let failures = self.metrics.failed_writes.fetch_add(1, Ordering::Relaxed);
                if failures % FAILURE_ALERT_INTERVAL == 0 {
                    eprintln!(
                        "[LOGGER ERROR] {} failed to write ({} failures so far): {}",
                        sink.name(),
                        failures + 1,
                        e
                    );
                }
            }
        }
    }

    /// Flush the sink, if one is established
    ///
    /// # Errors
    ///
    /// Returns the sink's flush error
    pub fn flush(&self) -> Result<()> {
        match self.sink.get() {
            Some(sink) => sink.flush(),
            None => Ok(()),
        }
    }

    /// Name of the established sink
    pub fn sink_name(&self) -> Option<&str> {
        self.sink.get().map(|sink| sink.name())
    }

    pub fn config(&self) -> SinkConfig {
        self.config.lock().clone()
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

impl Default for SinkManager {
    fn default() -> Self {
        Self::new(SinkConfig::default())
    }
}

impl std::fmt::Debug for SinkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkManager")
            .field("initialized", &self.is_initialized())
            .field("sink", &self.sink_name())
            .field("metrics", &self.metrics)
            .finish()
    }
}
