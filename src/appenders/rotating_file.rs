//! Rotating file appender
//!
//! Files are named from a date template, `<dir>/<program>.log.<YYYYMMDD>`.
//! A new file starts whenever the formatted date changes. Within one date,
//! reaching the size limit moves writing to a generation file
//! (`<program>.log.<YYYYMMDD>.1`, `.2`, ...), skipping generations that an
//! earlier run already filled. On every rotation, files of the
//! same program older than the maximum age are deleted.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write as _};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default size limit per file (8 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 8 * 1024 * 1024;

/// Default retention for rotated files (168 hours)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(168 * 3600);

/// Default strftime pattern appended to the file prefix
pub const DEFAULT_DATE_PATTERN: &str = "%Y%m%d";

/// Configuration for the rotating file appender
///
/// # Examples
///
/// ```
/// use lll_logger::appenders::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(64 * 1024 * 1024)
///     .with_max_age(Duration::from_secs(24 * 3600));
///
/// assert_eq!(policy.max_bytes, Some(64 * 1024 * 1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationPolicy {
    /// Start a new generation once the current file reaches this size
    pub max_bytes: Option<u64>,
    /// Delete files of the same program older than this
    pub max_age: Option<Duration>,
    /// strftime pattern for the date part of the file name
    pub date_pattern: String,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: Some(DEFAULT_MAX_BYTES),
            max_age: Some(DEFAULT_MAX_AGE),
            date_pattern: DEFAULT_DATE_PATTERN.to_string(),
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum file size
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_bytes = Some(size);
        self
    }

    /// Only rotate when the date changes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn without_size_limit(mut self) -> Self {
        self.max_bytes = None;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    /// Keep rotated files forever
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn without_age_limit(mut self) -> Self {
        self.max_age = None;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_date_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.date_pattern = pattern.into();
        self
    }
}

/// Where rotated files live and how they are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    dir: PathBuf,
    prefix: String,
    date_pattern: String,
}

impl PathTemplate {
    /// Template for `<dir>/<program>.log.<date>`
    pub fn new(
        dir: impl Into<PathBuf>,
        program_name: &str,
        date_pattern: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: format!("{}.log.", program_name),
            date_pattern: date_pattern.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name prefix shared by every file of this program
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Unexpanded template, e.g. `/var/log/server.log.%Y%m%d`
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, self.date_pattern))
    }

    /// File path for the period containing `at`
    pub fn path_for<Tz>(&self, at: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut name = self.prefix.clone();
        // Patterns are validated when the appender is built
        let _ = write!(name, "{}", at.format(&self.date_pattern));
        self.dir.join(name)
    }

    fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_pattern).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "RotatingFileAppender",
                format!("invalid date pattern '{}'", self.date_pattern),
            ));
        }
        Ok(())
    }
}

struct RotationState {
    file: Option<File>,
    /// Dated path of the current period (generation 0)
    base_path: PathBuf,
    current_path: PathBuf,
    generation: u32,
    current_size: u64,
}

/// Rotating file appender with date-templated names
///
/// # Examples
///
/// ```no_run
/// use lll_logger::appenders::{PathTemplate, RotatingFileAppender, RotationPolicy};
///
/// let template = PathTemplate::new("/var/log", "server", "%Y%m%d");
/// let appender = RotatingFileAppender::with_policy(template, RotationPolicy::default()).unwrap();
/// ```
pub struct RotatingFileAppender {
    template: PathTemplate,
    policy: RotationPolicy,
    state: Mutex<RotationState>,
}

impl RotatingFileAppender {
    /// Create an appender with the default policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn new(dir: impl Into<PathBuf>, program_name: &str) -> Result<Self> {
        let template = PathTemplate::new(dir, program_name, DEFAULT_DATE_PATTERN);
        Self::with_policy(template, RotationPolicy::default())
    }

    /// Create an appender with a custom policy
    ///
    /// The template's date pattern is replaced by the policy's.
    ///
    /// # Errors
    ///
    /// Returns error if the date pattern is invalid or the directory or file
    /// cannot be created or opened
    pub fn with_policy(template: PathTemplate, policy: RotationPolicy) -> Result<Self> {
        let template = PathTemplate {
            date_pattern: policy.date_pattern.clone(),
            ..template
        };
        template.validate()?;

        fs::create_dir_all(template.dir()).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", template.dir().display()),
                e,
            )
        })?;

        let now = Local::now();
        let base_path = template.path_for(&now);
        let generation = Self::first_open_generation(&policy, &base_path, 0);
        let current_path = Self::generation_path(&base_path, generation);
        let (file, current_size) = Self::open_target(&current_path)?;

        let appender = Self {
            template,
            policy,
            state: Mutex::new(RotationState {
                file: Some(file),
                current_path: current_path.clone(),
                base_path,
                generation,
                current_size,
            }),
        };
        appender.purge_expired(now.into(), &current_path);
        Ok(appender)
    }

    fn open_target(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_appender(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    fn generation_path(base: &Path, generation: u32) -> PathBuf {
        if generation == 0 {
            return base.to_path_buf();
        }
        let mut path = base.as_os_str().to_os_string();
        path.push(format!(".{}", generation));
        PathBuf::from(path)
    }

    /// First generation at or after `from` whose file is missing or still
    /// below the size limit. Full files left by an earlier run are skipped.
    fn first_open_generation(policy: &RotationPolicy, base: &Path, from: u32) -> u32 {
        let Some(max) = policy.max_bytes else {
            return from;
        };
        let mut generation = from;
        while generation < u32::MAX
            && fs::metadata(Self::generation_path(base, generation)).is_ok_and(|m| m.len() >= max)
        {
            generation += 1;
        }
        generation
    }

    /// Write `line` as if the current time were `now`.
    pub(crate) fn append_at(&self, line: &str, now: DateTime<Local>) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let dated = self.template.path_for(&now);
        let target = if dated != state.base_path {
            let generation = Self::first_open_generation(&self.policy, &dated, 0);
            Some((dated, generation))
        } else if self
            .policy
            .max_bytes
            .is_some_and(|max| state.current_size >= max)
        {
            let next = state.generation.saturating_add(1);
            let generation = Self::first_open_generation(&self.policy, &state.base_path, next);
            Some((state.base_path.clone(), generation))
        } else {
            None
        };

        if let Some((base, generation)) = target {
            if let Err(e) = self.rotate(state, base, generation, now.into()) {
                // Keep writing to the current file rather than losing lines
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if state.file.is_none() {
                    return Err(e);
                }
            }
        }

        let file = state
            .file
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Log file not open"))?;
        file.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                state.current_path.display().to_string(),
                format!("Failed to write log line: {}", e),
            )
        })?;
        state.current_size += line.len() as u64;
        Ok(())
    }

    fn rotate(
        &self,
        state: &mut RotationState,
        base: PathBuf,
        generation: u32,
        now: SystemTime,
    ) -> Result<()> {
        let path = Self::generation_path(&base, generation);

        // Whatever happens, do not retry this rotation on every line
        state.base_path = base;
        state.generation = generation;
        state.current_size = 0;

        let (file, size) = Self::open_target(&path).map_err(|e| {
            LoggerError::file_rotation(path.display().to_string(), e.to_string())
        })?;

        // Old file handle is closed on drop
        state.file = Some(file);
        state.current_size = size;
        self.purge_expired(now, &path);
        state.current_path = path;
        Ok(())
    }

    /// Delete files of this program whose modification time is older than the
    /// maximum age, except `keep`. Failures are reported and otherwise ignored.
    fn purge_expired(&self, now: SystemTime, keep: &Path) {
        let Some(max_age) = self.policy.max_age else {
            return;
        };
        let Some(cutoff) = now.checked_sub(max_age) else {
            return;
        };

        let entries = match fs::read_dir(self.template.dir()) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!(
                    "[LOGGER WARNING] Cannot scan {} for expired logs: {}",
                    self.template.dir().display(),
                    e
                );
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(self.template.prefix()) || entry.path() == keep {
                continue;
            }

            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if !expired {
                continue;
            }

            if let Err(e) = fs::remove_file(entry.path()) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove expired log {}: {}",
                    entry.path().display(),
                    e
                );
            }
        }
    }

    /// Path currently being written
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.state.lock().current_path.clone()
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    /// Size generation within the current date, 0 for the dated file itself
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.state.lock().generation
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "RotatingFileAppender"
    }

    fn append(&self, line: &str) -> Result<()> {
        self.append_at(line, Local::now())
    }

    fn flush(&self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(file) = state.file.as_mut() {
            file.flush().map_err(|e| {
                LoggerError::file_appender(
                    state.current_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::tempdir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_rotation_policy_builder() {
        let policy = RotationPolicy::new()
            .with_max_size(1024)
            .with_max_age(Duration::from_secs(60))
            .with_date_pattern("%Y%m%d%H");

        assert_eq!(policy.max_bytes, Some(1024));
        assert_eq!(policy.max_age, Some(Duration::from_secs(60)));
        assert_eq!(policy.date_pattern, "%Y%m%d%H");

        let policy = policy.without_size_limit().without_age_limit();
        assert_eq!(policy.max_bytes, None);
        assert_eq!(policy.max_age, None);
    }

    #[test]
    fn test_default_policy() {
        let policy = RotationPolicy::default();
        assert_eq!(policy.max_bytes, Some(8 * 1024 * 1024));
        assert_eq!(policy.max_age, Some(Duration::from_secs(168 * 3600)));
        assert_eq!(policy.date_pattern, "%Y%m%d");
    }

    #[test]
    fn test_path_template() {
        let template = PathTemplate::new("/var/log", "server", "%Y%m%d");
        let at = Local.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap();

        assert_eq!(template.prefix(), "server.log.");
        assert_eq!(template.pattern(), PathBuf::from("/var/log/server.log.%Y%m%d"));
        assert_eq!(template.path_for(&at), PathBuf::from("/var/log/server.log.20240131"));
    }

    #[test]
    fn test_invalid_date_pattern_rejected() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "bad", "%Y%");
        let policy = RotationPolicy::new().with_date_pattern("%Y%");

        let result = RotatingFileAppender::with_policy(template, policy);
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_rotating_appender_creation() {
        let dir = tempdir().unwrap();
        let appender = RotatingFileAppender::new(dir.path().join("nested"), "app").unwrap();

        let expected = dir
            .path()
            .join("nested")
            .join(format!("app.log.{}", Local::now().format("%Y%m%d")));
        assert_eq!(appender.path(), expected);
        assert!(expected.exists());
        assert_eq!(appender.current_size(), 0);
        assert_eq!(appender.generation(), 0);
    }

    #[test]
    fn test_append_counts_bytes() {
        let dir = tempdir().unwrap();
        let appender = RotatingFileAppender::new(dir.path(), "count").unwrap();

        appender.append("0123456789\n").unwrap();
        appender.append("abc\n").unwrap();
        appender.flush().unwrap();

        assert_eq!(appender.current_size(), 15);
        assert_eq!(read_lines(&appender.path()), vec!["0123456789", "abc"]);
    }

    #[test]
    fn test_size_rotation_creates_generations() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "size", DEFAULT_DATE_PATTERN);
        let policy = RotationPolicy::new().with_max_size(100);
        let appender = RotatingFileAppender::with_policy(template, policy).unwrap();

        let base = appender.path();
        let now = Local::now();
        for i in 0..20 {
            appender
                .append_at(&format!("line number {:02} padded out\n", i), now)
                .unwrap();
        }

        // 26 bytes per line: four lines reach the limit, the fifth rotates
        assert!(appender.generation() >= 4);
        assert_eq!(read_lines(&base).len(), 4);
        let first_generation = RotatingFileAppender::generation_path(&base, 1);
        assert_eq!(read_lines(&first_generation)[0], "line number 04 padded out");
    }

    #[test]
    fn test_restart_skips_full_generations() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "svc", DEFAULT_DATE_PATTERN);
        let base = template.path_for(&Local::now());

        // Dated file and three generations filled by an earlier run
        let old_line = "x".repeat(200) + "\n";
        for generation in 0..4 {
            let path = RotatingFileAppender::generation_path(&base, generation);
            fs::write(path, &old_line).unwrap();
        }

        let policy = RotationPolicy::new().with_max_size(100);
        let appender = RotatingFileAppender::with_policy(template, policy).unwrap();
        assert_eq!(appender.generation(), 4);

        let now = Local::now();
        for i in 0..4 {
            appender.append_at(&format!("new{}\n", i), now).unwrap();
        }
        appender.flush().unwrap();

        for generation in 0..4 {
            let path = RotatingFileAppender::generation_path(&base, generation);
            assert_eq!(read_lines(&path), vec!["x".repeat(200)]);
        }
        let fourth = RotatingFileAppender::generation_path(&base, 4);
        assert_eq!(read_lines(&fourth), vec!["new0", "new1", "new2", "new3"]);
    }

    #[test]
    fn test_size_rotation_skips_existing_full_file() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "skip", DEFAULT_DATE_PATTERN);
        let policy = RotationPolicy::new().with_max_size(10);
        let appender = RotatingFileAppender::with_policy(template, policy).unwrap();

        let base = appender.path();
        fs::write(RotatingFileAppender::generation_path(&base, 1), "0123456789\n").unwrap();

        let now = Local::now();
        appender.append_at("first line\n", now).unwrap();
        appender.append_at("second\n", now).unwrap();

        assert_eq!(appender.generation(), 2);
        assert_eq!(
            read_lines(&RotatingFileAppender::generation_path(&base, 1)),
            vec!["0123456789"]
        );
        assert_eq!(
            read_lines(&RotatingFileAppender::generation_path(&base, 2)),
            vec!["second"]
        );
    }

    #[test]
    fn test_date_change_starts_new_file() {
        let dir = tempdir().unwrap();
        let template = PathTemplate::new(dir.path(), "daily", DEFAULT_DATE_PATTERN);
        let appender = RotatingFileAppender::with_policy(template.clone(), RotationPolicy::new())
            .unwrap();

        let today = Local::now();
        let tomorrow = today + ChronoDuration::days(1);

        appender.append_at("today\n", today).unwrap();
        appender.append_at("tomorrow\n", tomorrow).unwrap();

        assert_eq!(read_lines(&template.path_for(&today)), vec!["today"]);
        assert_eq!(read_lines(&template.path_for(&tomorrow)), vec!["tomorrow"]);
        assert_eq!(appender.path(), template.path_for(&tomorrow));
        assert_eq!(appender.generation(), 0);
    }

    #[test]
    fn test_expired_files_purged() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("purge.log.20000101");
        let unrelated = dir.path().join("other.log.20000101");
        for path in [&stale, &unrelated] {
            let file = File::create(path).unwrap();
            file.set_modified(SystemTime::now() - Duration::from_secs(200 * 3600))
                .unwrap();
        }

        let appender = RotatingFileAppender::new(dir.path(), "purge").unwrap();

        assert!(!stale.exists());
        assert!(unrelated.exists());
        assert!(appender.path().exists());
    }

    #[test]
    fn test_no_purge_without_age_limit() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("keep.log.20000101");
        let file = File::create(&stale).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(200 * 3600))
            .unwrap();

        let template = PathTemplate::new(dir.path(), "keep", DEFAULT_DATE_PATTERN);
        let policy = RotationPolicy::new().without_age_limit();
        let _appender = RotatingFileAppender::with_policy(template, policy).unwrap();

        assert!(stale.exists());
    }
}
