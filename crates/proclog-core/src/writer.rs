//! Process log writer.
//!
//! [`ProcessLogger`] filters by level, routes each event to
//! `<base>/<process>/<category>_<date>[.<part>].log`, and appends one encoded
//! line per event.
//!
//! ## Locking
//!
//! The level check is the only step done outside the lock. Resolving the
//! routing key, rotating, the append itself, and the size update all happen
//! under one mutex, so the tracked size of a part always equals the bytes
//! appended to it and a line is never split across parts.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::config::LoggerConfig;
use crate::encoder::{details_from, encode};
use crate::error::LogResult;
use crate::fatal::{ExitProcess, FatalHandler};
use crate::level::{LogFormat, LogLevel};
use crate::registry::{create_dir, FileRegistry, RoutingKey};

/// Process name used by the shorthand methods (`info`, `warn`, ...).
pub const GENERAL_PROCESS: &str = "general";

/// State guarded by the writer's single lock.
struct WriterState {
    registry: FileRegistry,
    format: LogFormat,
    max_file_size: u64,
}

/// Structured log writer with per-process, per-category, per-day files.
///
/// # Example
///
/// ```ignore
/// let logger = ProcessLogger::new(LoggerConfig::new("./logs").with_max_file_size(10 << 20))?;
///
/// logger.info_process("scheduler", "jobs", "start", "Nightly run started", None)?;
/// logger.log_with(
///     LogLevel::Warn,
///     "scheduler",
///     "jobs",
///     "retry",
///     "Backup retried",
///     &serde_json::json!({"attempt": 2}),
/// )?;
///
/// logger.close()?;
/// ```
pub struct ProcessLogger {
    base_dir: PathBuf,
    min_level: AtomicU8,
    state: Mutex<WriterState>,
    clock: Arc<dyn Clock>,
    fatal: Arc<dyn FatalHandler>,
}

impl ProcessLogger {
    /// Create a logger, creating the base directory if it is missing.
    pub fn new(config: LoggerConfig) -> LogResult<Self> {
        create_dir(&config.base_dir)?;

        Ok(Self {
            base_dir: config.base_dir.clone(),
            min_level: AtomicU8::new(config.min_level.to_u8()),
            state: Mutex::new(WriterState {
                registry: FileRegistry::new(config.base_dir),
                format: config.format,
                max_file_size: config.max_file_size,
            }),
            clock: Arc::new(SystemClock::new(config.timezone)),
            fatal: Arc::new(ExitProcess),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace what happens after a FATAL event is written.
    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal = handler;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.to_u8(), Ordering::Relaxed);
    }

    pub fn format(&self) -> LogFormat {
        self.state.lock().format
    }

    /// Change the encoding for subsequent lines.
    pub fn set_format(&self, format: LogFormat) {
        self.state.lock().format = format;
    }

    pub fn max_file_size(&self) -> u64 {
        self.state.lock().max_file_size
    }

    /// Change the rotation threshold (0 disables rotation). Open parts are
    /// checked against the new value on their next write.
    pub fn set_max_file_size(&self, bytes: u64) {
        self.state.lock().max_file_size = bytes;
    }

    /// Number of files currently held open.
    pub fn open_files(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// File the next event for (`process`, `category`) would be appended to
    /// today. Nothing is created or opened.
    pub fn active_path(&self, process: &str, category: &str) -> LogResult<PathBuf> {
        let key = RoutingKey::new(process, category, self.clock.now().date_naive());
        let state = self.state.lock();
        state.registry.peek_path(&key, state.max_file_size)
    }

    /// Write one event.
    ///
    /// Events below the minimum level return `Ok(())` without touching the
    /// disk. FATAL events are mirrored and termination is requested even when
    /// the write fails.
    pub fn log_to_process(
        &self,
        level: LogLevel,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        if level < self.min_level() {
            return Ok(());
        }

        let now = self.clock.now();
        let key = RoutingKey::new(process, category, now.date_naive());

        let (line, result) = {
            let mut state = self.state.lock();
            let line = encode(&now, level, process, action, message, details, state.format);
            let threshold = state.max_file_size;
            let result = state.registry.append(&key, &line, threshold);
            (line, result)
        };

        if level.is_terminal() {
            self.fatal.mirror(&line);
            self.fatal.terminate();
        }
        result
    }

    /// Write one event with any serializable details.
    pub fn log_with<T: Serialize + Debug + ?Sized>(
        &self,
        level: LogLevel,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: &T,
    ) -> LogResult<()> {
        let details = details_from(details);
        self.log_to_process(level, process, category, action, message, Some(&details))
    }

    pub fn debug_process(
        &self,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.log_to_process(LogLevel::Debug, process, category, action, message, details)
    }

    pub fn info_process(
        &self,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.log_to_process(LogLevel::Info, process, category, action, message, details)
    }

    pub fn warn_process(
        &self,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.log_to_process(LogLevel::Warn, process, category, action, message, details)
    }

    pub fn error_process(
        &self,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.log_to_process(LogLevel::Error, process, category, action, message, details)
    }

    /// Write a FATAL event and request termination.
    ///
    /// With the default handler this never returns.
    pub fn fatal_process(
        &self,
        process: &str,
        category: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.log_to_process(LogLevel::Fatal, process, category, action, message, details)
    }

    /// Log under the `general` process with `source` as category.
    pub fn debug(
        &self,
        source: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.debug_process(GENERAL_PROCESS, source, action, message, details)
    }

    pub fn info(
        &self,
        source: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.info_process(GENERAL_PROCESS, source, action, message, details)
    }

    pub fn warn(
        &self,
        source: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.warn_process(GENERAL_PROCESS, source, action, message, details)
    }

    pub fn error(
        &self,
        source: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.error_process(GENERAL_PROCESS, source, action, message, details)
    }

    pub fn fatal(
        &self,
        source: &str,
        action: &str,
        message: &str,
        details: Option<&Value>,
    ) -> LogResult<()> {
        self.fatal_process(GENERAL_PROCESS, source, action, message, details)
    }

    /// Sync every open file to disk.
    pub fn flush(&self) -> LogResult<()> {
        self.state.lock().registry.sync_all()
    }

    /// Sync and close every open file.
    ///
    /// The logger remains usable; the next write reopens (and resumes) the
    /// file it needs.
    pub fn close(&self) -> LogResult<()> {
        self.state.lock().registry.release_all()
    }
}

impl Debug for ProcessLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessLogger")
            .field("base_dir", &self.base_dir)
            .field("min_level", &self.min_level())
            .finish_non_exhaustive()
    }
}
