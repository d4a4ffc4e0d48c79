//! Process-wide default logger.
//!
//! Optional convenience for applications that do not want to thread a
//! [`ProcessLogger`] through their call graph. Lifecycle is explicit:
//! [`init_default`] installs the instance once, [`shutdown_default`] closes
//! its files and clears the slot. Library code should prefer taking a
//! `&ProcessLogger` or `Arc<ProcessLogger>`.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::LoggerConfig;
use crate::error::{LogError, LogResult};
use crate::level::LogFormat;
use crate::writer::ProcessLogger;

static DEFAULT: RwLock<Option<Arc<ProcessLogger>>> = parking_lot::const_rwlock(None);

/// Build the default logger from `config`. If one is already installed it
/// is returned unchanged and `config` is ignored.
pub fn init_default(config: LoggerConfig) -> LogResult<Arc<ProcessLogger>> {
    let mut slot = DEFAULT.write();
    if let Some(existing) = slot.as_ref() {
        return Ok(existing.clone());
    }
    let logger = Arc::new(ProcessLogger::new(config)?);
    *slot = Some(logger.clone());
    Ok(logger)
}

/// Install an already-built logger as the default, unless one exists.
pub fn init_default_with(logger: ProcessLogger) -> Arc<ProcessLogger> {
    DEFAULT
        .write()
        .get_or_insert_with(|| Arc::new(logger))
        .clone()
}

/// The installed default logger.
pub fn default_logger() -> LogResult<Arc<ProcessLogger>> {
    DEFAULT.read().clone().ok_or(LogError::NotInitialized)
}

/// Close the default logger's files and uninstall it.
///
/// Does nothing when no default is installed.
pub fn shutdown_default() -> LogResult<()> {
    let logger = DEFAULT.write().take();
    match logger {
        Some(logger) => logger.close(),
        None => Ok(()),
    }
}

pub fn set_format(format: LogFormat) -> LogResult<()> {
    default_logger()?.set_format(format);
    Ok(())
}

pub fn debug_process(
    process: &str,
    category: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> LogResult<()> {
    default_logger()?.debug_process(process, category, action, message, details)
}

pub fn info_process(
    process: &str,
    category: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> LogResult<()> {
    default_logger()?.info_process(process, category, action, message, details)
}

pub fn warn_process(
    process: &str,
    category: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> LogResult<()> {
    default_logger()?.warn_process(process, category, action, message, details)
}

pub fn error_process(
    process: &str,
    category: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> LogResult<()> {
    default_logger()?.error_process(process, category, action, message, details)
}

pub fn fatal_process(
    process: &str,
    category: &str,
    action: &str,
    message: &str,
    details: Option<&Value>,
) -> LogResult<()> {
    default_logger()?.fatal_process(process, category, action, message, details)
}

pub fn debug(source: &str, action: &str, message: &str, details: Option<&Value>) -> LogResult<()> {
    default_logger()?.debug(source, action, message, details)
}

pub fn info(source: &str, action: &str, message: &str, details: Option<&Value>) -> LogResult<()> {
    default_logger()?.info(source, action, message, details)
}

pub fn warn(source: &str, action: &str, message: &str, details: Option<&Value>) -> LogResult<()> {
    default_logger()?.warn(source, action, message, details)
}

pub fn error(source: &str, action: &str, message: &str, details: Option<&Value>) -> LogResult<()> {
    default_logger()?.error(source, action, message, details)
}

pub fn fatal(source: &str, action: &str, message: &str, details: Option<&Value>) -> LogResult<()> {
    default_logger()?.fatal(source, action, message, details)
}
