//! Process Log Core Library
//!
//! Structured log writer that appends events to per-process, per-category,
//! date-partitioned files, with optional size-based rotation.
//!
//! ## Layout
//!
//! ```text
//! logs/
//! ├── scheduler/
//! │   ├── 2024-01-15.log            # events with an empty category
//! │   ├── jobs_2024-01-15.log       # part 1
//! │   └── jobs_2024-01-15.2.log     # part 2, after rotation
//! └── general/
//!     └── db_2024-01-15.log
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use proclog_core::{LogFormat, LoggerConfig, ProcessLogger};
//!
//! let logger = ProcessLogger::new(
//!     LoggerConfig::new("./logs")
//!         .with_format(LogFormat::Text)
//!         .with_max_file_size(10 * 1024 * 1024),
//! )?;
//!
//! logger.info_process("scheduler", "jobs", "start", "Nightly run started", None)?;
//! logger.close()?;
//! ```
//!
//! ## Querying logs with jq
//!
//! ```bash
//! # All errors of one process
//! jq 'select(.level == "ERROR")' logs/scheduler/*.log
//! ```

pub mod clock;
pub mod config;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod fatal;
pub mod global;
pub mod layer;
pub mod level;
pub mod registry;
pub mod writer;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock, TimeZoneMode};
pub use config::LoggerConfig;
pub use encoder::{details_from, encode, format_details, format_timestamp};
pub use entry::LogEntry;
pub use error::{LogError, LogResult};
pub use fatal::{ExitProcess, FatalHandler};
pub use global::{default_logger, init_default, init_default_with, shutdown_default};
pub use layer::ProcessLogLayer;
pub use level::{LogFormat, LogLevel};
pub use registry::{FileEntry, FileRegistry, RoutingKey};
pub use writer::{ProcessLogger, GENERAL_PROCESS};
