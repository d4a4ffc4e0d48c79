//! On-disk naming of log files.
//!
//! ```text
//! <base>/<process>/<category>_<YYYY-MM-DD>.log       part 1
//! <base>/<process>/<YYYY-MM-DD>.log                  part 1, empty category
//! <base>/<process>/<category>_<YYYY-MM-DD>.<N>.log   part N >= 2
//! ```

use std::path::{Path, PathBuf};

use super::RoutingKey;

pub const LOG_EXTENSION: &str = "log";

/// Directory holding every file of `process`.
pub fn process_dir(base_dir: &Path, process: &str) -> PathBuf {
    base_dir.join(process)
}

/// File name stem shared by all parts of a key, without part suffix or extension.
pub fn base_stem(key: &RoutingKey) -> String {
    let date = key.date().format("%Y-%m-%d");
    if key.category().is_empty() {
        date.to_string()
    } else {
        format!("{}_{}", key.category(), date)
    }
}

/// File name of `part` (1-based) for `key`.
pub fn file_name(key: &RoutingKey, part: u32) -> String {
    let stem = base_stem(key);
    if part <= 1 {
        format!("{}.{}", stem, LOG_EXTENSION)
    } else {
        format!("{}.{}.{}", stem, part, LOG_EXTENSION)
    }
}

/// Full path of `part` for `key` under `base_dir`.
pub fn part_path(base_dir: &Path, key: &RoutingKey, part: u32) -> PathBuf {
    process_dir(base_dir, key.process()).join(file_name(key, part))
}
