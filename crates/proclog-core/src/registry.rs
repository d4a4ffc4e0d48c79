//! Registry of open log files.
//!
//! Maps a [`RoutingKey`] to the handle of its active part together with the
//! bytes written to that part and the part number. The registry holds no lock
//! of its own: every method takes `&mut self`, and the owning
//! [`ProcessLogger`](crate::ProcessLogger) keeps it behind a single mutex so
//! lookup, rotation, the append, and the size update happen in one critical
//! section.

pub mod layout;
pub mod rotation;

use std::collections::HashMap;
use std::fs::{DirBuilder, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::error::{LogError, LogResult};
use layout::{part_path, process_dir};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Identity of a file lineage: (process, category, calendar date).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutingKey {
    process: String,
    category: String,
    date: NaiveDate,
}

impl RoutingKey {
    pub fn new(process: impl Into<String>, category: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            process: process.into(),
            category: category.into(),
            date,
        }
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Active part of one routing key.
#[derive(Debug)]
pub struct FileEntry {
    pub(crate) file: File,
    pub(crate) path: PathBuf,
    /// Bytes appended through this entry since the part was opened, plus the
    /// part's length at open time.
    pub(crate) size: u64,
    /// 1-based part number.
    pub(crate) part: u32,
}

impl FileEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn part(&self) -> u32 {
        self.part
    }

    /// Append `line` and credit its length. A failed write credits nothing.
    pub(crate) fn append(&mut self, line: &[u8]) -> LogResult<()> {
        self.file
            .write_all(line)
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.size += line.len() as u64;
        Ok(())
    }

    fn sync(&self) -> LogResult<()> {
        self.file.sync_all().map_err(|source| LogError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

/// Owned collection of open log files.
#[derive(Debug)]
pub struct FileRegistry {
    base_dir: PathBuf,
    entries: HashMap<RoutingKey, FileEntry>,
}

impl FileRegistry {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entries: HashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of open entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &RoutingKey) -> Option<&FileEntry> {
        self.entries.get(key)
    }

    /// Return the entry that should receive a line of `incoming` bytes,
    /// opening or rotating as needed.
    pub fn resolve(
        &mut self,
        key: &RoutingKey,
        threshold: u64,
        incoming: u64,
    ) -> LogResult<&mut FileEntry> {
        let mut entry = match self.entries.remove(key) {
            Some(entry) => entry,
            None => {
                let entry = self.open_entry(key, threshold)?;
                self.release_older_than(key.date());
                entry
            }
        };

        let rotated = if rotation::should_rotate(entry.size, incoming, threshold) {
            rotation::rotate(&mut entry, &self.base_dir, key, threshold, incoming)
        } else {
            Ok(())
        };

        // A failed rotation keeps the old part registered for the next attempt.
        let entry = self.entries.entry(key.clone()).or_insert(entry);
        rotated.map(|()| entry)
    }

    /// Resolve `key` and append `line` to it.
    pub fn append(&mut self, key: &RoutingKey, line: &[u8], threshold: u64) -> LogResult<()> {
        self.resolve(key, threshold, line.len() as u64)?.append(line)
    }

    /// Path the next line for `key` would go to, without opening anything.
    ///
    /// An open part that already reached `threshold` is reported as its
    /// successor, since any line will rotate it.
    pub fn peek_path(&self, key: &RoutingKey, threshold: u64) -> LogResult<PathBuf> {
        if let Some(entry) = self.entries.get(key) {
            if threshold > 0 && entry.size >= threshold {
                return Ok(part_path(&self.base_dir, key, entry.part + 1));
            }
            return Ok(entry.path.clone());
        }
        let part = rotation::starting_part(&self.base_dir, key, threshold)?;
        Ok(part_path(&self.base_dir, key, part))
    }

    /// Sync every open handle to disk.
    pub fn sync_all(&self) -> LogResult<()> {
        let mut first_err = None;
        for entry in self.entries.values() {
            if let Err(e) = entry.sync() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Sync and close every handle. The registry stays usable and reopens
    /// files on demand.
    pub fn release_all(&mut self) -> LogResult<()> {
        let mut first_err = None;
        for (_, entry) in self.entries.drain() {
            if let Err(e) = entry.sync() {
                first_err.get_or_insert(e);
            }
            debug!(path = %entry.path.display(), "released log file");
        }
        first_err.map_or(Ok(()), Err)
    }

    fn release_older_than(&mut self, date: NaiveDate) {
        self.entries.retain(|key, entry| {
            let keep = key.date >= date;
            if !keep {
                debug!(path = %entry.path.display(), "released log file from previous day");
            }
            keep
        });
    }

    fn open_entry(&self, key: &RoutingKey, threshold: u64) -> LogResult<FileEntry> {
        create_dir(&process_dir(&self.base_dir, key.process()))?;

        let part = rotation::starting_part(&self.base_dir, key, threshold)?;
        let path = part_path(&self.base_dir, key, part);
        let file = open_append(&path)?;
        let size = file
            .metadata()
            .map_err(|source| LogError::Metadata {
                path: path.clone(),
                source,
            })?
            .len();

        trace!(path = %path.display(), part, size, "opened log file");
        Ok(FileEntry {
            file,
            path,
            size,
            part,
        })
    }
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        let _ = self.release_all();
    }
}

/// Create `path` and any missing parents.
pub(crate) fn create_dir(path: &Path) -> LogResult<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(path).map_err(|source| LogError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Open `path` for append, creating it if needed.
pub(crate) fn open_append(path: &Path) -> LogResult<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options.open(path).map_err(|source| LogError::OpenFile {
        path: path.to_path_buf(),
        source,
    })
}
