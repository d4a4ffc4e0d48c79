//! Size-based rotation of a routing key's active part.

use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::layout::part_path;
use super::{open_append, FileEntry, RoutingKey};
use crate::error::{LogError, LogResult};

/// Whether a line of `incoming` bytes must go to a fresh part.
///
/// An empty part accepts any line, so a single line larger than the threshold
/// is written whole instead of rotating forever.
pub fn should_rotate(size: u64, incoming: u64, threshold: u64) -> bool {
    if threshold == 0 {
        return false;
    }
    size >= threshold || (size > 0 && size.saturating_add(incoming) > threshold)
}

/// Pick the part a cold start should append to.
///
/// Scans `part(1), part(2), ...` while the files exist. The highest existing
/// part is reused while it is under `threshold` (or rotation is disabled);
/// otherwise the next number is chosen.
pub fn starting_part(base_dir: &Path, key: &RoutingKey, threshold: u64) -> LogResult<u32> {
    let mut highest: Option<(u32, u64)> = None;
    let mut part = 1;
    loop {
        let path = part_path(base_dir, key, part);
        match std::fs::metadata(&path) {
            Ok(meta) => {
                highest = Some((part, meta.len()));
                part += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => break,
            Err(source) => return Err(LogError::Metadata { path, source }),
        }
    }

    Ok(match highest {
        None => 1,
        Some((part, len)) if threshold == 0 || len < threshold => part,
        Some((part, _)) => part + 1,
    })
}

/// Swap `entry` to the next numbered part that can take `incoming` bytes.
///
/// Each candidate is opened before the current handle is dropped, so a failed
/// open leaves the entry pointing at its old, still valid part. A candidate
/// that already exists is credited with its length, and one that is already
/// too full is skipped. Earlier parts are never truncated or removed.
pub fn rotate(
    entry: &mut FileEntry,
    base_dir: &Path,
    key: &RoutingKey,
    threshold: u64,
    incoming: u64,
) -> LogResult<()> {
    let mut next = entry.part + 1;
    loop {
        let path = part_path(base_dir, key, next);
        let file = open_append(&path)?;
        let size = file
            .metadata()
            .map_err(|source| LogError::Metadata {
                path: path.clone(),
                source,
            })?
            .len();

        if should_rotate(size, incoming, threshold) {
            debug!(path = %path.display(), size, "skipped full log part");
            next += 1;
            continue;
        }

        debug!(
            from = %entry.path.display(),
            to = %path.display(),
            size = entry.size,
            "rotated log file"
        );

        entry.file = file;
        entry.path = path;
        entry.part = next;
        entry.size = size;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn key() -> RoutingKey {
        RoutingKey::new(
            "worker",
            "jobs",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_rotation_disabled_at_zero() {
        assert!(!should_rotate(u64::MAX - 1, 100, 0));
    }

    #[test]
    fn test_rotate_when_line_would_cross() {
        assert!(!should_rotate(90, 10, 100));
        assert!(should_rotate(90, 11, 100));
        assert!(should_rotate(100, 1, 100));
        assert!(should_rotate(150, 0, 100));
    }

    #[test]
    fn test_empty_part_accepts_oversized_line() {
        assert!(!should_rotate(0, 500, 100));
    }

    #[test]
    fn test_starting_part_with_no_files() {
        let temp = TempDir::new().unwrap();
        assert_eq!(starting_part(temp.path(), &key(), 100).unwrap(), 1);
    }

    #[test]
    fn test_starting_part_reuses_last_under_threshold() {
        let temp = TempDir::new().unwrap();
        let k = key();
        std::fs::create_dir_all(temp.path().join("worker")).unwrap();
        std::fs::write(part_path(temp.path(), &k, 1), vec![b'x'; 100]).unwrap();
        std::fs::write(part_path(temp.path(), &k, 2), vec![b'x'; 40]).unwrap();

        assert_eq!(starting_part(temp.path(), &k, 100).unwrap(), 2);
    }

    #[test]
    fn test_starting_part_moves_past_full_part() {
        let temp = TempDir::new().unwrap();
        let k = key();
        std::fs::create_dir_all(temp.path().join("worker")).unwrap();
        std::fs::write(part_path(temp.path(), &k, 1), vec![b'x'; 120]).unwrap();

        assert_eq!(starting_part(temp.path(), &k, 100).unwrap(), 2);
        // Rotation disabled: keep appending to the existing lineage.
        assert_eq!(starting_part(temp.path(), &k, 0).unwrap(), 1);
    }

    #[test]
    fn test_rotate_resets_size_and_keeps_old_part() {
        let temp = TempDir::new().unwrap();
        let k = key();
        std::fs::create_dir_all(temp.path().join("worker")).unwrap();
        let first = part_path(temp.path(), &k, 1);
        let mut entry = FileEntry {
            file: open_append(&first).unwrap(),
            path: first.clone(),
            size: 0,
            part: 1,
        };
        entry.append(b"hello\n").unwrap();

        rotate(&mut entry, temp.path(), &k, 100, 6).unwrap();

        assert_eq!(entry.part, 2);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.path, part_path(temp.path(), &k, 2));
        assert!(entry.path.exists());
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "hello\n");
    }

    #[test]
    fn test_rotate_credits_existing_next_part() {
        let temp = TempDir::new().unwrap();
        let k = key();
        std::fs::create_dir_all(temp.path().join("worker")).unwrap();
        let first = part_path(temp.path(), &k, 1);
        std::fs::write(part_path(temp.path(), &k, 2), vec![b'x'; 40]).unwrap();
        let mut entry = FileEntry {
            file: open_append(&first).unwrap(),
            path: first,
            size: 100,
            part: 1,
        };

        rotate(&mut entry, temp.path(), &k, 100, 10).unwrap();

        assert_eq!(entry.part, 2);
        assert_eq!(entry.size, 40);
    }

    #[test]
    fn test_rotate_skips_parts_that_cannot_take_the_line() {
        let temp = TempDir::new().unwrap();
        let k = key();
        std::fs::create_dir_all(temp.path().join("worker")).unwrap();
        let first = part_path(temp.path(), &k, 1);
        std::fs::write(&first, vec![b'x'; 10]).unwrap();
        // Part 2 is missing; part 3 was left behind nearly full.
        std::fs::write(part_path(temp.path(), &k, 3), vec![b'x'; 900]).unwrap();
        let mut entry = FileEntry {
            file: open_append(&first).unwrap(),
            path: first,
            size: 1000,
            part: 1,
        };

        rotate(&mut entry, temp.path(), &k, 1000, 45).unwrap();
        assert_eq!(entry.part, 2);
        assert_eq!(entry.size, 0);

        // Filling part 2 moves on past part 3 instead of overshooting it.
        entry.size = 990;
        rotate(&mut entry, temp.path(), &k, 1000, 145).unwrap();
        assert_eq!(entry.part, 4);
        assert_eq!(entry.size, 0);
        assert_eq!(
            std::fs::metadata(part_path(temp.path(), &k, 3)).unwrap().len(),
            900
        );
    }
}
