//! Stress tests for concurrent writers
//!
//! These tests verify that many threads writing to the same routing key never
//! lose, truncate or interleave lines, with and without rotation.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use chrono::{FixedOffset, NaiveDate, TimeZone};
use proclog_core::registry::layout::part_path;
use proclog_core::{LogEntry, LoggerConfig, ManualClock, ProcessLogger, RoutingKey};
use tempfile::TempDir;

const THREADS: usize = 8;
const EVENTS_PER_THREAD: usize = 250;

fn logger(base: &Path, max_file_size: u64) -> Arc<ProcessLogger> {
    let now = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 15, 12, 0, 0)
        .unwrap();
    Arc::new(
        ProcessLogger::new(LoggerConfig::new(base).with_max_file_size(max_file_size))
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(now))),
    )
}

/// Write `EVENTS_PER_THREAD` events from each of `THREADS` threads.
fn hammer(logger: &Arc<ProcessLogger>) {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..EVENTS_PER_THREAD {
                    let details = serde_json::json!({"thread": t, "seq": i});
                    logger
                        .info_process("load", "burst", "write", "stress event", Some(&details))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Collect (part sizes, parsed entries) across every part of the key.
fn collect_parts(base: &Path) -> (Vec<u64>, Vec<LogEntry>) {
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let key = RoutingKey::new("load", "burst", date);
    let mut sizes = Vec::new();
    let mut entries = Vec::new();
    let mut n = 1;
    loop {
        let path = part_path(base, &key, n);
        if !path.exists() {
            break;
        }
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'), "part {} ends mid-line", n);
        sizes.push(content.len() as u64);
        for line in content.lines() {
            entries.push(LogEntry::from_json_line(line).expect("whole JSON line"));
        }
        n += 1;
    }
    (sizes, entries)
}

fn assert_all_events_present(entries: &[LogEntry]) {
    assert_eq!(entries.len(), THREADS * EVENTS_PER_THREAD);

    let seen: HashSet<(u64, u64)> = entries
        .iter()
        .map(|e| {
            let d = e.details.as_ref().unwrap();
            (d["thread"].as_u64().unwrap(), d["seq"].as_u64().unwrap())
        })
        .collect();
    assert_eq!(seen.len(), THREADS * EVENTS_PER_THREAD);
}

#[test]
fn test_concurrent_writers_single_file() {
    let temp = TempDir::new().unwrap();
    let logger = logger(temp.path(), 0);

    let start = Instant::now();
    hammer(&logger);
    let duration = start.elapsed();

    let (sizes, entries) = collect_parts(temp.path());
    assert_eq!(sizes.len(), 1);
    assert_all_events_present(&entries);

    println!(
        "{} events from {} threads in {:?}",
        THREADS * EVENTS_PER_THREAD,
        THREADS,
        duration
    );
}

#[test]
fn test_concurrent_writers_with_rotation() {
    let temp = TempDir::new().unwrap();
    let threshold = 4096;
    let logger = logger(temp.path(), threshold);

    hammer(&logger);

    let (sizes, entries) = collect_parts(temp.path());
    assert!(sizes.len() > 1, "expected rotation to produce several parts");
    assert_all_events_present(&entries);

    // No part overshoots: every line that would cross the threshold went to
    // the next part instead.
    for (i, size) in sizes.iter().enumerate() {
        assert!(*size <= threshold, "part {} has {} bytes", i + 1, size);
    }
}

#[test]
fn test_per_thread_order_preserved() {
    let temp = TempDir::new().unwrap();
    let logger = logger(temp.path(), 2048);

    hammer(&logger);

    let (_, entries) = collect_parts(temp.path());
    let mut last_seq = vec![None::<u64>; THREADS];
    for entry in &entries {
        let d = entry.details.as_ref().unwrap();
        let t = d["thread"].as_u64().unwrap() as usize;
        let seq = d["seq"].as_u64().unwrap();
        if let Some(prev) = last_seq[t] {
            assert!(seq > prev, "thread {} wrote {} after {}", t, seq, prev);
        }
        last_seq[t] = Some(seq);
    }
}
