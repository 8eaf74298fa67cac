//! Per-run counters reported with the completion log line.

use std::time::Duration;

use serde::Serialize;

use crate::common::{EntryKind, FileEntry};

/// What one run put into its archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveStats {
    /// Number of entries of every kind written to the archive.
    pub entries: u64,
    pub files: u64,
    pub directories: u64,
    pub symlinks: u64,
    /// Uncompressed file content, excluding tar headers and padding.
    pub content_bytes: u64,
    /// Size of the compressed archive on disk.
    pub archive_bytes: u64,
    pub elapsed_ms: u64,
}

impl ArchiveStats {
    pub fn record(&mut self, entry: &FileEntry, content_bytes: u64) {
        self.entries += 1;
        match entry.kind {
            EntryKind::File => self.files += 1,
            EntryKind::Dir => self.directories += 1,
            EntryKind::Symlink => self.symlinks += 1,
            EntryKind::Special | EntryKind::Socket => {}
        }
        self.content_bytes += content_bytes;
    }

    pub fn finish(&mut self, archive_bytes: u64, elapsed: Duration) {
        self.archive_bytes = archive_bytes;
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    /// Uncompressed over compressed size; 0.0 for an empty archive.
    pub fn ratio(&self) -> f64 {
        if self.archive_bytes > 0 {
            self.content_bytes as f64 / self.archive_bytes as f64
        } else {
            0.0
        }
    }

    /// Content throughput in MiB/s.
    pub fn throughput_mbps(&self) -> f64 {
        if self.elapsed_ms > 0 {
            (self.content_bytes as f64 / (1024.0 * 1024.0)) / (self.elapsed_ms as f64 / 1000.0)
        } else {
            0.0
        }
    }
}
