//! # Archive Pipeline
//!
//! Drives one backup run from start to finish:
//!
//! 1. validate the source and make sure the target directory exists,
//! 2. walk the source tree,
//! 3. stream every entry through tar framing and zstd compression into a
//!    [`HashingWriter`] that feeds both the staging file and a CRC-32,
//! 4. close the chain in order, verify the staged file, and rename it to
//!    `<mm-dd-yyyy>-<crc32>.tar.zstd`.
//!
//! A run either publishes one complete archive or leaves the target
//! directory exactly as it found it (apart from creating it).

mod naming;
mod staging;

pub use naming::{archive_file_name, parse_archive_file_name, ARCHIVE_EXTENSION};
pub use staging::{is_staging_name, CollisionPolicy, Placement, StagedArchive, TEMP_PREFIX, TEMP_SUFFIX};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, error, info};
use walkdir::DirEntry;

use crate::common::FileEntry;
use crate::compress::{ArchiveSink, CompressionSettings};
use crate::hashing::HashingWriter;
use crate::progress::ArchiveStats;
use crate::walk::TreeWalker;
use crate::{fsx, verify, ArchiverError};

// use 1 MiB buffer between the encoder and the staging file
const WRITE_BUFFER: usize = 1024 * 1024;

/// The two paths a run is given.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub source: PathBuf,
    pub target_dir: PathBuf,
}

impl ArchiveRequest {
    pub fn new(source: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self { source: source.into(), target_dir: target_dir.into() }
    }
}

/// Holds all configuration options for a backup run.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    pub compression: CompressionSettings,
    /// Log one line per archived entry.
    pub verbose: bool,
    pub on_collision: CollisionPolicy,
    /// Skip re-reading and decoding the staged archive before placing it.
    pub skip_check: bool,
    /// Date used in the file name. Today, in local time, when unset.
    pub date: Option<NaiveDate>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveResult {
    pub final_path: PathBuf,
    pub checksum: u32,
    pub placement: Placement,
    pub stats: ArchiveStats,
}

/// Validates `request`, walks the source and publishes the archive.
pub fn create_archive(request: &ArchiveRequest, options: &ArchiveOptions) -> Result<ArchiveResult, ArchiverError> {
    fsx::validate_source(&request.source)?;
    fsx::ensure_target_dir(&request.target_dir)?;
    archive_entries(source_walker(&request.source, &request.target_dir), &request.target_dir, options)
}

/// Walks `source`, leaving out `target_dir` when it lives inside the source.
///
/// When both are the same directory only the staging files at the top level
/// are left out.
fn source_walker(source: &Path, target_dir: &Path) -> TreeWalker {
    let nested = fs::canonicalize(source)
        .and_then(|s| Ok((s, fs::canonicalize(target_dir)?)))
        .ok()
        .and_then(|(s, t)| t.strip_prefix(&s).ok().map(Path::to_path_buf));

    match nested {
        None => TreeWalker::new(source),
        Some(rel) if rel.as_os_str().is_empty() => {
            debug!("target is the source directory, skipping staging files");
            TreeWalker::with_filter(
                source,
                Box::new(|dent: &DirEntry| dent.depth() != 1 || !is_staging_name(dent.file_name())),
            )
        }
        Some(rel) => {
            let excluded = source.join(rel);
            debug!(excluded = %excluded.display(), "target is inside the source, skipping it");
            TreeWalker::excluding(source, &excluded)
        }
    }
}

/// Writer between the encoder and the staging file.
///
/// Gives the file back once flushed so it can be synced and closed.
pub(crate) trait StagingWriter: Write {
    fn into_file(self) -> io::Result<File>;
}

impl StagingWriter for BufWriter<File> {
    fn into_file(self) -> io::Result<File> {
        self.into_inner().map_err(|e| e.into_error())
    }
}

/// Archives an arbitrary entry sequence into `target_dir`, which must exist.
///
/// The first `Err` in `entries` aborts the run; nothing is published and the
/// staging file is removed.
pub fn archive_entries<I>(entries: I, target_dir: &Path, options: &ArchiveOptions) -> Result<ArchiveResult, ArchiverError>
where
    I: IntoIterator<Item = Result<FileEntry, ArchiverError>>,
{
    stage_entries(entries, target_dir, options, |file| BufWriter::with_capacity(WRITE_BUFFER, file))
}

fn stage_entries<I, S>(
    entries: I,
    target_dir: &Path,
    options: &ArchiveOptions,
    open_sink: impl FnOnce(File) -> S,
) -> Result<ArchiveResult, ArchiverError>
where
    I: IntoIterator<Item = Result<FileEntry, ArchiverError>>,
    S: StagingWriter,
{
    let start = Instant::now();
    let (file, staged) = StagedArchive::create_in(target_dir)?;
    debug!(temp = %staged.path().display(), "staging archive");

    let sink = HashingWriter::new(open_sink(file));
    let mut archive = ArchiveSink::new(sink, &options.compression, staged.path())?;
    let mut stats = ArchiveStats::default();
    for entry in entries {
        let entry = entry?;
        let content_bytes = archive.append(&entry)?;
        stats.record(&entry, content_bytes);
        if options.verbose {
            info!("Added to archive: {}", entry.name());
        }
    }

    let (mut buffered, checksum, archive_bytes) = archive.finish()?.into_parts();
    let close_err = |stage, source| ArchiverError::PipelineCloseFailure {
        stage,
        path: staged.path().to_path_buf(),
        source,
    };
    buffered.flush().map_err(|e| close_err("buffered", e))?;
    let file = buffered.into_file().map_err(|e| close_err("buffered", e))?;
    file.sync_all().map_err(|e| close_err("file", e))?;
    drop(file);

    if !options.skip_check {
        verify::verify_file(staged.path(), checksum)?;
        debug!("staged archive verified");
    }

    let date = options.date.unwrap_or_else(|| Local::now().date_naive());
    let final_path = target_dir.join(archive_file_name(date, checksum));
    let placement = staged.place(&final_path, options.on_collision)?;
    stats.finish(archive_bytes, start.elapsed());

    Ok(ArchiveResult { final_path, checksum, placement, stats })
}

/// Runs [`create_archive`] and logs exactly one line describing the outcome.
pub fn run_backup(request: &ArchiveRequest, options: &ArchiveOptions) -> Result<ArchiveResult, ArchiverError> {
    info!(
        "Starting archive of '{}' into '{}'",
        request.source.display(),
        request.target_dir.display()
    );
    match create_archive(request, options) {
        Ok(result) => {
            log_success(&result);
            Ok(result)
        }
        Err(e) => {
            error!("Error creating tarball: {e}");
            Err(e)
        }
    }
}

fn log_success(result: &ArchiveResult) {
    let stats = &result.stats;
    let headline = match result.placement {
        Placement::Created => "Successfully created unique tarball",
        Placement::Replaced => "Successfully replaced same-day tarball",
        Placement::KeptExisting => "Identical tarball already present, kept existing",
    };
    info!(
        checksum = %format_args!("{:08x}", result.checksum),
        "{headline}: {} | Files: {} | Dirs: {} | Size: {:.2} → {:.2} MiB (ratio {:.2}x) | Time: {:.2}s | {:.1} MB/s",
        result.final_path.display(),
        stats.files,
        stats.directories,
        stats.content_bytes as f64 / (1024.0 * 1024.0),
        stats.archive_bytes as f64 / (1024.0 * 1024.0),
        stats.ratio(),
        stats.elapsed_ms as f64 / 1000.0,
        stats.throughput_mbps(),
    );
}
