//! # Serialization / Compression Chain
//!
//! Frames a sequence of [`FileEntry`] values as a GNU tar stream and pushes
//! that stream through a single zstd encoder:
//!
//! ```text
//! file content -> tar::Builder -> zstd::Encoder -> W
//! ```
//!
//! Entries are written one at a time as they arrive; nothing is buffered
//! beyond what the encoder itself holds. [`ArchiveSink::finish`] closes the
//! tar layer first (end-of-archive blocks) and then the zstd frame, which is
//! the only order that leaves a complete archive in `W`.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tar::{EntryType, Header, HeaderMode};
use tracing::debug;

use crate::common::{EntryKind, FileEntry};
use crate::ArchiverError;

/// Default zstd level. High ratio, slow; backups favour size over speed.
pub const DEFAULT_LEVEL: i32 = 19;

/// Holds the codec options for one archive.
#[derive(Debug, Clone)]
pub struct CompressionSettings {
    /// Zstandard compression level (1-22).
    pub level: i32,
    /// Enable long-distance matching (128 MiB window).
    pub long_distance_matching: bool,
    /// Append the zstd frame checksum.
    pub include_checksum: bool,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self { level: DEFAULT_LEVEL, long_distance_matching: true, include_checksum: true }
    }
}

/// Tar framing over a zstd encoder over `W`.
pub struct ArchiveSink<W: Write> {
    builder: tar::Builder<zstd::stream::write::Encoder<'static, W>>,
    /// Where `W` ultimately lands, for error messages.
    sink_path: PathBuf,
}

impl<W: Write> ArchiveSink<W> {
    /// Wraps `inner`. `sink_path` is only used to label errors.
    pub fn new(inner: W, settings: &CompressionSettings, sink_path: &Path) -> Result<Self, ArchiverError> {
        let stream_err = |source| ArchiverError::StreamFailure { path: sink_path.to_path_buf(), source };

        let mut encoder = zstd::stream::write::Encoder::new(inner, settings.level).map_err(stream_err)?;
        encoder.include_checksum(settings.include_checksum).map_err(stream_err)?;
        if settings.long_distance_matching {
            encoder.long_distance_matching(true).map_err(stream_err)?;
        }

        let builder = tar::Builder::new(encoder);
        Ok(Self { builder, sink_path: sink_path.to_path_buf() })
    }

    /// Writes the header for `entry` and, for regular files, its content.
    ///
    /// Returns the number of content bytes written.
    pub fn append(&mut self, entry: &FileEntry) -> Result<u64, ArchiverError> {
        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(&entry.metadata, HeaderMode::Complete);

        match entry.kind {
            EntryKind::File => self.append_file(&mut header, entry),
            EntryKind::Dir => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                self.append_empty(&mut header, entry)
            }
            EntryKind::Symlink => {
                let target = fs::read_link(&entry.absolute_path)
                    .map_err(|e| ArchiverError::walk("read link", &entry.absolute_path, e))?;
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                self.builder
                    .append_link(&mut header, &entry.relative_path, &target)
                    .map_err(|e| self.stream_err(e))?;
                Ok(0)
            }
            EntryKind::Special => {
                header.set_size(0);
                self.append_empty(&mut header, entry)
            }
            EntryKind::Socket => Err(ArchiverError::walk(
                "build header for",
                &entry.absolute_path,
                io::Error::new(io::ErrorKind::Unsupported, "sockets cannot be archived"),
            )),
        }
    }

    fn append_file(&mut self, header: &mut Header, entry: &FileEntry) -> Result<u64, ArchiverError> {
        let file = File::open(&entry.absolute_path)
            .map_err(|e| ArchiverError::walk("open", &entry.absolute_path, e))?;
        header.set_entry_type(EntryType::Regular);
        header.set_size(entry.size);

        let mut reader = EntryReader::new(file, entry.size);
        let written = self.builder.append_data(header, &entry.relative_path, &mut reader);
        if let Some(source) = reader.take_error() {
            return Err(ArchiverError::walk("read", &entry.absolute_path, source));
        }
        written.map_err(|e| self.stream_err(e))?;
        Ok(entry.size)
    }

    fn append_empty(&mut self, header: &mut Header, entry: &FileEntry) -> Result<u64, ArchiverError> {
        self.builder
            .append_data(header, &entry.relative_path, io::empty())
            .map_err(|e| self.stream_err(e))?;
        Ok(0)
    }

    fn stream_err(&self, source: io::Error) -> ArchiverError {
        ArchiverError::StreamFailure { path: self.sink_path.clone(), source }
    }

    /// Closes the tar layer, then the zstd frame, and hands back `W`.
    ///
    /// `W` is not flushed; that belongs to whoever owns it.
    pub fn finish(self) -> Result<W, ArchiverError> {
        let sink_path = self.sink_path;
        let close_err = |stage, source| ArchiverError::PipelineCloseFailure {
            stage,
            path: sink_path.clone(),
            source,
        };

        let encoder = self.builder.into_inner().map_err(|e| close_err("tar", e))?;
        debug!("tar stream closed");
        let inner = encoder.finish().map_err(|e| close_err("zstd", e))?;
        debug!("zstd frame closed");
        Ok(inner)
    }
}

/// Reads exactly `remaining` bytes from a file whose size was statted earlier.
///
/// Errors from the file are kept aside so the caller can tell a source read
/// failure from a sink write failure; both surface through `io::copy` inside
/// the tar builder.
struct EntryReader<R> {
    inner: R,
    remaining: u64,
    error: Option<io::Error>,
}

impl<R: Read> EntryReader<R> {
    fn new(inner: R, size: u64) -> Self {
        Self { inner, remaining: size, error: None }
    }

    fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn fail(&mut self, source: io::Error) -> io::Error {
        let kind = source.kind();
        self.error = Some(source);
        io::Error::new(kind, "source read failed")
    }
}

impl<R: Read> Read for EntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        match self.inner.read(&mut buf[..cap]) {
            Ok(0) => Err(self.fail(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while being archived ({} bytes missing)", self.remaining),
            ))),
            Ok(n) => {
                self.remaining -= n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => Err(self.fail(e)),
        }
    }
}
