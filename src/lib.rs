//! # snaptar Core Library
//!
//! This crate provides the core functionality for the `snaptar` backup tool:
//! turning a source directory into a single zstd-compressed tarball named
//! `<mm-dd-yyyy>-<crc32>.tar.zstd` inside a target directory.
//!
//! A run is one streaming pipeline. Entries from the tree walker are framed
//! as tar, compressed as one zstd frame, and written through a CRC-32 fan-out
//! into a temp file that is renamed into place only after everything has been
//! closed cleanly. Either one complete archive is published or none is.
//!
//! ## Key Modules
//!
//! - [`archive`]: The orchestrator, file naming, staging and placement.
//! - [`compress`]: Tar framing over a zstd encoder.
//! - [`walk`]: Deterministic depth-first traversal of the source tree.
//! - [`hashing`]: The CRC-32 fan-out writer.
//! - [`verify`]: Integrity check for staged and published archives.
//!
//! ## Examples
//!
//! ```no_run
//! use snaptar::archive::{run_backup, ArchiveOptions, ArchiveRequest};
//!
//! let request = ArchiveRequest::new("/data", "/backups");
//! let result = run_backup(&request, &ArchiveOptions::default())?;
//! println!("{}", result.final_path.display());
//! # Ok::<(), snaptar::ArchiverError>(())
//! ```

pub mod archive;
pub mod cli;
pub mod common;
pub mod compress;
pub mod error;
pub use error::ArchiverError;

// Cross-platform filesystem wrapper
pub mod fsx;

pub mod hashing;
pub mod logging;
pub mod progress;
pub mod verify;
pub mod walk;
