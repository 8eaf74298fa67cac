//! Cross-platform filesystem helpers for the two paths a run is given.
//!
//! The source must already be a directory; the target is created on demand
//! with standard directory permissions (`0o755` on Unix, platform default
//! elsewhere). Nothing here touches files inside either directory.

use std::fs::{self, DirBuilder};
use std::io;
use std::path::Path;

use crate::ArchiverError;

/// Permission bits applied to target directories created by a run.
pub const TARGET_DIR_MODE: u32 = 0o755;

/// Checks that `path` can be statted and is a directory.
///
/// Symlinks are followed, so a link pointing at a directory is accepted.
pub fn validate_source(path: &Path) -> Result<(), ArchiverError> {
    let meta = fs::metadata(path).map_err(|source| ArchiverError::InvalidSource {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ArchiverError::InvalidSource {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }
    Ok(())
}

/// Creates `path` and any missing parents. Existing directories are reused.
pub fn ensure_target_dir(path: &Path) -> Result<(), ArchiverError> {
    let unavailable = |source| ArchiverError::TargetUnavailable { path: path.to_path_buf(), source };

    dir_builder().create(path).map_err(unavailable)?;
    // must resolve to a directory, not merely exist
    let meta = fs::metadata(path).map_err(unavailable)?;
    if !meta.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "path exists and is not a directory",
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn dir_builder() -> DirBuilder {
    use std::os::unix::fs::DirBuilderExt;
    let mut builder = DirBuilder::new();
    builder.recursive(true).mode(TARGET_DIR_MODE);
    builder
}

#[cfg(not(unix))]
fn dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    builder
}
