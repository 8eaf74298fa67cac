//! Staging file lifecycle and atomic placement.
//!
//! The archive is written to a uniquely named temp file inside the target
//! directory, so the final rename never crosses a filesystem. The temp file
//! is held as a [`TempPath`]: dropping it on any exit path deletes the file,
//! and only a successful [`StagedArchive::place`] disarms that.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io;
use std::path::Path;

use serde::Serialize;
use tempfile::TempPath;

use crate::ArchiverError;

pub const TEMP_PREFIX: &str = "backup-";
pub const TEMP_SUFFIX: &str = ".tmp";

/// Whether `name` looks like a staging file left by [`StagedArchive::create_in`].
pub fn is_staging_name(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| {
        n.len() > TEMP_PREFIX.len() + TEMP_SUFFIX.len() && n.starts_with(TEMP_PREFIX) && n.ends_with(TEMP_SUFFIX)
    })
}

/// What to do when the final name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Atomically replace the existing file.
    #[default]
    Overwrite,
    /// Leave the existing file alone and discard the new one.
    KeepExisting,
}

/// How the run's archive ended up under its final name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Created,
    Replaced,
    KeptExisting,
}

#[derive(Debug)]
pub struct StagedArchive {
    path: TempPath,
}

impl StagedArchive {
    /// Creates an empty staging file in `dir` and returns its write handle.
    pub fn create_in(dir: &Path) -> Result<(File, Self), ArchiverError> {
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| ArchiverError::TempFileFailure { dir: dir.to_path_buf(), source })?;
        let (file, path) = temp.into_parts();
        Ok((file, Self { path }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renames the staging file to `final_path`.
    ///
    /// All handles to the file must be closed before calling this.
    pub fn place(self, final_path: &Path, policy: CollisionPolicy) -> Result<Placement, ArchiverError> {
        let existed = fs::symlink_metadata(final_path).is_ok();
        let placement_err = |e: tempfile::PathPersistError| ArchiverError::PlacementFailure {
            from: e.path.to_path_buf(),
            to: final_path.to_path_buf(),
            source: e.error,
        };

        match policy {
            CollisionPolicy::Overwrite => {
                self.path.persist(final_path).map_err(placement_err)?;
                Ok(if existed { Placement::Replaced } else { Placement::Created })
            }
            CollisionPolicy::KeepExisting => match self.path.persist_noclobber(final_path) {
                Ok(()) => Ok(Placement::Created),
                // the staging file is removed when the error drops
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(Placement::KeptExisting),
                Err(e) => Err(placement_err(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn staging_file_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let (mut file, staged) = StagedArchive::create_in(dir.path()).unwrap();
        file.write_all(b"partial").unwrap();
        let name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX), "{name}");

        drop(file);
        drop(staged);
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn staging_names_are_unique() {
        let dir = tempdir().unwrap();
        let (_a, first) = StagedArchive::create_in(dir.path()).unwrap();
        let (_b, second) = StagedArchive::create_in(dir.path()).unwrap();
        assert_ne!(first.path(), second.path());
        assert!(is_staging_name(first.path().file_name().unwrap()));
    }

    #[test]
    fn staging_name_needs_prefix_and_suffix() {
        assert!(is_staging_name(OsStr::new("backup-a1b2c3.tmp")));
        assert!(!is_staging_name(OsStr::new("backup-.tmp")));
        assert!(!is_staging_name(OsStr::new("01-15-2024-0000abcd.tar.zstd")));
        assert!(!is_staging_name(OsStr::new("backup-notes.txt")));
    }

    #[test]
    fn place_renames_and_reports_replacement() {
        let dir = tempdir().unwrap();
        let final_path = dir.path().join("final.tar.zstd");

        let (mut file, staged) = StagedArchive::create_in(dir.path()).unwrap();
        file.write_all(b"one").unwrap();
        drop(file);
        assert_eq!(staged.place(&final_path, CollisionPolicy::Overwrite).unwrap(), Placement::Created);

        let (mut file, staged) = StagedArchive::create_in(dir.path()).unwrap();
        file.write_all(b"two").unwrap();
        drop(file);
        assert_eq!(staged.place(&final_path, CollisionPolicy::Overwrite).unwrap(), Placement::Replaced);

        assert_eq!(fs::read(&final_path).unwrap(), b"two");
        assert_eq!(dir_names(dir.path()), vec!["final.tar.zstd"]);
    }

    #[test]
    fn keep_existing_discards_new_file() {
        let dir = tempdir().unwrap();
        let final_path = dir.path().join("final.tar.zstd");
        fs::write(&final_path, b"original").unwrap();

        let (mut file, staged) = StagedArchive::create_in(dir.path()).unwrap();
        file.write_all(b"newer").unwrap();
        drop(file);
        assert_eq!(
            staged.place(&final_path, CollisionPolicy::KeepExisting).unwrap(),
            Placement::KeptExisting
        );
        assert_eq!(fs::read(&final_path).unwrap(), b"original");
        assert_eq!(dir_names(dir.path()), vec!["final.tar.zstd"]);
    }

    #[test]
    fn failed_placement_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let final_path = dir.path().join("missing-dir").join("final.tar.zstd");

        let (file, staged) = StagedArchive::create_in(dir.path()).unwrap();
        drop(file);
        let err = staged.place(&final_path, CollisionPolicy::Overwrite).unwrap_err();
        assert!(matches!(err, ArchiverError::PlacementFailure { .. }));
        assert!(dir_names(dir.path()).is_empty());
    }

    #[test]
    fn unwritable_dir_is_a_temp_file_failure() {
        let dir = tempdir().unwrap();
        let err = StagedArchive::create_in(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ArchiverError::TempFileFailure { .. }));
    }
}
