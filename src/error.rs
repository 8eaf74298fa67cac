use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `snaptar` crate.
///
/// Every variant names the path it failed on and keeps the underlying I/O
/// error as its source, so a single line is enough to diagnose a failed run.
#[derive(Debug, Error)]
pub enum ArchiverError {
    /// The source path is missing, unreadable, or not a directory.
    #[error("invalid source path '{}': {source}", path.display())]
    InvalidSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The target directory could not be created or is not a directory.
    #[error("failed to create target directory '{}': {source}", path.display())]
    TargetUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The staging file could not be created inside the target directory.
    #[error("failed to create temporary file in '{}': {source}", dir.display())]
    TempFileFailure {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading an entry's metadata or content failed during traversal.
    #[error("error during directory walk: could not {op} '{}': {source}", path.display())]
    WalkFailure {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the compressed stream into the staging file failed.
    #[error("failed to write archive stream to '{}': {source}", path.display())]
    StreamFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A layer of the writer chain failed to flush or close.
    #[error("failed to close {stage} writer for '{}': {source}", path.display())]
    PipelineCloseFailure {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renaming the staged file to its final name failed.
    #[error("failed to rename temporary file '{}' to '{}': {source}", from.display(), to.display())]
    PlacementFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An archive failed its integrity check.
    #[error("archive '{}' failed verification: {reason}", path.display())]
    VerifyFailure { path: PathBuf, reason: String },
}

impl ArchiverError {
    pub(crate) fn walk(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ArchiverError::WalkFailure { op, path: path.into(), source }
    }

    pub(crate) fn verify(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArchiverError::VerifyFailure { path: path.into(), reason: reason.into() }
    }
}

impl From<walkdir::Error> for ArchiverError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        ArchiverError::walk("read metadata of", path, io::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn messages_carry_path_and_cause() {
        let err = ArchiverError::InvalidSource {
            path: PathBuf::from("/no/such/dir"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such/dir"), "{msg}");
        assert!(msg.contains("not found"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn walk_failure_names_the_operation() {
        let err = ArchiverError::walk(
            "open",
            "/src/a.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "error during directory walk: could not open '/src/a.txt': denied"
        );
    }
}
