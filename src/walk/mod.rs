//! # Tree Walker
//!
//! Lazy, depth-first traversal of everything below a source directory.
//!
//! Parents are always yielded before their children and siblings are sorted
//! by file name, so an unchanged tree always produces the same sequence of
//! entries (and therefore the same archive bytes). Symlinks are reported as
//! links and never followed. The root itself is not part of the sequence.
//!
//! A walker can be told to skip one subtree, which is how a target directory
//! nested inside the source keeps the run's own staging file out of the
//! archive.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::common::FileEntry;
use crate::ArchiverError;

/// Decides whether an entry (and, for a directory, its subtree) is walked.
pub(crate) type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool>;

pub struct TreeWalker {
    root: PathBuf,
    inner: FilterEntry<walkdir::IntoIter, EntryFilter>,
    failed: bool,
}

impl TreeWalker {
    pub fn new(root: &Path) -> Self {
        Self::with_filter(root, Box::new(|_: &DirEntry| true))
    }

    /// Like [`TreeWalker::new`], but never yields `excluded` or anything below it.
    ///
    /// `excluded` must be spelled the way the walk reaches it, i.e. `root`
    /// joined with a relative path.
    pub fn excluding(root: &Path, excluded: &Path) -> Self {
        let excluded = excluded.to_path_buf();
        Self::with_filter(root, Box::new(move |dent: &DirEntry| dent.path() != excluded))
    }

    pub(crate) fn with_filter(root: &Path, filter: EntryFilter) -> Self {
        let inner = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(filter);
        Self { root: root.to_path_buf(), inner, failed: false }
    }
}

impl Iterator for TreeWalker {
    type Item = Result<FileEntry, ArchiverError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Not resumable: the first error ends the sequence.
        if self.failed {
            return None;
        }
        let item = self.inner.next()?.map_err(ArchiverError::from).and_then(|dent| {
            let meta = dent.metadata().map_err(ArchiverError::from)?;
            FileEntry::new(&self.root, dent.path(), meta).ok_or_else(|| {
                ArchiverError::walk(
                    "compute relative path of",
                    dent.path(),
                    std::io::Error::new(std::io::ErrorKind::InvalidData, "path is outside the source root"),
                )
            })
        });
        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}
