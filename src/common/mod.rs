//! Common utilities and types module.
// Shared structs used by the walker, the archive sink and the orchestrator.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;

/// The kind of filesystem node an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    /// FIFO, character or block device. Archived as a header only.
    Special,
    /// Unix domain socket. Cannot be represented in a tar stream.
    Socket,
}

impl EntryKind {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_symlink() {
            return EntryKind::Symlink;
        }
        if ft.is_dir() {
            return EntryKind::Dir;
        }
        if ft.is_file() {
            return EntryKind::File;
        }
        if is_socket(&ft) {
            return EntryKind::Socket;
        }
        EntryKind::Special
    }
}

#[cfg(unix)]
fn is_socket(ft: &std::fs::FileType) -> bool {
    ft.is_socket()
}

#[cfg(not(unix))]
fn is_socket(_ft: &std::fs::FileType) -> bool {
    false
}

/// One filesystem node found below the source root.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    /// Path relative to the source root, built from normal components only.
    pub relative_path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    /// Metadata as read during the walk (symlinks are not followed).
    pub metadata: Metadata,
}

impl FileEntry {
    /// Builds an entry for `absolute`, which must live below `root`.
    ///
    /// Returns `None` for the root itself or for paths outside of it.
    pub fn new(root: &Path, absolute: &Path, metadata: Metadata) -> Option<Self> {
        let relative_path: PathBuf = absolute
            .strip_prefix(root)
            .ok()?
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        if relative_path.as_os_str().is_empty() {
            return None;
        }

        let kind = EntryKind::from_metadata(&metadata);
        let size = if kind == EntryKind::File { metadata.len() } else { 0 };

        Some(Self {
            absolute_path: absolute.to_path_buf(),
            relative_path,
            kind,
            size,
            metadata,
        })
    }

    /// The relative path with `/` separators, as stored in the archive.
    pub fn name(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn relative_name_uses_forward_slashes() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("c.txt");
        fs::write(&file, b"abc").unwrap();

        let entry = FileEntry::new(dir.path(), &file, fs::symlink_metadata(&file).unwrap()).unwrap();
        assert_eq!(entry.name(), "a/b/c.txt");
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.size, 3);
    }

    #[test]
    fn root_is_not_an_entry() {
        let dir = tempdir().unwrap();
        let meta = fs::metadata(dir.path()).unwrap();
        assert!(FileEntry::new(dir.path(), dir.path(), meta).is_none());
    }

    #[test]
    fn directories_report_zero_size() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let entry = FileEntry::new(dir.path(), &sub, fs::symlink_metadata(&sub).unwrap()).unwrap();
        assert_eq!(entry.kind, EntryKind::Dir);
        assert_eq!(entry.size, 0);
    }
}
