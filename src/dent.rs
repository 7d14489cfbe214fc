use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::archive::ArchiveKind;

/////////////////////////////////////////////////////////////////////////
//// FileType

/// The type of a node, as reported by the container it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileType {
    /// A directory, or a directory inside an archive.
    Dir,
    /// A regular file.
    File,
    /// A symbolic link. Links are never followed and carry no content.
    Symlink,
    /// Anything else (devices, fifos, hard links inside tar streams, ...).
    Other,
}

impl FileType {
    /// Is it dir?
    pub fn is_dir(&self) -> bool {
        *self == FileType::Dir
    }
    /// Is it file?
    pub fn is_file(&self) -> bool {
        *self == FileType::File
    }
    /// Is it symlink?
    pub fn is_symlink(&self) -> bool {
        *self == FileType::Symlink
    }
}

impl From<fs::FileType> for FileType {
    fn from(ty: fs::FileType) -> FileType {
        if ty.is_dir() {
            FileType::Dir
        } else if ty.is_file() {
            FileType::File
        } else if ty.is_symlink() {
            FileType::Symlink
        } else {
            FileType::Other
        }
    }
}

impl From<tar::EntryType> for FileType {
    fn from(ty: tar::EntryType) -> FileType {
        match ty {
            tar::EntryType::Directory => FileType::Dir,
            tar::EntryType::Regular | tar::EntryType::Continuous => FileType::File,
            tar::EntryType::Symlink => FileType::Symlink,
            _ => FileType::Other,
        }
    }
}

/////////////////////////////////////////////////////////////////////////
//// Metadata

/// Metadata of a node.
///
/// Every container exposes a different subset: the real filesystem knows
/// everything, tar headers carry a mode and a modification time, zip members
/// carry a mode only when they were written on a unix system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    name: OsString,
    len: u64,
    mode: Option<u32>,
    modified: Option<SystemTime>,
    ty: FileType,
}

impl Metadata {
    pub(crate) fn new(name: OsString, ty: FileType, len: u64) -> Metadata {
        Metadata { name, len, mode: None, modified: None, ty }
    }

    pub(crate) fn with_mode(mut self, mode: Option<u32>) -> Metadata {
        self.mode = mode;
        self
    }

    pub(crate) fn with_modified(mut self, modified: Option<SystemTime>) -> Metadata {
        self.modified = modified;
        self
    }

    /// Build from `std::fs` metadata. `path` only provides the name.
    pub(crate) fn from_fs(path: &Path, md: &fs::Metadata) -> Metadata {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(md.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Metadata::new(file_name_of(path).to_os_string(), md.file_type().into(), md.len())
            .with_mode(mode)
            .with_modified(md.modified().ok())
    }

    /// Build from a tar header. Unparseable mode or mtime fields are left
    /// out rather than failing the entry.
    pub(crate) fn from_tar(path: &Path, header: &tar::Header) -> Metadata {
        let modified = header
            .mtime()
            .ok()
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        Metadata::new(
            file_name_of(path).to_os_string(),
            header.entry_type().into(),
            header.size().unwrap_or(0),
        )
        .with_mode(header.mode().ok())
        .with_modified(modified)
    }

    /// The bare name of the node, without any leading path components.
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Size in bytes as reported by the container. For compressed archive
    /// members this is the uncompressed size.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Permission bits, if the container records them.
    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    /// Last modification time, if the container records one.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// The type of the node.
    pub fn file_type(&self) -> FileType {
        self.ty
    }

    /// Returns true if the node is a directory.
    pub fn is_dir(&self) -> bool {
        self.ty.is_dir()
    }
}

/////////////////////////////////////////////////////////////////////////
//// DirEntry

/// A visited node.
///
/// This is the type of value that is yielded from [`Cursor`]. Directories,
/// archives and regular files all appear as a `DirEntry`, whether they live
/// on the real filesystem or inside an archive.
///
/// # Paths
///
/// [`path`] is the logical path of the node: the root given to
/// [`Cursor::new`] joined with the node's path inside every enclosing
/// container. Archives are ordinary path segments, so the member `c.txt`
/// of `root/b.tar.gz` has the path `root/b.tar.gz/c.txt`.
///
/// [`Cursor`]: struct.Cursor.html
/// [`Cursor::new`]: struct.Cursor.html#method.new
/// [`path`]: #method.path
#[derive(Clone)]
pub struct DirEntry {
    /// The full logical path.
    path: PathBuf,
    /// What the container knows about the node.
    md: Metadata,
    /// The depth at which this entry was generated relative to the root.
    depth: usize,
    /// Set if the suffix of the node names a supported archive.
    archive: Option<ArchiveKind>,
    /// Set if the cursor can read the content of the node.
    content: bool,
}

impl DirEntry {
    pub(crate) fn dir(path: PathBuf, md: Metadata, depth: usize) -> DirEntry {
        DirEntry { path, md, depth, archive: None, content: false }
    }

    /// A node that is neither a directory nor a regular file, like a link
    /// or a fifo. Such nodes are never opened.
    pub(crate) fn special(path: PathBuf, md: Metadata, depth: usize) -> DirEntry {
        DirEntry { path, md, depth, archive: None, content: false }
    }

    pub(crate) fn file(
        path: PathBuf,
        md: Metadata,
        depth: usize,
        archive: Option<ArchiveKind>,
    ) -> DirEntry {
        DirEntry { path, md, depth, archive, content: true }
    }

    /// The full logical path that this entry represents.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full logical path that this entry represents.
    ///
    /// Analogous to [`path`], but moves ownership of the path.
    ///
    /// [`path`]: #method.path
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Return the file name of this entry.
    pub fn file_name(&self) -> &OsStr {
        self.md.name()
    }

    /// Return the metadata reported by the enclosing container.
    ///
    /// This never makes any system calls.
    pub fn metadata(&self) -> &Metadata {
        &self.md
    }

    /// Return the file type of this entry.
    pub fn file_type(&self) -> FileType {
        self.md.file_type()
    }

    /// Returns the depth at which this entry was created relative to the root.
    ///
    /// The root has depth `0`. Every path segment below it adds one,
    /// including the segments inside archives.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if and only if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.md.is_dir()
    }

    /// The archive format named by this entry's suffix, if any.
    ///
    /// This is reported whether or not the walk descends into the archive.
    pub fn archive_kind(&self) -> Option<ArchiveKind> {
        self.archive
    }

    /// Returns true for directories and archives.
    ///
    /// An archive beyond [`WalkArchive::max_archive_depth`] is still a
    /// container even though the walk does not descend into it.
    ///
    /// [`WalkArchive::max_archive_depth`]: struct.WalkArchive.html#method.max_archive_depth
    pub fn is_container(&self) -> bool {
        self.is_dir() || self.archive.is_some()
    }

    /// Returns true if the cursor can [`read`] the content of this entry.
    ///
    /// [`read`]: struct.Cursor.html#impl-Read
    pub fn has_content(&self) -> bool {
        self.content
    }
}

impl fmt::Debug for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirEntry(path={:?}, type={:?}, depth={})", self.path, self.md.ty, self.depth)
    }
}

/// If the path has no file name (e.g., `/`), then the full path is used.
pub(crate) fn file_name_of(path: &Path) -> &OsStr {
    path.file_name().unwrap_or_else(|| path.as_os_str())
}
