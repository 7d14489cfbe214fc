use std::io;
use std::path::{Path, PathBuf};

use crate::wd::BoxError;

/// An error produced by walking a tree.
///
/// Most variants describe a failure tied to a single node: a directory that
/// could not be listed, a file that could not be opened, an archive that
/// could not be decoded. These are yielded by the cursor in place of the
/// entry and the walk carries on with the next node, unless the consumer
/// closes the cursor.
///
/// [`Error::Filter`] is different: it is produced when a filter aborts the
/// walk and it is always the last item the cursor yields. Use
/// [`is_fatal`] to tell the two apart.
///
/// # Example
///
/// ```no_run
/// use walkarchive::Cursor;
///
/// for entry in Cursor::new("foo") {
///     match entry {
///         Ok(ent) => println!("{}", ent.path().display()),
///         Err(err) if err.is_fatal() => return eprintln!("aborted: {}", err),
///         Err(err) => eprintln!("skipping: {}", err),
///     }
/// }
/// ```
///
/// [`is_fatal`]: #method.is_fatal
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The metadata of a node could not be read.
    #[error("unable to get metadata for {}: {source}", .path.display())]
    Metadata {
        /// The node.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A directory (or a directory inside a zip archive) could not be listed.
    #[error("unable to read directory {}: {source}", .path.display())]
    ReadDir {
        /// The directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A file could not be opened for reading.
    #[error("unable to open {}: {source}", .path.display())]
    Open {
        /// The file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A gzip stream could not be set up.
    #[error("unable to create gzip reader for {}: {source}", .path.display())]
    Gzip {
        /// The compressed archive.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A tar stream could not be parsed.
    #[error("unable to parse tar stream {}: {source}", .path.display())]
    Tar {
        /// The archive.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A zip archive could not be read into memory.
    #[error("unable to buffer zip archive {}: {source}", .path.display())]
    ZipBuffer {
        /// The archive.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The central directory of a zip archive could not be read.
    #[error("unable to read zip archive {}: {source}", .path.display())]
    ZipIndex {
        /// The archive.
        path: PathBuf,
        /// The error reported by the zip decoder.
        source: zip::result::ZipError,
    },
    /// A zip archive is larger than [`WalkArchive::max_zip_size`].
    ///
    /// [`WalkArchive::max_zip_size`]: struct.WalkArchive.html#method.max_zip_size
    #[error("zip archive {} exceeds {limit} bytes", .path.display())]
    ZipTooLarge {
        /// The archive.
        path: PathBuf,
        /// The configured limit.
        limit: u64,
    },
    /// A filter aborted the walk. Always the last item of a cursor.
    #[error("filter '{name}' aborted the walk at {}: {source}", .path.display())]
    Filter {
        /// Name the filter was registered under.
        name: String,
        /// Path of the entry the filter was looking at.
        path: PathBuf,
        /// The error returned by the filter.
        source: BoxError,
    },
    /// The current entry has no readable content.
    #[error("current entry has no readable content")]
    NoContent,
    /// The worker thread could not be started.
    #[error("unable to start walk: {0}")]
    Spawn(#[source] io::Error),
}

impl Error {
    /// Returns the path associated with this error, if one exists.
    ///
    /// For archive failures this is the path of the archive itself.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Metadata { path, .. }
            | Error::ReadDir { path, .. }
            | Error::Open { path, .. }
            | Error::Gzip { path, .. }
            | Error::Tar { path, .. }
            | Error::ZipBuffer { path, .. }
            | Error::ZipIndex { path, .. }
            | Error::ZipTooLarge { path, .. }
            | Error::Filter { path, .. } => Some(path),
            Error::NoContent | Error::Spawn(_) => None,
        }
    }

    /// Returns true if this error ended the walk.
    ///
    /// Per-entry errors return false: the cursor keeps yielding the
    /// following nodes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Filter { .. } | Error::Spawn(_))
    }

    /// Inspect the underlying I/O error if there is one.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Error::Metadata { source, .. }
            | Error::ReadDir { source, .. }
            | Error::Open { source, .. }
            | Error::Gzip { source, .. }
            | Error::Tar { source, .. }
            | Error::ZipBuffer { source, .. } => Some(source),
            Error::Spawn(source) => Some(source),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    /// Convert the [`Error`] to an [`io::Error`], preserving the original
    /// [`Error`] as the ["inner error"]. The kind is taken from the
    /// underlying I/O error when there is one.
    ///
    /// [`Error`]: enum.Error.html
    /// [`io::Error`]: https://doc.rust-lang.org/stable/std/io/struct.Error.html
    /// ["inner error"]: https://doc.rust-lang.org/std/io/struct.Error.html#method.into_inner
    fn from(walk_err: Error) -> io::Error {
        let kind = match &walk_err {
            Error::NoContent => io::ErrorKind::InvalidInput,
            Error::ZipIndex { .. } | Error::ZipTooLarge { .. } => io::ErrorKind::InvalidData,
            err => err.io_error().map(|e| e.kind()).unwrap_or(io::ErrorKind::Other),
        };
        io::Error::new(kind, walk_err)
    }
}
