use std::fmt;
use std::path::{Path, PathBuf};

use crate::cursor::Cursor;
use crate::iter::FilterChain;
use crate::dent::DirEntry;
use crate::wd::{FilterResult, Result};

/// Options shared with the worker thread.
#[derive(Clone, Debug)]
pub(crate) struct WalkArchiveOptions {
    pub descend_archives: bool,
    pub max_archive_depth: Option<usize>,
    pub max_zip_size: Option<u64>,
}

impl Default for WalkArchiveOptions {
    fn default() -> Self {
        Self { descend_archives: true, max_archive_depth: None, max_zip_size: None }
    }
}

/// A builder to create a [`Cursor`] over a directory tree and every archive
/// inside it.
///
/// Options can be chained; the walk starts when [`into_cursor`] (or
/// `into_iter`) is called.
///
/// # Example
///
/// ```no_run
/// use walkarchive::{Verdict, WalkArchive};
/// # use walkarchive::Error;
///
/// # fn try_main() -> Result<(), Error> {
/// let cursor = WalkArchive::new("foo")
///     .max_archive_depth(2)
///     .filter("no-git", |visit| match visit {
///         Ok(ent) if ent.file_name() == ".git" => Ok(Verdict::Prune),
///         _ => Ok(Verdict::Continue),
///     })
///     .into_cursor();
/// for entry in cursor {
///     println!("{}", entry?.path().display());
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`Cursor`]: struct.Cursor.html
/// [`into_cursor`]: #method.into_cursor
pub struct WalkArchive {
    root: PathBuf,
    opts: WalkArchiveOptions,
    filters: FilterChain,
}

impl WalkArchive {
    /// Create a builder for a recursive walk starting at the file path
    /// `root`. `root` may be a directory or a single file; if it is an
    /// archive, the walk descends into it.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            opts: WalkArchiveOptions::default(),
            filters: FilterChain::default(),
        }
    }

    /// Descend into archives found during the walk.
    ///
    /// This is enabled by default. When disabled, archives are yielded as
    /// plain files.
    pub fn descend_archives(mut self, yes: bool) -> Self {
        self.opts.descend_archives = yes;
        self
    }

    /// Set the maximum number of nested archive levels to descend into.
    ///
    /// An archive on the real filesystem is at level 1, an archive inside it
    /// at level 2, and so on. Archives beyond the limit are yielded as plain
    /// files. `0` disables archive descent entirely. No limit by default.
    pub fn max_archive_depth(mut self, depth: usize) -> Self {
        self.opts.max_archive_depth = Some(depth);
        self
    }

    /// Set the largest zip archive, in bytes, that may be buffered.
    ///
    /// Zip archives must be read into memory completely before their
    /// members can be listed. Larger archives are reported as an
    /// [`Error::ZipTooLarge`] entry and not descended into. No limit by
    /// default.
    ///
    /// [`Error::ZipTooLarge`]: enum.Error.html#variant.ZipTooLarge
    pub fn max_zip_size(mut self, bytes: u64) -> Self {
        self.opts.max_zip_size = Some(bytes);
        self
    }

    /// Register a filter before the walk starts.
    ///
    /// See [`Cursor::register_filter`].
    ///
    /// [`Cursor::register_filter`]: struct.Cursor.html#method.register_filter
    pub fn filter<N, F>(mut self, name: N, filter: F) -> Self
    where
        N: Into<String>,
        F: FnMut(&Result<DirEntry>) -> FilterResult + Send + 'static,
    {
        self.filters.register(name.into(), Box::new(filter));
        self
    }

    /// Start the walk.
    pub fn into_cursor(self) -> Cursor {
        Cursor::start(self.root, self.opts, self.filters)
    }
}

impl IntoIterator for WalkArchive {
    type Item = Result<DirEntry>;
    type IntoIter = Cursor;

    fn into_iter(self) -> Cursor {
        self.into_cursor()
    }
}

impl fmt::Debug for WalkArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkArchive")
            .field("root", &self.root)
            .field("opts", &self.opts)
            .field("filters", &self.filters)
            .finish()
    }
}
