use crate::dent::DirEntry;
use crate::error::Error;

/// A result type for walkarchive operations.
///
/// Note that this result type embeds the error type in this crate. This
/// is only useful if you care about the additional information provided by
/// the error (such as the path associated with the error). If you want things
/// to Just Work, then you can use [`io::Result`] instead since the error type
/// in this package will automatically convert to an [`io::Result`] when using
/// the `?` operator.
///
/// [`io::Result`]: https://doc.rust-lang.org/stable/std/io/type.Result.html
pub type Result<T> = ::std::result::Result<T, Error>;

/// Error type returned by filters to abort a walk.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a filter returns. `Err` aborts the walk.
pub type FilterResult = ::std::result::Result<Verdict, BoxError>;

/// One step of the walk as seen by the consumer: an entry or a per-entry
/// error.
pub(crate) type Visit = Result<DirEntry>;

/////////////////////////////////////////////////////////////////////////
//// Control protocol

/// Instruction sent from the cursor to the worker.
#[derive(Debug)]
pub(crate) enum Instruction {
    /// Proceed normally, descending into the entry just emitted.
    Continue,
    /// Do not descend into the entry just emitted. Ignored for plain files.
    SkipRecurse,
    /// Stop the walk as soon as possible.
    Close,
    /// Fill the buffer from the content of the entry just emitted. The
    /// buffer's length is the number of bytes requested.
    Read(Vec<u8>),
}

/// Message sent from the worker to the cursor.
#[derive(Debug)]
pub(crate) enum Reply {
    /// The next entry of the walk.
    Entry(Visit),
    /// Answer to [`Instruction::Read`]. The buffer is truncated to the
    /// number of bytes read.
    Data(std::io::Result<Vec<u8>>),
}

/// What the worker does after an emitted entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Descend,
    SkipRecurse,
}

/// The consumer closed the cursor or went away. Unwinds the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Closed;

/// Result of every worker operation that crosses a protocol boundary.
pub(crate) type Flow<T = ()> = ::std::result::Result<T, Closed>;

/// Outcome of a filter for a single entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to do, hand the entry to the next filter.
    Continue,
    /// Drop this entry and fetch the next one. Directories and archives are
    /// still descended into.
    Skip,
    /// Surface this entry but, if it is a directory or an archive, do not
    /// descend into it.
    SkipRecurse,
    /// Drop this entry and, if it is a directory or an archive, its whole
    /// subtree.
    Prune,
}

/// Like `Some(..)`, but chainable.
pub(crate) trait IntoSome: Sized {
    fn into_some(self) -> Option<Self> {
        Some(self)
    }
}

impl<T> IntoSome for T {}

/// Like `Ok(..)`, but chainable.
pub(crate) trait IntoOk: Sized {
    fn into_ok<E>(self) -> ::std::result::Result<Self, E> {
        Ok(self)
    }
}

impl<T> IntoOk for T {}
