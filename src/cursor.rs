use std::fmt;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, warn};

use crate::dent::DirEntry;
use crate::error::Error;
use crate::iter::{Abort, FilterChain};
use crate::opts::{WalkArchive, WalkArchiveOptions};
use crate::walk::Worker;
use crate::wd::{FilterResult, Instruction, IntoSome, Reply, Result, Verdict, Visit};

/// Largest number of bytes moved from the worker per read request.
const READ_CHUNK: usize = 64 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Running,
    Closed,
}

/////////////////////////////////////////////////////////////////////////
//// Cursor

/// A lazy, depth-first walk over a directory tree and the archives inside
/// it.
///
/// Entries are produced one at a time by a worker thread that only moves
/// when the cursor asks for the next entry, so memory use does not depend
/// on the size of the tree.
///
/// A cursor is also an [`io::Read`]: between two calls to `next` it reads
/// the content of the entry last yielded, if that entry is a file. Reading
/// a directory or after an error entry fails with [`Error::NoContent`].
///
/// The walk ends when the tree is exhausted, when a filter aborts it, or
/// when [`close`] is called. Dropping the cursor closes it.
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
///
/// use walkarchive::Cursor;
///
/// # fn try_main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut cursor = Cursor::new("backups");
/// while let Some(entry) = cursor.next() {
///     let entry = entry?;
///     if entry.file_name() == "MANIFEST" {
///         let mut manifest = String::new();
///         cursor.read_to_string(&mut manifest)?;
///         println!("{}: {}", entry.path().display(), manifest.trim());
///     }
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`io::Read`]: https://doc.rust-lang.org/stable/std/io/trait.Read.html
/// [`Error::NoContent`]: enum.Error.html#variant.NoContent
/// [`close`]: #method.close
pub struct Cursor {
    tx: Sender<Instruction>,
    rx: Receiver<Reply>,
    handle: Option<JoinHandle<()>>,
    state: State,
    /// Instruct the worker not to descend into the entry last fetched.
    skip_recurse: bool,
    /// The entry last yielded has content the worker can read.
    readable: bool,
    /// Read buffer, passed back and forth with the worker.
    chunk: Vec<u8>,
    /// Reported once by `next` if the worker could not be started.
    failure: Option<Error>,
    filters: FilterChain,
}

impl Cursor {
    /// Walk `root` with default options and no filters.
    ///
    /// This is a shortcut for `WalkArchive::new(root).into_cursor()`.
    pub fn new<P: AsRef<Path>>(root: P) -> Cursor {
        WalkArchive::new(root).into_cursor()
    }

    pub(crate) fn start(root: PathBuf, opts: WalkArchiveOptions, filters: FilterChain) -> Cursor {
        let (tx, worker_rx) = crossbeam_channel::bounded(0);
        let (worker_tx, rx) = crossbeam_channel::bounded(0);
        let worker = Worker::new(opts, worker_tx, worker_rx);

        let mut cursor = Cursor {
            tx,
            rx,
            handle: None,
            state: State::Running,
            skip_recurse: false,
            readable: false,
            chunk: Vec::new(),
            failure: None,
            filters,
        };
        let spawned = thread::Builder::new()
            .name("walkarchive".to_string())
            .spawn(move || worker.run(root));
        match spawned {
            Ok(handle) => cursor.handle = Some(handle),
            Err(err) => {
                warn!(%err, "unable to spawn walk thread");
                cursor.state = State::Closed;
                cursor.failure = Some(Error::Spawn(err));
            }
        }
        cursor
    }

    /// Register a filter under `name`.
    ///
    /// Filters see every entry, and every error entry, before it is yielded.
    /// They run in registration order and the first one that returns
    /// something other than [`Verdict::Continue`] decides. A filter that
    /// returns `Err` aborts the walk: the cursor yields an [`Error::Filter`]
    /// and then ends.
    ///
    /// Registering a name that is already taken replaces that filter and
    /// keeps its place in the order. The change applies from the next entry
    /// on.
    ///
    /// [`Verdict::Continue`]: enum.Verdict.html#variant.Continue
    /// [`Error::Filter`]: enum.Error.html#variant.Filter
    pub fn register_filter<N, F>(&mut self, name: N, filter: F)
    where
        N: Into<String>,
        F: FnMut(&Result<DirEntry>) -> FilterResult + Send + 'static,
    {
        self.filters.register(name.into(), Box::new(filter));
    }

    /// Remove the filter registered under `name`. Returns false if there
    /// was none.
    pub fn unregister_filter(&mut self, name: &str) -> bool {
        self.filters.unregister(name)
    }

    /// Names of the registered filters, in evaluation order.
    pub fn filter_names(&self) -> Vec<String> {
        self.filters.names().map(str::to_string).collect()
    }

    /// Stop the walk and wait for the worker thread to finish.
    ///
    /// Afterwards `next` returns `None`. Calling `close` again does
    /// nothing.
    pub fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        self.state = State::Closed;
        self.readable = false;
        // The worker may already be gone.
        let _ = self.tx.send(Instruction::Close);
        self.join();
        debug!("cursor closed");
    }

    /// The worker went away on its own: the tree is exhausted.
    fn finish(&mut self) {
        self.state = State::Closed;
        self.readable = false;
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("walk thread panicked");
            }
        }
    }

    /// Ask the worker for the next entry, unfiltered.
    fn fetch(&mut self) -> Option<Visit> {
        self.readable = false;
        let instruction = if mem::replace(&mut self.skip_recurse, false) {
            Instruction::SkipRecurse
        } else {
            Instruction::Continue
        };
        if self.tx.send(instruction).is_err() {
            self.finish();
            return None;
        }
        match self.rx.recv() {
            Ok(Reply::Entry(visit)) => Some(visit),
            Ok(Reply::Data(_)) => {
                warn!("unexpected data reply, closing walk");
                self.close();
                None
            }
            Err(_) => {
                self.finish();
                None
            }
        }
    }

    fn surface(&mut self, visit: Visit) -> Option<Result<DirEntry>> {
        self.readable = matches!(&visit, Ok(ent) if ent.has_content());
        visit.into_some()
    }

    fn abort(&mut self, visit: &Visit, abort: Abort) -> Error {
        let path = match visit {
            Ok(ent) => ent.path().to_path_buf(),
            Err(err) => err.path().map(Path::to_path_buf).unwrap_or_default(),
        };
        debug!(filter = %abort.name, path = %path.display(), "filter aborted walk");
        self.close();
        Error::Filter { name: abort.name, path, source: abort.source }
    }
}

impl Iterator for Cursor {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Result<DirEntry>> {
        if let Some(err) = self.failure.take() {
            return Some(Err(err));
        }
        if self.state == State::Closed {
            return None;
        }
        loop {
            let visit = self.fetch()?;
            match self.filters.evaluate(&visit) {
                Ok(Verdict::Continue) => return self.surface(visit),
                Ok(Verdict::Skip) => continue,
                Ok(Verdict::SkipRecurse) => {
                    self.skip_recurse = true;
                    return self.surface(visit);
                }
                Ok(Verdict::Prune) => {
                    self.skip_recurse = true;
                    continue;
                }
                Err(abort) => return Some(Err(self.abort(&visit, abort))),
            }
        }
    }
}

impl io::Read for Cursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.readable {
            return Err(Error::NoContent.into());
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let mut chunk = mem::take(&mut self.chunk);
        chunk.resize(buf.len().min(READ_CHUNK), 0);
        if self.tx.send(Instruction::Read(chunk)).is_err() {
            self.readable = false;
            return Err(gone());
        }
        match self.rx.recv() {
            Ok(Reply::Data(Ok(data))) => {
                let n = data.len();
                buf[..n].copy_from_slice(&data);
                self.chunk = data;
                Ok(n)
            }
            Ok(Reply::Data(Err(err))) => Err(err),
            Ok(Reply::Entry(_)) | Err(_) => {
                self.readable = false;
                Err(gone())
            }
        }
    }
}

fn gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "walk ended while reading entry content")
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("state", &self.state)
            .field("readable", &self.readable)
            .field("filters", &self.filters)
            .finish()
    }
}
