use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

use crate::archive::{self, ArchiveKind};
use crate::dent::{file_name_of, DirEntry, Metadata};
use crate::dir;
use crate::error::Error;
use crate::opts::WalkArchiveOptions;
use crate::source::FsContainer;
use crate::wd::{Closed, Flow, Instruction, Reply, Step, Visit};

/////////////////////////////////////////////////////////////////////////
//// Worker

/// The producer side of a cursor.
///
/// Runs on its own thread and performs the whole depth-first descent. Every
/// entry it sends is followed by a blocking wait for the next instruction,
/// so the consumer steers the walk one step at a time and at most one
/// content reader is open.
#[derive(Debug)]
pub(crate) struct Worker {
    opts: WalkArchiveOptions,
    tx: Sender<Reply>,
    rx: Receiver<Instruction>,
}

impl Worker {
    pub(crate) fn new(
        opts: WalkArchiveOptions,
        tx: Sender<Reply>,
        rx: Receiver<Instruction>,
    ) -> Self {
        Self { opts, tx, rx }
    }

    /// Walk `root` until the tree is exhausted or the cursor is closed.
    /// Dropping `self` afterwards disconnects both channels, which the
    /// cursor reads as end-of-sequence.
    pub(crate) fn run(mut self, root: PathBuf) {
        debug!(root = %root.display(), "walk started");
        match self.walk_root(&root) {
            Ok(()) => debug!(root = %root.display(), "walk finished"),
            Err(Closed) => debug!(root = %root.display(), "walk closed"),
        }
    }

    fn walk_root(&mut self, root: &Path) -> Flow {
        // Nothing happens before the consumer asks for the first entry.
        self.wait(None)?;

        let md = match fs::metadata(root) {
            Ok(md) => md,
            Err(source) => {
                return self.emit_error(Error::Metadata { path: root.to_path_buf(), source })
            }
        };
        let meta = Metadata::from_fs(root, &md);

        if !md.is_dir() && !md.is_file() {
            return self.emit(Ok(DirEntry::special(root.to_path_buf(), meta, 0)), None).map(|_| ());
        }
        if md.is_file() {
            let mut file = match fs::File::open(root) {
                Ok(file) => file,
                Err(source) => {
                    return self.emit_error(Error::Open { path: root.to_path_buf(), source })
                }
            };
            return self.visit_file(root.to_path_buf(), meta, 0, 0, &mut file);
        }

        if self.emit(Ok(DirEntry::dir(root.to_path_buf(), meta, 0)), None)? == Step::SkipRecurse {
            return Ok(());
        }
        let mut container = FsContainer::new(root);
        dir::walk(self, &mut container, root, 0, 0)
    }

    /// Emit a regular file with its content, then descend into it if its
    /// suffix names an archive and the consumer did not skip-recurse.
    ///
    /// `nesting` is the number of archives enclosing the file.
    pub(crate) fn visit_file(
        &mut self,
        path: PathBuf,
        md: Metadata,
        depth: usize,
        nesting: usize,
        content: &mut dyn Read,
    ) -> Flow {
        let kind = ArchiveKind::detect(file_name_of(&path));
        let descend = kind.is_some() && self.may_descend(nesting);
        let mut replay = Replay::new(content, descend);

        let step = self.emit(Ok(DirEntry::file(path.clone(), md, depth, kind)), Some(&mut replay))?;
        match kind {
            Some(kind) if descend && step == Step::Descend => {
                debug!(path = %path.display(), ?kind, "descending into archive");
                let mut stream = replay.into_stream();
                archive::descend(self, kind, &mut stream, &path, depth, nesting + 1)
            }
            Some(kind) if !descend => {
                trace!(path = %path.display(), ?kind, nesting, "archive not descended");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Whether an archive enclosed by `nesting` archives may be opened.
    fn may_descend(&self, nesting: usize) -> bool {
        self.opts.descend_archives && self.opts.max_archive_depth.map_or(true, |max| nesting < max)
    }

    pub(crate) fn opts(&self) -> &WalkArchiveOptions {
        &self.opts
    }

    /// Send an entry, then wait for the consumer's instruction about it.
    ///
    /// While waiting, read requests are served from `content`.
    pub(crate) fn emit(&mut self, visit: Visit, content: Option<&mut dyn Read>) -> Flow<Step> {
        match &visit {
            Ok(ent) => trace!(path = %ent.path().display(), "emit"),
            Err(err) => debug!(%err, "emit error entry"),
        }
        self.tx.send(Reply::Entry(visit)).map_err(|_| Closed)?;
        self.wait(content)
    }

    /// Emit an error entry. Skip-recursion is meaningless for it.
    pub(crate) fn emit_error(&mut self, err: Error) -> Flow {
        self.emit(Err(err), None).map(|_| ())
    }

    /// Block until the consumer says how to proceed.
    fn wait(&mut self, mut content: Option<&mut dyn Read>) -> Flow<Step> {
        loop {
            match self.rx.recv() {
                Ok(Instruction::Continue) => return Ok(Step::Descend),
                Ok(Instruction::SkipRecurse) => return Ok(Step::SkipRecurse),
                Ok(Instruction::Close) | Err(_) => return Err(Closed),
                Ok(Instruction::Read(buf)) => {
                    let data = match content.as_mut() {
                        Some(reader) => fill(reader, buf),
                        None => Err(Error::NoContent.into()),
                    };
                    self.tx.send(Reply::Data(data)).map_err(|_| Closed)?;
                }
            }
        }
    }
}

fn fill<R: Read + ?Sized>(reader: &mut R, mut buf: Vec<u8>) -> io::Result<Vec<u8>> {
    let n = loop {
        match reader.read(&mut buf) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            res => break res?,
        }
    };
    buf.truncate(n);
    Ok(buf)
}

/////////////////////////////////////////////////////////////////////////
//// Replay

/// Content reader handed to the consumer.
///
/// For archives the bytes the consumer reads are kept, so that descending
/// into the archive afterwards still sees the whole stream.
struct Replay<'r> {
    inner: &'r mut dyn Read,
    seen: Option<Vec<u8>>,
}

impl<'r> Replay<'r> {
    fn new(inner: &'r mut dyn Read, keep: bool) -> Self {
        Self { inner, seen: if keep { Some(Vec::new()) } else { None } }
    }

    fn into_stream(self) -> io::Chain<io::Cursor<Vec<u8>>, &'r mut dyn Read> {
        io::Cursor::new(self.seen.unwrap_or_default()).chain(self.inner)
    }
}

impl<'r> Read for Replay<'r> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(seen) = self.seen.as_mut() {
            seen.extend_from_slice(&buf[..n]);
        }
        Ok(n)
    }
}
