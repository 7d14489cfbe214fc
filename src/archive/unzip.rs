use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::dent::{FileType, Metadata};
use crate::dir;
use crate::error::Error;
use crate::source::{Container, Listing, Node};
use crate::walk::Worker;
use crate::wd::{Flow, IntoOk};

/// Walk a zip archive.
///
/// The central directory sits at the end of the file, so the whole stream
/// is buffered before anything can be listed. Failures to buffer or to
/// read the central directory are reported once, on the archive's path.
pub(crate) fn walk(
    worker: &mut Worker,
    stream: &mut dyn Read,
    base: &Path,
    depth: usize,
    nesting: usize,
) -> Flow {
    let buf = match buffer(stream, worker.opts().max_zip_size) {
        Ok(Some(buf)) => buf,
        Ok(None) => {
            let limit = worker.opts().max_zip_size.unwrap_or(u64::MAX);
            return worker.emit_error(Error::ZipTooLarge { path: base.to_path_buf(), limit });
        }
        Err(source) => {
            return worker.emit_error(Error::ZipBuffer { path: base.to_path_buf(), source })
        }
    };
    let mut container = match ZipContainer::new(buf) {
        Ok(container) => container,
        Err(source) => {
            return worker.emit_error(Error::ZipIndex { path: base.to_path_buf(), source })
        }
    };
    debug!(path = %base.display(), members = container.len(), "zip index built");
    dir::walk(worker, &mut container, base, depth, nesting)
}

/// Read the whole stream. `Ok(None)` if it is larger than `limit`.
fn buffer(stream: &mut dyn Read, limit: Option<u64>) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    match limit {
        Some(limit) => {
            Read::take(stream, limit.saturating_add(1)).read_to_end(&mut buf)?;
            if buf.len() as u64 > limit {
                return Ok(None);
            }
        }
        None => {
            stream.read_to_end(&mut buf)?;
        }
    }
    Ok(Some(buf))
}

/////////////////////////////////////////////////////////////////////////
//// ZipContainer

/// Random-access view of a buffered zip archive.
///
/// Members are indexed by directory up front. Directories that only exist
/// implicitly, as a prefix of some member name, are synthesized.
pub(crate) struct ZipContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// Children of each directory, keyed by name so listings come out
    /// sorted.
    dirs: BTreeMap<PathBuf, BTreeMap<OsString, Node>>,
}

impl ZipContainer {
    pub(crate) fn new(buf: Vec<u8>) -> zip::result::ZipResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(buf))?;
        let mut dirs: BTreeMap<PathBuf, BTreeMap<OsString, Node>> = BTreeMap::new();
        dirs.insert(PathBuf::new(), BTreeMap::new());

        for index in 0..archive.len() {
            let member = archive.by_index_raw(index)?;
            let rel = normalize(member.name());
            let name = match rel.file_name() {
                Some(name) => name.to_os_string(),
                None => continue,
            };
            let ty = if member.is_dir() { FileType::Dir } else { FileType::File };
            let md = Metadata::new(name.clone(), ty, member.size()).with_mode(member.unix_mode());
            let parent = rel.parent().map(Path::to_path_buf).unwrap_or_default();

            insert_parents(&mut dirs, &parent);
            if ty.is_dir() {
                dirs.entry(rel.clone()).or_default();
            }
            // Duplicate names: the first member wins.
            dirs.entry(parent)
                .or_default()
                .entry(name)
                .or_insert(Node { rel, md, slot: Some(index) });
        }
        Ok(Self { archive, dirs })
    }

    fn len(&self) -> usize {
        self.archive.len()
    }
}

/// Make sure every ancestor of `dir` is listed in its own parent.
fn insert_parents(dirs: &mut BTreeMap<PathBuf, BTreeMap<OsString, Node>>, dir: &Path) {
    let mut cur = dir;
    while let (Some(name), Some(parent)) = (cur.file_name(), cur.parent()) {
        dirs.entry(cur.to_path_buf()).or_default();
        let node = Node {
            rel: cur.to_path_buf(),
            md: Metadata::new(name.to_os_string(), FileType::Dir, 0),
            slot: None,
        };
        dirs.entry(parent.to_path_buf()).or_default().entry(name.to_os_string()).or_insert(node);
        cur = parent;
    }
}

impl Container for ZipContainer {
    fn read_dir(&mut self, dir: &Path) -> io::Result<Listing> {
        match self.dirs.get(dir) {
            Some(children) => children.values().cloned().map(Ok).collect::<Listing>().into_ok(),
            None => {
                Err(io::Error::new(io::ErrorKind::NotFound, "no such directory in zip archive"))
            }
        }
    }

    fn open(&mut self, node: &Node) -> io::Result<Box<dyn Read + '_>> {
        let index = node.slot.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "synthesized directory has no content")
        })?;
        let member = self.archive.by_index(index).map_err(io::Error::from)?;
        Ok(Box::new(member))
    }
}

/// Zip names always use `/`. Keep only the normal components.
fn normalize(name: &str) -> PathBuf {
    Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}
