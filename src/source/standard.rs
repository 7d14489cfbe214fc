use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::dent::Metadata;
use crate::source::{Container, Listing, Node, NodeError};
use crate::wd::IntoOk;

/// A directory on the real filesystem.
///
/// Symbolic links are listed with their own metadata and never descended
/// into; opening one reads its target.
#[derive(Debug)]
pub(crate) struct FsContainer {
    root: PathBuf,
}

impl FsContainer {
    pub(crate) fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn describe(&self, dent: io::Result<fs::DirEntry>, dir: &Path) -> Result<Node, NodeError> {
        let dent = dent.map_err(|err| NodeError { rel: dir.to_path_buf(), err })?;
        let rel = dir.join(dent.file_name());
        // Does not traverse symbolic links.
        match dent.metadata() {
            Ok(md) => Ok(Node { md: Metadata::from_fs(&rel, &md), rel, slot: None }),
            Err(err) => Err(NodeError { rel, err }),
        }
    }
}

impl Container for FsContainer {
    fn read_dir(&mut self, dir: &Path) -> io::Result<Listing> {
        let mut listing: Listing = fs::read_dir(self.root.join(dir))?
            .map(|dent| self.describe(dent, dir))
            .collect();
        listing.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
        listing.into_ok()
    }

    fn open(&mut self, node: &Node) -> io::Result<Box<dyn Read + '_>> {
        let file = fs::File::open(self.root.join(&node.rel))?;
        Ok(Box::new(file))
    }
}

fn sort_key(item: &Result<Node, NodeError>) -> &Path {
    match item {
        Ok(node) => &node.rel,
        Err(e) => &e.rel,
    }
}
