/*!
Random-access containers the directory walker can descend into.

A container is anything that can list the children of a directory by path
and open a child for reading: the real filesystem ([`FsContainer`]) or the
in-memory index of a zip archive. Sequential formats (tar) do not fit this
shape and have their own walker.

[`FsContainer`]: struct.FsContainer.html
*/

mod standard;

pub(crate) use self::standard::FsContainer;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::dent::Metadata;

/// A child listed by [`Container::read_dir`].
#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// Path relative to the container root.
    pub rel: PathBuf,
    /// Metadata of the child.
    pub md: Metadata,
    /// Container-specific handle used by [`Container::open`].
    pub slot: Option<usize>,
}

/// A child that could not be described. Reported as an error entry on
/// `rel`.
#[derive(Debug)]
pub(crate) struct NodeError {
    pub rel: PathBuf,
    pub err: io::Error,
}

/// Listing of one directory: children in walk order.
pub(crate) type Listing = Vec<Result<Node, NodeError>>;

/// A hierarchical container with random access to its nodes.
pub(crate) trait Container {
    /// List the children of the directory at `dir` (relative to the
    /// container root, the empty path being the root itself), sorted by
    /// name.
    fn read_dir(&mut self, dir: &Path) -> io::Result<Listing>;

    /// Open a non-directory node for reading.
    fn open(&mut self, node: &Node) -> io::Result<Box<dyn Read + '_>>;
}
