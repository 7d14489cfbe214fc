use std::path::{Path, PathBuf};

use crate::dent::DirEntry;
use crate::error::Error;
use crate::source::{Container, Node, NodeError};
use crate::walk::Worker;
use crate::wd::{Flow, Step};

/// Walk every node of `container` below its root, depth first.
///
/// The container root itself is not emitted: whoever called this already
/// emitted it (the root directory, or the archive file). `base` is the
/// logical path of the container root, `depth` its depth and `nesting` the
/// number of archives enclosing the container's nodes.
pub(crate) fn walk<C: Container + ?Sized>(
    worker: &mut Worker,
    container: &mut C,
    base: &Path,
    depth: usize,
    nesting: usize,
) -> Flow {
    walk_dir(worker, container, base, Path::new(""), depth, nesting)
}

fn walk_dir<C: Container + ?Sized>(
    worker: &mut Worker,
    container: &mut C,
    base: &Path,
    dir: &Path,
    depth: usize,
    nesting: usize,
) -> Flow {
    let listing = match container.read_dir(dir) {
        Ok(listing) => listing,
        Err(source) => return worker.emit_error(Error::ReadDir { path: join(base, dir), source }),
    };

    for item in listing {
        let node = match item {
            Ok(node) => node,
            Err(NodeError { rel, err }) => {
                worker.emit_error(Error::Metadata { path: join(base, &rel), source: err })?;
                continue;
            }
        };
        let path = join(base, &node.rel);
        let node_depth = depth + node.rel.components().count();

        if node.md.is_dir() {
            let ent = DirEntry::dir(path, node.md.clone(), node_depth);
            if worker.emit(Ok(ent), None)? == Step::Descend {
                walk_dir(worker, container, base, &node.rel, depth, nesting)?;
            }
            continue;
        }

        // Only regular files are opened: a link to a fifo would block.
        if !node.md.file_type().is_file() {
            worker.emit(Ok(DirEntry::special(path, node.md, node_depth)), None)?;
            continue;
        }
        visit_node(worker, container, &node, path, node_depth, nesting)?;
    }
    Ok(())
}

fn visit_node<C: Container + ?Sized>(
    worker: &mut Worker,
    container: &mut C,
    node: &Node,
    path: PathBuf,
    depth: usize,
    nesting: usize,
) -> Flow {
    let mut content = match container.open(node) {
        Ok(content) => content,
        Err(source) => return worker.emit_error(Error::Open { path, source }),
    };
    worker.visit_file(path, node.md.clone(), depth, nesting, &mut *content)
}

/// Logical path of a node: archive and directory segments alike.
fn join(base: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        base.to_path_buf()
    } else {
        base.join(rel)
    }
}
