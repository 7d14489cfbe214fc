use std::collections::HashSet;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use crate::dent::{DirEntry, Metadata};
use crate::error::Error;
use crate::walk::Worker;
use crate::wd::{Flow, Step};

/// Walk a tar stream in header order.
///
/// Tar has no directory listing, so skip-recursion is emulated: the path
/// of every skip-recursed directory goes into `suppressed`, and any later
/// header below a suppressed path is consumed without being emitted.
/// Content not read by the consumer is skipped by `tar::Entries` before the
/// next header is parsed.
pub(crate) fn walk<R: Read>(
    worker: &mut Worker,
    stream: R,
    base: &Path,
    depth: usize,
    nesting: usize,
) -> Flow {
    let mut archive = tar::Archive::new(stream);
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(source) => return worker.emit_error(Error::Tar { path: base.to_path_buf(), source }),
    };
    let mut suppressed: HashSet<PathBuf> = HashSet::new();

    for entry in entries {
        let mut entry = match entry {
            Ok(entry) => entry,
            Err(source) => {
                return worker.emit_error(Error::Tar { path: base.to_path_buf(), source })
            }
        };
        let rel = match entry.path() {
            Ok(name) => normalize(&name),
            Err(source) => {
                return worker.emit_error(Error::Tar { path: base.to_path_buf(), source })
            }
        };
        // `./` and friends: the archive root, already emitted.
        if rel.as_os_str().is_empty() {
            continue;
        }
        let is_dir = entry.header().entry_type().is_dir();

        if is_suppressed(&suppressed, &rel) {
            if is_dir {
                suppressed.insert(rel);
            }
            continue;
        }

        let md = Metadata::from_tar(&rel, entry.header());
        let path = base.join(&rel);
        let node_depth = depth + rel.components().count();

        if is_dir {
            if worker.emit(Ok(DirEntry::dir(path, md, node_depth)), None)? == Step::SkipRecurse {
                suppressed.insert(rel);
            }
            continue;
        }

        if !md.file_type().is_file() {
            worker.emit(Ok(DirEntry::special(path, md, node_depth)), None)?;
            continue;
        }
        worker.visit_file(path, md, node_depth, nesting, &mut entry)?;
    }
    Ok(())
}

/// Reduce a header path to its normal components, so `./a/b/`, `/a/b` and
/// `a//b` all compare equal to `a/b`. `..` segments are dropped as well.
fn normalize(name: &Path) -> PathBuf {
    name.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

/// True if `rel` itself or one of its ancestors was skip-recursed.
///
/// Matching `rel` itself covers duplicate headers for a suppressed
/// directory.
fn is_suppressed(suppressed: &HashSet<PathBuf>, rel: &Path) -> bool {
    !suppressed.is_empty() && rel.ancestors().any(|dir| suppressed.contains(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize(Path::new("./a/b/")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("a//b")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("a"));
        assert_eq!(normalize(Path::new("./")), PathBuf::new());
    }

    #[test]
    fn suppression_covers_descendants_only() {
        let mut suppressed = HashSet::new();
        assert!(!is_suppressed(&suppressed, Path::new("skip/x.txt")));
        suppressed.insert(PathBuf::from("skip"));
        assert!(is_suppressed(&suppressed, Path::new("skip")));
        assert!(is_suppressed(&suppressed, Path::new("skip/x.txt")));
        assert!(is_suppressed(&suppressed, Path::new("skip/nested/y.txt")));
        assert!(!is_suppressed(&suppressed, Path::new("skipped.txt")));
        assert!(!is_suppressed(&suppressed, Path::new("other/skip")));
    }
}
