use std::fs;
use std::io::{self, Cursor as IoCursor, Write};
use std::path::{Path, PathBuf};

use crate::{DirEntry, Result};

/// A member of a generated archive. `None` content means a directory.
pub type Member<'a> = (&'a str, Option<&'a [u8]>);

/// A temporary directory that is removed when dropped.
#[derive(Debug)]
pub struct Dir {
    dir: tempfile::TempDir,
}

impl Dir {
    pub fn tmp() -> Dir {
        Dir { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.path().join(path)
    }

    pub fn touch<P: AsRef<Path>>(&self, path: P, data: &[u8]) {
        let path = self.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, data).expect("write file");
    }
}

pub fn tar(members: &[Member<'_>]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        match data {
            Some(data) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(data.len() as u64);
                builder.append_data(&mut header, name, *data).expect("tar file");
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, name, io::empty()).expect("tar dir");
            }
        }
    }
    builder.into_inner().expect("tar finish")
}

pub fn zip(members: &[Member<'_>]) -> Vec<u8> {
    let opts = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    let mut zw = zip::ZipWriter::new(IoCursor::new(Vec::new()));
    for (name, data) in members {
        match data {
            Some(data) => {
                zw.start_file(*name, opts).expect("zip file");
                zw.write_all(data).expect("zip write");
            }
            None => zw.add_directory(*name, opts).expect("zip dir"),
        }
    }
    zw.finish().expect("zip finish").into_inner()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).expect("gzip write");
    enc.finish().expect("gzip finish")
}

pub fn bzip2(data: &[u8]) -> Vec<u8> {
    let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    enc.write_all(data).expect("bzip2 write");
    enc.finish().expect("bzip2 finish")
}

/// Path of an item relative to `root`. Error items are prefixed with `!`.
pub fn rel(root: &Path, item: &Result<DirEntry>) -> String {
    let (prefix, path) = match item {
        Ok(ent) => ("", ent.path()),
        Err(err) => ("!", err.path().expect("error with a path")),
    };
    let rel = path.strip_prefix(root).expect("path below root");
    format!("{}{}", prefix, rel.to_string_lossy())
}

/// Drain a walk, keeping relative paths.
pub fn walk<I>(root: &Path, it: I) -> Vec<String>
where
    I: IntoIterator<Item = Result<DirEntry>>,
{
    it.into_iter().map(|item| rel(root, &item)).collect()
}
