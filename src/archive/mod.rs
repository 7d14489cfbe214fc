/*!
Archive formats the walk can descend into.

Detection is purely by case-insensitive file name suffix; content is never
sniffed to decide the format. Compressed tar streams go through a
decompression adapter before reaching the tar walker.
*/

mod untar;
mod unzip;

use std::ffi::OsStr;
use std::io::{self, BufReader, Read};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;

use crate::error::Error;
use crate::walk::Worker;
use crate::wd::Flow;

/// gzip magic bytes (RFC 1952).
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Archive container kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// `.zip`
    Zip,
    /// `.tar`
    Tar,
    /// `.tgz` or `.tar.gz`
    TarGz,
    /// `.tbz` or `.tar.bz2`
    TarBz2,
}

impl ArchiveKind {
    /// Detect the archive kind from a file name.
    ///
    /// Returns `None` if no recognized suffix matches, or if the name is not
    /// valid UTF-8.
    ///
    /// ```
    /// use walkarchive::ArchiveKind;
    ///
    /// assert_eq!(ArchiveKind::detect("LOGS.TAR.GZ".as_ref()), Some(ArchiveKind::TarGz));
    /// assert_eq!(ArchiveKind::detect("notes.gz".as_ref()), None);
    /// ```
    pub fn detect(name: &OsStr) -> Option<ArchiveKind> {
        let name = name.to_str()?.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tbz") || name.ends_with(".tar.bz2") {
            Some(ArchiveKind::TarBz2)
        } else {
            None
        }
    }
}

/// Walk the archive whose raw bytes are `stream`.
///
/// The archive entry itself has already been emitted at `path`. Failure to
/// set up a decompression adapter is reported as an error entry on `path`
/// and the archive is not descended into.
pub(crate) fn descend(
    worker: &mut Worker,
    kind: ArchiveKind,
    stream: &mut dyn Read,
    path: &Path,
    depth: usize,
    nesting: usize,
) -> Flow {
    match kind {
        ArchiveKind::Zip => unzip::walk(worker, stream, path, depth, nesting),
        ArchiveKind::Tar => untar::walk(worker, stream, path, depth, nesting),
        ArchiveKind::TarGz => match gzip(stream) {
            Ok(decoder) => untar::walk(worker, decoder, path, depth, nesting),
            Err(source) => worker.emit_error(Error::Gzip { path: path.to_path_buf(), source }),
        },
        ArchiveKind::TarBz2 => {
            untar::walk(worker, bzip2::read::BzDecoder::new(stream), path, depth, nesting)
        }
    }
}

type Replayed<R> = io::Chain<io::Cursor<Vec<u8>>, R>;

/// Check the gzip magic before handing the stream to the decoder, so a
/// stream that is not gzip at all fails here rather than as a tar error.
///
/// The magic is read with as many reads as it takes: a replayed stream
/// may hand it out one byte at a time.
fn gzip<R: Read>(mut stream: R) -> io::Result<MultiGzDecoder<BufReader<Replayed<R>>>> {
    let mut magic = Vec::with_capacity(GZIP_MAGIC.len());
    Read::take(Read::by_ref(&mut stream), GZIP_MAGIC.len() as u64).read_to_end(&mut magic)?;
    if magic[..] != GZIP_MAGIC[..] {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"));
    }
    Ok(MultiGzDecoder::new(BufReader::new(io::Cursor::new(magic).chain(stream))))
}
