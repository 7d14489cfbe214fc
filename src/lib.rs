/*!
Crate `walkarchive` walks a directory tree depth first and descends
transparently into the archives it finds along the way: zip files, plain tar
files, and gzip or bzip2 compressed tarballs. Members of an archive are
yielded as if the archive were a directory, and archives nested inside
archives are walked too.

To use this crate, add `walkarchive` as a dependency to your project's
`Cargo.toml`:

```toml
[dependencies]
walkarchive = "0.1"
```

# From the top

The [`WalkArchive`] type configures a walk and builds a [`Cursor`]. The
[`Cursor`] is an iterator over [`DirEntry`] values, and also an
[`io::Read`] over the content of the entry it yielded last. The [`Error`]
type describes per-entry failures, such as a corrupt archive, as well as
the failures that end a walk.

Entries are produced lazily by a worker thread that runs in lockstep with
the cursor: nothing is read ahead of the consumer.

[`WalkArchive`]: struct.WalkArchive.html
[`Cursor`]: struct.Cursor.html
[`DirEntry`]: struct.DirEntry.html
[`Error`]: enum.Error.html
[`io::Read`]: https://doc.rust-lang.org/stable/std/io/trait.Read.html

# Example

The following code recursively iterates over the directory given, and every
archive inside it, and prints the path of each entry:

```no_run
use walkarchive::Cursor;
# use walkarchive::Error;

# fn try_main() -> Result<(), Error> {
for entry in Cursor::new("foo") {
    println!("{}", entry?.path().display());
}
# Ok(())
# }
```

A corrupt archive shows up as a single error in place of its members, and
the walk carries on. To ignore such errors, use [`filter_map`]:

```no_run
use walkarchive::Cursor;

for entry in Cursor::new("foo").filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
}
```

[`filter_map`]: https://doc.rust-lang.org/stable/std/iter/trait.Iterator.html#method.filter_map

# Example: read the content of archive members

```no_run
use std::io::Read;

use walkarchive::Cursor;

# fn try_main() -> Result<(), Box<dyn std::error::Error>> {
let mut cursor = Cursor::new("logs.tar.gz");
while let Some(entry) = cursor.next() {
    let entry = entry?;
    if entry.has_content() {
        let mut text = String::new();
        cursor.read_to_string(&mut text)?;
        println!("{}: {} lines", entry.path().display(), text.lines().count());
    }
}
# Ok(())
# }
```

# Example: skip hidden directories

Filters see every entry before it is yielded. [`Verdict::Prune`] drops an
entry together with everything below it, without descending into it:

```no_run
use walkarchive::{Verdict, WalkArchive};
# use walkarchive::Error;

# fn try_main() -> Result<(), Error> {
let walker = WalkArchive::new("foo").filter("hidden", |visit| match visit {
    Ok(ent) if ent.file_name().to_string_lossy().starts_with('.') => Ok(Verdict::Prune),
    _ => Ok(Verdict::Continue),
});
for entry in walker {
    println!("{}", entry?.path().display());
}
# Ok(())
# }
```

[`Verdict::Prune`]: enum.Verdict.html#variant.Prune
*/

#![deny(missing_docs)]
#![allow(unknown_lints)]

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

mod wd;
mod dent;
mod source;
mod dir;
mod archive;
mod opts;
mod walk;
mod iter;
mod cursor;
mod error;
#[cfg(test)]
mod tests;

pub use crate::error::Error;
pub use crate::dent::{DirEntry, FileType, Metadata};
pub use crate::archive::ArchiveKind;
pub use crate::cursor::Cursor;
pub use crate::opts::WalkArchive;
pub use crate::wd::{BoxError, FilterResult, Result, Verdict};
