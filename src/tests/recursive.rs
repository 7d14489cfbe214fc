use std::io::{self, Read};

use crate::tests::util::{self, Dir};
use crate::{Cursor, Error, FileType, Verdict, WalkArchive};

#[test]
fn walks_depth_first_in_name_order() {
    let dir = Dir::tmp();
    dir.touch("b.txt", b"b");
    dir.touch("a/y/z.txt", b"z");
    dir.touch("a/x.txt", b"x");

    let got: Vec<(String, usize)> = Cursor::new(dir.path())
        .map(|item| (util::rel(dir.path(), &item), item.unwrap().depth()))
        .collect();
    let expected: Vec<(String, usize)> = vec![
        ("".into(), 0),
        ("a".into(), 1),
        ("a/x.txt".into(), 2),
        ("a/y".into(), 2),
        ("a/y/z.txt".into(), 3),
        ("b.txt".into(), 1),
    ];
    assert_eq!(got, expected);
}

#[test]
fn entry_metadata_comes_from_the_filesystem() {
    let dir = Dir::tmp();
    dir.touch("f.txt", b"12345");

    let ents: Vec<_> = Cursor::new(dir.path()).map(|item| item.unwrap()).collect();
    assert_eq!(ents.len(), 2);
    assert!(ents[0].is_dir());
    assert!(!ents[0].has_content());
    assert_eq!(ents[1].file_name(), "f.txt");
    assert_eq!(ents[1].file_type(), FileType::File);
    assert_eq!(ents[1].metadata().len(), 5);
    assert!(ents[1].metadata().modified().is_some());
    assert!(ents[1].has_content());
    assert!(ents[1].archive_kind().is_none());
    assert_eq!(ents[1].clone().into_path(), dir.join("f.txt"));
}

#[test]
fn skip_recurse_on_directory() {
    let dir = Dir::tmp();
    dir.touch("D/inner.txt", b"");
    dir.touch("D/deeper/x.txt", b"");
    dir.touch("E.txt", b"");

    let walker = WalkArchive::new(dir.path()).filter("no-d", |visit| match visit {
        Ok(ent) if ent.file_name() == "D" => Ok(Verdict::SkipRecurse),
        _ => Ok(Verdict::Continue),
    });
    assert_eq!(util::walk(dir.path(), walker), vec!["", "D", "E.txt"]);
}

#[test]
fn skip_drops_entry_but_descends() {
    let dir = Dir::tmp();
    dir.touch("a.log", b"");
    dir.touch("d/b.log", b"");
    dir.touch("d/c.txt", b"");

    let all = util::walk(dir.path(), Cursor::new(dir.path()));
    let walker = WalkArchive::new(dir.path()).filter("logs", |visit| match visit {
        Ok(ent) if ent.path().extension().map_or(false, |ext| ext == "log") => Ok(Verdict::Skip),
        _ => Ok(Verdict::Continue),
    });
    let kept = util::walk(dir.path(), walker);
    assert_eq!(kept, vec!["", "d", "d/c.txt"]);
    assert_eq!(all.len() - kept.len(), 2);

    let walker = WalkArchive::new(dir.path()).filter("no-d", |visit| match visit {
        Ok(ent) if ent.file_name() == "d" => Ok(Verdict::Skip),
        _ => Ok(Verdict::Continue),
    });
    assert_eq!(util::walk(dir.path(), walker), vec!["", "a.log", "d/b.log", "d/c.txt"]);
}

#[test]
fn prune_drops_entry_and_subtree() {
    let dir = Dir::tmp();
    dir.touch("skip/a.txt", b"");
    dir.touch("skip/deep/b.txt", b"");
    dir.touch("z.txt", b"");

    let walker = WalkArchive::new(dir.path()).filter("prune", |visit| match visit {
        Ok(ent) if ent.file_name() == "skip" => Ok(Verdict::Prune),
        _ => Ok(Verdict::Continue),
    });
    assert_eq!(util::walk(dir.path(), walker), vec!["", "z.txt"]);
}

#[test]
fn end_of_walk_is_idempotent() {
    let dir = Dir::tmp();
    dir.touch("a.txt", b"");

    let mut cursor = Cursor::new(dir.path());
    assert!(cursor.next().is_some());
    assert!(cursor.next().is_some());
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
}

#[test]
fn close_before_exhaustion() {
    let dir = Dir::tmp();
    for name in &["a", "b", "c", "d"] {
        dir.touch(name, b"");
    }

    let mut cursor = Cursor::new(dir.path());
    assert!(cursor.next().unwrap().unwrap().is_dir());
    assert_eq!(cursor.next().unwrap().unwrap().file_name(), "a");
    cursor.close();
    assert!(cursor.next().is_none());
    cursor.close();
    assert!(cursor.next().is_none());
}

#[test]
fn close_before_first_entry() {
    let dir = Dir::tmp();
    dir.touch("a", b"");

    let mut cursor = Cursor::new(dir.path());
    cursor.close();
    assert!(cursor.next().is_none());
}

#[test]
fn drop_mid_walk_does_not_hang() {
    let dir = Dir::tmp();
    dir.touch("a/b/c", b"data");

    let mut cursor = Cursor::new(dir.path());
    cursor.next();
    cursor.next();
    drop(cursor);
}

#[test]
fn read_file_content() {
    let dir = Dir::tmp();
    dir.touch("a.txt", b"alpha");
    dir.touch("b.txt", b"beta");

    let mut cursor = Cursor::new(dir.path());
    let mut contents = Vec::new();
    while let Some(item) = cursor.next() {
        let ent = item.unwrap();
        if ent.has_content() {
            let mut buf = String::new();
            cursor.read_to_string(&mut buf).unwrap();
            contents.push(buf);
        }
    }
    assert_eq!(contents, vec!["alpha", "beta"]);
}

#[test]
fn large_content_is_read_in_chunks() {
    let dir = Dir::tmp();
    let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    dir.touch("big.bin", &data);

    let mut cursor = Cursor::new(dir.path());
    cursor.next().unwrap().unwrap();
    cursor.next().unwrap().unwrap();
    let mut got = Vec::new();
    cursor.read_to_end(&mut got).unwrap();
    assert_eq!(got, data);
}

#[test]
fn read_without_content_fails() {
    let dir = Dir::tmp();
    dir.touch("a.txt", b"alpha");

    let mut cursor = Cursor::new(dir.path());
    let mut buf = [0u8; 8];
    assert_eq!(cursor.read(&mut buf).unwrap_err().kind(), io::ErrorKind::InvalidInput);

    assert!(cursor.next().unwrap().unwrap().is_dir());
    let err = cursor.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    let inner = err.into_inner().unwrap().downcast::<Error>().unwrap();
    assert!(matches!(*inner, Error::NoContent));

    assert!(cursor.next().is_some());
    assert_eq!(cursor.read(&mut buf).unwrap(), 5);
    assert!(cursor.next().is_none());
    assert!(cursor.read(&mut buf).is_err());
}

#[test]
fn single_file_root() {
    let dir = Dir::tmp();
    dir.touch("only.txt", b"x");

    let ents: Vec<_> = Cursor::new(dir.join("only.txt")).map(|item| item.unwrap()).collect();
    assert_eq!(ents.len(), 1);
    assert_eq!(ents[0].path(), dir.join("only.txt"));
    assert_eq!(ents[0].depth(), 0);
    assert!(ents[0].has_content());
}

#[test]
fn missing_root_is_one_error() {
    let dir = Dir::tmp();
    let mut cursor = Cursor::new(dir.join("nope"));

    let err = cursor.next().unwrap().unwrap_err();
    assert!(matches!(err, Error::Metadata { .. }));
    assert_eq!(err.path(), Some(dir.join("nope").as_path()));
    assert!(!err.is_fatal());
    assert_eq!(err.io_error().unwrap().kind(), io::ErrorKind::NotFound);
    assert!(cursor.next().is_none());
}

#[test]
fn filter_error_aborts_walk() {
    let dir = Dir::tmp();
    dir.touch("a.txt", b"");
    dir.touch("b.txt", b"");
    dir.touch("c.txt", b"");

    let mut cursor = WalkArchive::new(dir.path())
        .filter("boom", |visit| match visit {
            Ok(ent) if ent.file_name() == "b.txt" => Err("no b allowed".into()),
            _ => Ok(Verdict::Continue),
        })
        .into_cursor();

    assert_eq!(util::rel(dir.path(), &cursor.next().unwrap()), "");
    assert_eq!(util::rel(dir.path(), &cursor.next().unwrap()), "a.txt");
    match cursor.next().unwrap() {
        Err(Error::Filter { name, path, source }) => {
            assert_eq!(name, "boom");
            assert_eq!(path, dir.join("b.txt"));
            assert_eq!(source.to_string(), "no b allowed");
        }
        other => panic!("expected filter error, got {:?}", other),
    }
    assert!(cursor.next().is_none());
    assert!(cursor.next().is_none());
}

#[test]
fn filters_can_change_mid_walk() {
    let dir = Dir::tmp();
    dir.touch("a.txt", b"");
    dir.touch("b.txt", b"");
    dir.touch("c.txt", b"");

    let mut cursor = Cursor::new(dir.path());
    assert!(cursor.filter_names().is_empty());
    assert_eq!(util::rel(dir.path(), &cursor.next().unwrap()), "");

    cursor.register_filter("no-b", |visit| match visit {
        Ok(ent) if ent.file_name() == "b.txt" => Ok(Verdict::Skip),
        _ => Ok(Verdict::Continue),
    });
    cursor.register_filter("pass", |_| Ok(Verdict::Continue));
    assert_eq!(cursor.filter_names(), vec!["no-b", "pass"]);
    assert_eq!(util::rel(dir.path(), &cursor.next().unwrap()), "a.txt");
    assert_eq!(util::rel(dir.path(), &cursor.next().unwrap()), "c.txt");
    assert!(cursor.unregister_filter("no-b"));
    assert!(!cursor.unregister_filter("no-b"));
    assert_eq!(cursor.filter_names(), vec!["pass"]);
    assert!(cursor.next().is_none());
}

#[cfg(unix)]
#[test]
fn symlinks_are_not_followed() {
    use std::os::unix::fs::symlink;

    let dir = Dir::tmp();
    dir.touch("target/inner.txt", b"");
    symlink(dir.join("target"), dir.join("link")).unwrap();

    let ents: Vec<_> = Cursor::new(dir.path()).map(|item| item.unwrap()).collect();
    let names: Vec<_> = ents.iter().map(|e| util::rel(dir.path(), &Ok(e.clone()))).collect();
    assert_eq!(names, vec!["", "link", "target", "target/inner.txt"]);
    assert_eq!(ents[1].file_type(), FileType::Symlink);
    assert!(!ents[1].has_content());
}

#[cfg(unix)]
#[test]
fn unreadable_directory_is_reported_and_walk_goes_on() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let dir = Dir::tmp();
    dir.touch("locked/secret.txt", b"");
    dir.touch("z.txt", b"");
    fs::set_permissions(dir.join("locked"), fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(dir.join("locked")).is_ok() {
        // Permission bits do not bind this user (root).
        fs::set_permissions(dir.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let items: Vec<_> = Cursor::new(dir.path()).collect();
    fs::set_permissions(dir.join("locked"), fs::Permissions::from_mode(0o755)).unwrap();

    let names: Vec<_> = items.iter().map(|item| util::rel(dir.path(), item)).collect();
    assert_eq!(names, vec!["", "locked", "!locked", "z.txt"]);
    assert!(matches!(items[2], Err(Error::ReadDir { .. })));
}
