//! walkarchive-list - list a directory tree and the archives inside it.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use walkarchive::{DirEntry, FileType, Verdict, WalkArchive};

/// List every entry below PATH, descending into zip and tar archives.
#[derive(Debug, Parser)]
#[command(name = "walkarchive-list", version)]
struct Args {
    /// Directory or archive to walk.
    path: PathBuf,

    /// Do not list NAME or anything below it. May be repeated.
    #[arg(long, value_name = "NAME")]
    prune: Vec<OsString>,

    /// Do not list files with extension EXT. May be repeated.
    #[arg(long, value_name = "EXT")]
    exclude_ext: Vec<String>,

    /// List archives as plain files.
    #[arg(long)]
    no_archives: bool,

    /// Maximum number of nested archive levels to descend into.
    #[arg(long, value_name = "N")]
    max_archive_depth: Option<usize>,

    /// Largest zip archive to buffer in memory.
    #[arg(long, value_name = "BYTES")]
    max_zip_size: Option<u64>,

    /// Print totals only.
    #[arg(long)]
    count: bool,

    /// Verbose logging.
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Totals {
    dirs: u64,
    files: u64,
    archives: u64,
    errors: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("walkarchive=debug,walkarchive_list=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Returns false if the walk was cut short by a fatal error.
fn run(args: Args) -> io::Result<bool> {
    let mut walker = WalkArchive::new(&args.path).descend_archives(!args.no_archives);
    if let Some(depth) = args.max_archive_depth {
        walker = walker.max_archive_depth(depth);
    }
    if let Some(bytes) = args.max_zip_size {
        walker = walker.max_zip_size(bytes);
    }
    if !args.prune.is_empty() {
        let names = args.prune.clone();
        walker = walker.filter("prune", move |visit| match visit {
            Ok(ent) if names.iter().any(|n| n.as_os_str() == ent.file_name()) => Ok(Verdict::Prune),
            _ => Ok(Verdict::Continue),
        });
    }
    if !args.exclude_ext.is_empty() {
        let exts: Vec<String> = args
        .exclude_ext
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();
        walker = walker.filter("exclude-ext", move |visit| match visit {
            Ok(ent) if !ent.is_dir() && has_extension(ent, &exts) => Ok(Verdict::Skip),
            _ => Ok(Verdict::Continue),
        });
    }

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut totals = Totals::default();
    let mut completed = true;

    for item in walker {
        match item {
            Ok(ent) => {
                let marker = marker(&ent);
                match marker {
                    'd' => totals.dirs += 1,
                    'a' => totals.archives += 1,
                    _ => totals.files += 1,
                }
                if !args.count {
                    writeln!(out, "{} {}", marker, ent.path().display())?;
                }
            }
            Err(err) if err.is_fatal() => {
                out.flush()?;
                eprintln!("error: {}", err);
                completed = false;
            }
            Err(err) => {
                totals.errors += 1;
                warn!("{}", err);
            }
        }
    }

    if args.count {
        writeln!(
            out,
            "{} directories, {} files, {} archives, {} errors",
            totals.dirs, totals.files, totals.archives, totals.errors
        )?;
    }
    out.flush()?;
    debug!(?totals, completed, "listing done");
    Ok(completed)
}

fn marker(ent: &DirEntry) -> char {
    match ent.file_type() {
        FileType::Dir => 'd',
        FileType::Symlink => 'l',
        FileType::Other => '?',
        FileType::File if ent.archive_kind().is_some() => 'a',
        FileType::File => 'f',
    }
}

fn has_extension(ent: &DirEntry, exts: &[String]) -> bool {
    match ent.path().extension().and_then(|e| e.to_str()) {
        Some(ext) => exts.iter().any(|e| e.eq_ignore_ascii_case(ext)),
        None => false,
    }
}
