use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// What kind of filesystem entry a search is after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Dir,
    File,
}

impl Kind {
    fn accepts(self, path: &Path) -> bool {
        match self {
            Kind::Dir => path.is_dir(),
            Kind::File => path.is_file(),
        }
    }
}

/// Index of the first name in `names` equal to `candidate`, ignoring case.
fn rank(names: &[String], candidate: &str) -> Option<usize> {
    names.iter().position(|n| n.eq_ignore_ascii_case(candidate))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|s| s.starts_with('.'))
}

/// Case-insensitive match among the direct children of `dir`.
///
/// Earlier names in `names` win; among equal names, the lexically first entry.
pub fn find_child(dir: &Path, names: &[String], kind: Kind) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    entries
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            let rank = rank(names, &name)?;
            kind.accepts(&path).then_some((rank, path))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, path)| path)
}

/// Case-insensitive match anywhere below `root` (root itself excluded).
///
/// The walk is sorted by file name and skips hidden entries, so the result is
/// the same on every run. Earlier names in `names` win over walk order.
pub fn find_recursive(root: &Path, names: &[String], kind: Kind, max_depth: usize) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok());

    for entry in walker {
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(rank) = rank(names, name) else {
            continue;
        };
        if !kind.accepts(entry.path()) {
            continue;
        }
        if best.as_ref().map_or(true, |(r, _)| rank < *r) {
            best = Some((rank, entry.into_path()));
            if rank == 0 {
                break;
            }
        }
    }

    best.map(|(_, path)| path)
}
