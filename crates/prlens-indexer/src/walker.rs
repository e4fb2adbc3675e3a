//! File discovery for the indexer.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Files found under a root, plus how many entries could not be read.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub errors: usize,
}

/// Walk `root` iteratively and collect regular files with an allow-listed extension.
///
/// Hidden directories are not entered, symlinks are not followed and the walk
/// stops `max_depth` levels below `root`. Entries come back sorted by file name
/// within each directory.
pub fn discover_files(root: &Path, extensions: &[String], max_depth: usize) -> Discovered {
    let mut found = Discovered::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e));
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && has_allowed_extension(entry.path(), extensions) {
                    found.files.push(entry.into_path());
                }
            }
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                found.errors += 1;
            }
        }
    }
    found
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

pub fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    extension_of(path).is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
}

/// Lowercased extension without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
}
