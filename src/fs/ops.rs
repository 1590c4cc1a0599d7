//! Filesystem operations

use std::fs;
use std::io;
use std::path::Path;

use super::entry::Entry;

/// Read the direct children of a directory.
///
/// Directories come first, then files, each group ordered by name
/// without regard to case. Entries whose metadata can't be read are skipped.
pub fn read_directory(path: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path)? {
        let entry = entry?;
        match Entry::from_path(&entry.path()) {
            Ok(e) => entries.push(e),
            Err(err) => {
                tracing::debug!("skipping {}: {}", entry.path().display(), err);
            }
        }
    }

    entries.sort_by_cached_key(|e| (!e.is_dir, e.name.to_lowercase()));
    Ok(entries)
}
