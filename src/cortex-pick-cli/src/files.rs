//! File listing for `filter` when stdin is a terminal.

use std::path::Path;

use anyhow::Result;
use ignore::WalkBuilder;

/// Lists files below `root`, honoring `.gitignore`, as sorted relative paths.
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in WalkBuilder::new(root).build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_string_lossy().into_owned());
        }
    }

    files.sort();
    Ok(files)
}
