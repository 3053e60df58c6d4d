use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Expand one FILE argument into concrete files. Directories require `-r`;
/// anything unreadable is diagnosed on stderr and skipped.
pub fn collect_files(root: &Path, recursive: bool) -> Vec<PathBuf> {
    if root.is_dir() {
        if recursive {
            let mut out = Vec::new();
            collect_recursive(root, &mut out);
            debug!("expanded {} to {} files", root.display(), out.len());
            out
        } else {
            eprintln!("{}: is a directory", root.display());
            Vec::new()
        }
    } else if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        eprintln!("{}: no such file or directory", root.display());
        Vec::new()
    }
}

fn collect_recursive(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("skipping {}: {}", dir.display(), err);
            eprintln!("{}: permission denied", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, out);
        } else if path.is_file() {
            out.push(path);
        }
    }
}
