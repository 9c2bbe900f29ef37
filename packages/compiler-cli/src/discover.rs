//! File discovery across the configured source roots (spec §1 "file
//! discovery" is an out-of-scope external collaborator for the core, owned
//! here by the driver).

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Walks `roots`, honoring `.gitignore`, and returns every file whose
/// extension matches `extension` (configurable via
/// `Config::source_extension`, `"swift"` by default), sorted for
/// deterministic compilation order.
pub fn discover_source_files(roots: &[PathBuf], extension: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for root in roots {
        if !root.exists() {
            tracing::warn!(root = %root.display(), "source root does not exist, skipping");
            continue;
        }
        let mut builder = WalkBuilder::new(root);
        builder.hidden(false);
        for entry in builder.build().flatten() {
            let path = entry.path();
            if has_extension(path, extension) {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension)
}
