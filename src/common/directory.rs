use std::path::{Path, PathBuf};

/// Repository housekeeping files that are never prompts, compared case-insensitively.
pub const SKIPPED_FILES: &[&str] = &["readme.md", "claude.md", "agents.md", "vibe.md"];

pub fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

pub fn is_skipped_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| {
            SKIPPED_FILES
                .iter()
                .any(|skipped| name.eq_ignore_ascii_case(skipped))
        })
}

/// All prompt markdown files below `dir`, recursively, in path order.
pub fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let pattern = format!("{}/**/*.md", glob::Pattern::escape(&dir.to_string_lossy()));
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "invalid scan pattern");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|path| path.is_file() && is_markdown(path) && !is_skipped_file(path))
        .collect();
    files.sort();
    files
}

/// `path` relative to `root` with `/` separators, as stored in manifests.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
