//! Expanding path arguments into the files to format.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;

/// Walk depth limit, guards against pathological trees
const MAX_DEPTH: usize = 256;

/// Lazily yield the files to format under `root`.
///
/// A file root is yielded unless excluded, whatever its extension. A
/// directory root is walked recursively, skipping hidden and excluded
/// directories and yielding files whose extension is configured. Roots
/// that don't exist are yielded as-is so reading them reports the error.
pub fn expand_path<'a>(
    root: &'a Path,
    config: &'a Config,
) -> Box<dyn Iterator<Item = PathBuf> + 'a> {
    let patterns = config.exclude_patterns();
    let base = config.project_root.clone();

    if !root.is_dir() {
        let walk_root = root.parent().unwrap_or(root);
        if is_excluded(root, &patterns, base.as_deref(), walk_root) {
            log::debug!("Excluding {}", root.display());
            return Box::new(std::iter::empty());
        }
        return Box::new(std::iter::once(root.to_path_buf()));
    }

    let walk_patterns = patterns.clone();
    let walk_base = base.clone();
    let files = WalkDir::new(root)
        .follow_links(true)
        .max_depth(MAX_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !(is_hidden(entry)
                    || is_excluded(entry.path(), &walk_patterns, walk_base.as_deref(), root))
        })
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(move |path| {
            has_extension(path, &config.extensions)
                && !is_excluded(path, &patterns, base.as_deref(), root)
        });

    Box::new(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

/// Check if a path matches any exclusion pattern
///
/// Patterns are tried against the path relative to `base` (the project
/// root, when known), the file name, and each path component. Paths outside
/// `base` are taken relative to `root`, so directories above the walk never
/// match.
fn is_excluded(path: &Path, patterns: &[Pattern], base: Option<&Path>, root: &Path) -> bool {
    if patterns.is_empty() {
        return false;
    }

    let relative = base
        .and_then(|base| path.strip_prefix(base).ok())
        .or_else(|| path.strip_prefix(root).ok())
        .unwrap_or(path);
    let relative_str = relative.to_string_lossy();

    for pattern in patterns {
        if pattern.matches(&relative_str) {
            return true;
        }

        if let Some(file_name) = path.file_name() {
            if pattern.matches(&file_name.to_string_lossy()) {
                return true;
            }
        }

        // Directory patterns match any component
        for component in relative.components() {
            if let Component::Normal(c) = component {
                if pattern.matches(&c.to_string_lossy()) {
                    return true;
                }
            }
        }
    }

    false
}
