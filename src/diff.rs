//! Unified diff generation and colored rendering.
//!
//! The diff algorithm comes from the `similar` crate; this module only picks
//! headers and context size and colors the output for terminals.

use std::io::{self, Write};

use colored::Colorize;
use similar::TextDiff;

/// Lines of context around each change
const CONTEXT_LINES: usize = 3;

/// Build a unified diff between two versions of a file.
///
/// Returns an empty string when the texts are identical.
#[must_use]
pub fn unified_diff(before: &str, after: &str, from_header: &str, to_header: &str) -> String {
    let diff = TextDiff::from_lines(before, after);
    diff.unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(from_header, to_header)
        .to_string()
}

/// Diff headers for an on-disk path, git style (`a/...`, `b/...`)
#[must_use]
pub fn path_headers(path: &str) -> (String, String) {
    let path = path.trim_start_matches('/');
    (format!("a/{path}"), format!("b/{path}"))
}

/// Write a unified diff, coloring headers, hunks and changed lines when
/// `color` is set
pub fn render_diff<W: Write>(diff: &str, out: &mut W, color: bool) -> io::Result<()> {
    for line in diff.lines() {
        if !color {
            writeln!(out, "{line}")?;
        } else if line.starts_with("+++") || line.starts_with("---") {
            writeln!(out, "{}", line.bold())?;
        } else if line.starts_with("@@") {
            writeln!(out, "{}", line.cyan())?;
        } else if line.starts_with('+') {
            writeln!(out, "{}", line.green())?;
        } else if line.starts_with('-') {
            writeln!(out, "{}", line.red())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_headers_and_hunks() {
        let diff = unified_diff(
            "import sys\nimport os\n",
            "import os\nimport sys\n",
            "a/pkg/mod.py",
            "b/pkg/mod.py",
        );
        assert!(diff.starts_with("--- a/pkg/mod.py\n+++ b/pkg/mod.py\n"));
        assert!(diff.contains("@@"));
        assert!(diff.contains("-import sys\n"));
        assert!(diff.contains("+import sys\n"));
    }

    #[test]
    fn test_unified_diff_identical() {
        assert_eq!(unified_diff("x\n", "x\n", "a/x", "b/x"), "");
    }

    #[test]
    fn test_path_headers() {
        assert_eq!(
            path_headers("/tmp/project/a.py"),
            ("a/tmp/project/a.py".to_string(), "b/tmp/project/a.py".to_string())
        );
    }

    #[test]
    fn test_render_diff_plain() {
        let mut out = Vec::new();
        render_diff("--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n", &mut out, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n"
        );
    }
}
