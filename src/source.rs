//! Reading and writing source files.
//!
//! Files are read as bytes with their encoding label and newline style
//! detected up front. Content handed to the pipeline always uses `\n`
//! line endings; [`write_file`] converts back to the original style.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use regex::bytes::Regex;
use tempfile::NamedTempFile;

use crate::types::{Encoding, FileContent, Newline};
use crate::Result;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Encoding cookie in a leading comment, e.g. `# -*- coding: latin-1 -*-`
static CODING_COOKIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t\x0c]*#.*?coding[:=][ \t]*([-\w.]+)").expect("valid coding regex")
});

/// A source file read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File bytes with newlines normalized to `\n`
    pub content: FileContent,
    /// Detected encoding label
    pub encoding: Encoding,
    /// Original newline style
    pub newline: Newline,
}

/// Read a file from disk, detect encoding, and normalize newlines.
pub fn read_file(path: &Path) -> Result<SourceFile> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(decode_source(raw))
}

/// Detect encoding and newline style of raw bytes and normalize newlines
#[must_use]
pub fn decode_source(raw: FileContent) -> SourceFile {
    let encoding = detect_encoding(&raw);
    let newline = detect_newline(&raw);
    let content = match newline {
        Newline::Lf => raw,
        Newline::CrLf => replace_bytes(&raw, b"\r\n", b"\n"),
    };
    SourceFile {
        content,
        encoding,
        newline,
    }
}

/// Detect the encoding label from a byte order mark or coding cookie.
///
/// Only the first two lines are searched for a cookie, and the second line
/// only when the first is a comment or blank.
#[must_use]
pub fn detect_encoding(content: &[u8]) -> Encoding {
    if content.starts_with(UTF8_BOM) {
        return "utf-8-sig".to_string();
    }

    for (index, line) in content.split(|&b| b == b'\n').take(2).enumerate() {
        if let Some(caps) = CODING_COOKIE_RE.captures(line) {
            let name = String::from_utf8_lossy(&caps[1]);
            return normalize_encoding(&name);
        }
        let trimmed = line.trim_ascii();
        if index == 0 && !(trimmed.is_empty() || trimmed.starts_with(b"#")) {
            break;
        }
    }

    "utf-8".to_string()
}

/// Canonical label for common encoding aliases
fn normalize_encoding(name: &str) -> Encoding {
    let name = name.to_ascii_lowercase().replace('_', "-");
    if name == "utf-8" || name.starts_with("utf-8-") || name == "utf8" {
        return "utf-8".to_string();
    }
    for alias in ["latin-1", "iso-8859-1", "iso-latin-1"] {
        if name == alias || name.starts_with(&format!("{alias}-")) {
            return "iso-8859-1".to_string();
        }
    }
    name
}

/// Newline style of the first line; files without line breaks are `\n`
#[must_use]
pub fn detect_newline(content: &[u8]) -> Newline {
    match content.iter().position(|&b| b == b'\n') {
        Some(pos) if pos > 0 && content[pos - 1] == b'\r' => Newline::CrLf,
        _ => Newline::Lf,
    }
}

/// Convert `\n` line endings to the given newline style
#[must_use]
pub fn normalize_newlines(content: &[u8], newline: Newline) -> FileContent {
    match newline {
        Newline::Lf => content.to_vec(),
        Newline::CrLf => replace_bytes(content, b"\n", b"\r\n"),
    }
}

/// Decode content to text in its detected encoding, dropping any BOM.
///
/// Labels the encoding registry doesn't know fall back to lossy UTF-8.
#[must_use]
pub fn decode_text(content: &[u8], encoding: &str) -> String {
    let label = encoding.strip_suffix("-sig").unwrap_or(encoding);
    match encoding_rs::Encoding::for_label(label.as_bytes()) {
        Some(codec) => codec.decode_with_bom_removal(content).0.into_owned(),
        None => String::from_utf8_lossy(content).into_owned(),
    }
}

/// Write content to disk in the given newline style.
///
/// The new content goes to a temporary file next to `path` which is then
/// renamed over it, so an interrupted write never leaves a partial file.
pub fn write_file(path: &Path, content: &[u8], newline: Newline) -> Result<()> {
    let content = normalize_newlines(content, newline);
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;
    temp.write_all(&content)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn replace_bytes(content: &[u8], from: &[u8], to: &[u8]) -> FileContent {
    let mut output = Vec::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.windows(from.len()).position(|w| w == from) {
        output.extend_from_slice(&rest[..pos]);
        output.extend_from_slice(to);
        rest = &rest[pos + from.len()..];
    }
    output.extend_from_slice(rest);
    output
}
