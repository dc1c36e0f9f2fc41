//! Core data types shared by the pipeline and the reporter.

use std::path::{Path, PathBuf};

/// Path argument that stands for standard input
pub const STDIN: &str = "-";

/// Display name used for stdin content when no real path is given
pub const STDIN_NAME: &str = "stdin";

/// Encoding label of a source file (e.g. `utf-8`, `latin-1`)
pub type Encoding = String;

/// Raw file content
pub type FileContent = Vec<u8>;

/// Check whether a path argument denotes standard input
#[must_use]
pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN
}

/// Line ending style of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Newline {
    #[default]
    Lf,
    CrLf,
}

/// Process-wide run options, fixed at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    /// Verbose logging
    pub debug: bool,
    /// Suppress per-file and summary chatter
    pub quiet: bool,
}

/// Why a file was not formatted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Skipped {
    #[default]
    No,
    /// Skipped without a reason
    Silent,
    /// Skipped with a human-readable reason
    Reason(String),
}

impl Skipped {
    /// Build from an optional skip reason; empty reasons become `Silent`
    #[must_use]
    pub fn from_reason(reason: Option<String>) -> Self {
        match reason {
            Some(reason) if !reason.is_empty() => Self::Reason(reason),
            _ => Self::Silent,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        !matches!(self, Self::No)
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Reason(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Outcome of processing a single path
///
/// The reporter reads these in priority order: `error`, then `skipped`,
/// then `changed`. `written` is only meaningful when `changed` is set.
#[derive(Debug, Default)]
pub struct FileResult {
    pub path: PathBuf,
    pub changed: bool,
    pub written: bool,
    pub skipped: Skipped,
    pub diff: Option<String>,
    pub error: Option<anyhow::Error>,
    /// Content before formatting, only set when content is requested
    pub before: FileContent,
    /// Content after formatting, only set when content is requested
    pub after: FileContent,
}

impl FileResult {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}
