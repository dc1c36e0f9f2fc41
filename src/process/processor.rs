//! Pre- and post-processing hooks
//!
//! Processors see file content before the sorter runs or after the formatter
//! finishes. Any processor can opt a file out of formatting by returning
//! [`Processed::Skip`].

use std::path::Path;

use crate::types::FileContent;
use crate::Result;

/// Outcome of a processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// Continue with this content
    Proceed(FileContent),
    /// Leave the file untouched, with an optional reason
    Skip(Option<String>),
}

/// Hook that rewrites content or skips the file
pub trait Processor: Send + Sync {
    fn process(&self, path: &Path, content: FileContent, encoding: &str) -> Result<Processed>;
}

impl<F> Processor for F
where
    F: Fn(&Path, FileContent, &str) -> Result<Processed> + Send + Sync,
{
    fn process(&self, path: &Path, content: FileContent, encoding: &str) -> Result<Processed> {
        self(path, content, encoding)
    }
}

/// Skips files containing a marker string, e.g. `@generated`
#[derive(Debug, Clone)]
pub struct MarkerSkip {
    marker: String,
}

impl MarkerSkip {
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Processor for MarkerSkip {
    fn process(&self, _path: &Path, content: FileContent, _encoding: &str) -> Result<Processed> {
        let needle = self.marker.as_bytes();
        if !needle.is_empty() && content.windows(needle.len()).any(|w| w == needle) {
            return Ok(Processed::Skip(Some(format!("contains {}", self.marker))));
        }
        Ok(Processed::Proceed(content))
    }
}
