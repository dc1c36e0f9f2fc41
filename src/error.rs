//! Error types and result aliases for tandem.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate
//! - [`first_line`]: The one-line form of an error shown to end users

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;

/// First line of an error's display text.
///
/// Transform failures often carry multi-line output from external tools;
/// only the first line is reported per file.
#[must_use]
pub fn first_line(error: &anyhow::Error) -> String {
    let message = error.to_string();
    message.lines().next().unwrap_or_default().to_string()
}
