//! Per-file status lines and the run summary.
//!
//! Status lines and the summary go to stderr; diffs go to stdout so they can
//! be piped into other tools.

use std::io::{self, IsTerminal, Write};

use colored::Colorize;

use crate::diff::render_diff;
use crate::error::first_line;
use crate::types::FileResult;
use crate::Result;

/// Running counters for a batch of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub errors: usize,
    /// Files that would change in a dry run
    pub changed: usize,
    /// Files changed and written back
    pub written: usize,
    /// Files already formatted
    pub clean: usize,
}

impl Tally {
    /// Files that needed formatting, whether or not they were written
    #[must_use]
    pub fn actions(&self) -> usize {
        self.changed + self.written
    }

    /// Summary message from the non-zero counters
    #[must_use]
    pub fn summary(&self) -> String {
        fn files(count: usize) -> &'static str {
            if count == 1 {
                "file"
            } else {
                "files"
            }
        }

        let mut reports = Vec::new();
        if self.errors > 0 {
            reports.push(format!("{} errors", self.errors).yellow().bold().to_string());
        }
        if self.changed > 0 {
            let n = self.changed;
            reports.push(format!("{n} {} would be formatted", files(n)).bold().to_string());
        }
        if self.written > 0 {
            let n = self.written;
            reports.push(format!("{n} {} formatted", files(n)));
        }
        if self.clean > 0 {
            let n = self.clean;
            reports.push(format!("{n} {} already formatted", files(n)));
        }

        format!("✨ {} ✨", reports.join(", "))
    }
}

/// Whether output to a stream should be colored
#[must_use]
pub fn should_color(is_terminal: bool, no_color: bool) -> bool {
    is_terminal && !no_color
}

/// Color status lines only when stderr is a terminal and `NO_COLOR` is unset
pub fn init_color() {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    colored::control::set_override(should_color(io::stderr().is_terminal(), no_color));
}

/// Report results on stderr, and diffs on stdout when `diff` is set.
///
/// Diffs are colored only when stdout is a terminal.
/// Returns `(files needing action, errors)`.
pub fn echo_results<I>(results: I, diff: bool, quiet: bool) -> Result<(usize, usize)>
where
    I: IntoIterator<Item = FileResult>,
{
    let stderr = io::stderr();
    let stdout = io::stdout();
    let color_diff = stdout.is_terminal();
    echo_to(
        results,
        diff,
        quiet,
        color_diff,
        &mut stderr.lock(),
        &mut stdout.lock(),
    )
}

/// Report results to the given streams.
///
/// Each result is classified by the first match of: error, skipped,
/// changed, clean. "Would format" and "No files found" lines are printed
/// even when quiet. An empty batch counts as one error. Colors follow the
/// global `colored` setting.
pub fn echo_results_to<I, E, O>(
    results: I,
    diff: bool,
    quiet: bool,
    err: &mut E,
    out: &mut O,
) -> Result<(usize, usize)>
where
    I: IntoIterator<Item = FileResult>,
    E: Write,
    O: Write,
{
    echo_to(results, diff, quiet, true, err, out)
}

fn echo_to<I, E, O>(
    results: I,
    diff: bool,
    quiet: bool,
    color_diff: bool,
    err: &mut E,
    out: &mut O,
) -> Result<(usize, usize)>
where
    I: IntoIterator<Item = FileResult>,
    E: Write,
    O: Write,
{
    let mut empty = true;
    let mut tally = Tally::default();

    for result in results {
        empty = false;
        let path = result.path.display();

        if let Some(error) = &result.error {
            let message = format!("Error formatting {path}: {}", first_line(error));
            writeln!(err, "{}", message.yellow())?;
            tally.errors += 1;
        } else if result.skipped.is_skipped() {
            if !quiet {
                match result.skipped.reason() {
                    Some(reason) => writeln!(err, "Skipped {path}: {reason}")?,
                    None => writeln!(err, "Skipped {path}")?,
                }
            }
        } else if result.changed {
            if result.written {
                tally.written += 1;
                if !quiet {
                    writeln!(err, "Formatted {path}")?;
                }
            } else {
                tally.changed += 1;
                writeln!(err, "Would format {path}")?;
            }
            if diff {
                if let Some(text) = &result.diff {
                    render_diff(text, out, color_diff)?;
                }
            }
        } else {
            tally.clean += 1;
        }
    }

    if empty {
        writeln!(err, "{}", "No files found".yellow())?;
        tally.errors += 1;
    }

    if !quiet {
        writeln!(err, "{}", tally.summary())?;
    }
    err.flush()?;

    Ok((tally.actions(), tally.errors))
}
