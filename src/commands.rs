//! The `check`, `diff` and `format` commands.

use std::path::PathBuf;

use crate::cli::Mode;
use crate::process::{Pipeline, PipelineOptions};
use crate::report::echo_results;
use crate::types::Options;
use crate::Result;

/// Pipeline flags for a command
#[must_use]
pub fn pipeline_options(mode: Mode) -> PipelineOptions {
    PipelineOptions {
        dry_run: mode.is_dry_run(),
        diff: mode.wants_diff(),
        return_content: false,
    }
}

/// Run a command over `paths` and report the results.
///
/// Returns `true` when the process should exit with a failure status.
pub fn run(mode: Mode, paths: &[PathBuf], pipeline: Pipeline, options: &Options) -> Result<bool> {
    let pipeline = pipeline.with_options(pipeline_options(mode));
    let (actions, errors) = pipeline.stream_paths(paths, |results| {
        echo_results(results, mode.wants_diff(), options.quiet)
    })??;
    log::debug!("{actions} files need formatting, {errors} errors");
    Ok(mode.is_failure(actions, errors))
}
