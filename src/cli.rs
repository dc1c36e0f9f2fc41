//! Command-line interface for tandem.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::logging::Verbosity;
use crate::types::Options;

/// Subcommand to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report files that need formatting
    Check,
    /// Print diffs for files that need formatting
    Diff,
    /// Format files in place
    Format,
}

impl Mode {
    /// Whether this mode leaves files untouched
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        !matches!(self, Self::Format)
    }

    #[must_use]
    pub fn wants_diff(self) -> bool {
        matches!(self, Self::Diff)
    }

    /// Whether a run with these counts should exit non-zero
    ///
    /// Check and diff fail on any needed change; format only on errors.
    #[must_use]
    pub fn is_failure(self, actions: usize, errors: usize) -> bool {
        match self {
            Self::Check | Self::Diff => actions > 0 || errors > 0,
            Self::Format => errors > 0,
        }
    }
}

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Subcommand
    pub mode: Mode,

    /// Files or directories to format; `-` reads stdin
    pub paths: Vec<PathBuf>,

    /// Debug, normal or quiet output
    pub verbosity: Verbosity,

    /// Explicit config file (overrides auto-discovery)
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (0 = auto)
    pub jobs: Option<usize>,
}

impl CliArgs {
    /// Paths to process, defaulting to the current directory
    #[must_use]
    pub fn paths_or_cwd(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }

    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            debug: self.verbosity == Verbosity::Debug,
            quiet: self.verbosity == Verbosity::Quiet,
        }
    }
}

fn paths_arg() -> Arg {
    Arg::new("paths")
        .help("Files or directories to process; '-' reads stdin")
        .value_name("PATH")
        .num_args(0..)
        .value_parser(clap::value_parser!(PathBuf))
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("tandem")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Sort imports and format code in one pass")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("debug")
                .short('v')
                .long("debug")
                .help("Enable debug/verbose output")
                .action(ArgAction::SetTrue)
                .overrides_with("quiet")
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only report files that need changes and errors")
                .action(ArgAction::SetTrue)
                .overrides_with("debug")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file path (overrides auto-discovery)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs (0=auto)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize))
                .global(true),
        )
        .subcommand(
            Command::new("check")
                .about("Check formatting of one or more paths")
                .arg(paths_arg()),
        )
        .subcommand(
            Command::new("diff")
                .about("Generate diffs for any files that need formatting")
                .arg(paths_arg()),
        )
        .subcommand(
            Command::new("format")
                .about("Format one or more paths in place")
                .arg(paths_arg()),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &ArgMatches) -> CliArgs {
    let (mode, sub) = match matches.subcommand() {
        Some(("diff", sub)) => (Mode::Diff, sub),
        Some(("format", sub)) => (Mode::Format, sub),
        Some((_, sub)) => (Mode::Check, sub),
        None => (Mode::Check, matches),
    };

    // Global args are propagated to the subcommand matches
    let verbosity = if sub.get_flag("debug") {
        Verbosity::Debug
    } else if sub.get_flag("quiet") {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };

    CliArgs {
        mode,
        paths: sub
            .get_many::<PathBuf>("paths")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        verbosity,
        config: sub.get_one::<PathBuf>("config").cloned(),
        jobs: sub.get_one::<usize>("jobs").copied(),
    }
}
