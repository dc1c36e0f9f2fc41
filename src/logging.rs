//! Logging setup for the command line tool.
//!
//! The logger is built explicitly from the chosen [`Verbosity`] and written to
//! stderr, next to the per-file status lines.

use std::io::Write;

use env_logger::{Builder, Logger, Target};
use log::LevelFilter;

use crate::Result;

/// Verbosity selected by `--debug` / `--quiet`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    Debug,
    #[default]
    Normal,
    Quiet,
}

impl Verbosity {
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::Debug,
            Self::Normal => LevelFilter::Info,
            Self::Quiet => LevelFilter::Error,
        }
    }
}

/// Build a stderr logger for the given verbosity.
///
/// Debug output carries the level and module path; otherwise only the
/// message is printed.
#[must_use]
pub fn build_logger(verbosity: Verbosity) -> Logger {
    let mut builder = Builder::new();
    builder.filter_level(verbosity.level()).target(Target::Stderr);

    if verbosity == Verbosity::Debug {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}",
                record.level(),
                record.target(),
                record.args()
            )
        });
    } else {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }

    builder.build()
}

/// Install the logger for this process.
pub fn init_logging(verbosity: Verbosity) -> Result<()> {
    let logger = build_logger(verbosity);
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}
