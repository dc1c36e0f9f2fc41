//! tandem - Sort imports and format code in one pass
//!
//! Drives an import sorter and a code formatter over source trees, with
//! pre/post processing hooks, and reports per-file results.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod discover;
pub mod error;
pub mod logging;
pub mod process;
pub mod report;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs, Mode};
pub use config::{Config, ConfigResolver, DiscoveredConfig, FixedConfig, ToolConfig};
pub use error::Result;
pub use process::{Pipeline, PipelineOptions, Processed, Processor, Transform};
pub use report::{echo_results, echo_results_to};
pub use types::{FileResult, Options, Skipped};
