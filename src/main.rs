//! tandem - Sort imports and format code in one pass

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::process::ExitCode;

use tandem_fmt::commands::run;
use tandem_fmt::logging::init_logging;
use tandem_fmt::report::init_color;
use tandem_fmt::{parse_args, Config, ConfigResolver, DiscoveredConfig, FixedConfig, Pipeline};
use tandem_fmt::Result;

fn main() -> Result<ExitCode> {
    let args = parse_args();
    init_logging(args.verbosity)?;
    init_color();
    let options = args.options();

    // Configure thread pool if --jobs specified
    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                log::warn!("Failed to configure thread pool: {e}");
            }
        }
    }

    // An explicit config file applies to every path
    let resolver: Box<dyn ConfigResolver> = match &args.config {
        Some(path) => {
            log::debug!("Using explicit config file: {}", path.display());
            Box::new(FixedConfig(Config::from_toml_file(path)?))
        }
        None => Box::new(DiscoveredConfig::new()),
    };

    let failed = run(
        args.mode,
        &args.paths_or_cwd(),
        Pipeline::new(resolver),
        &options,
    )?;

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
