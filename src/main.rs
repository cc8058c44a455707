mod args;
mod config;
mod error;
mod pipeline;
mod report;
mod scheduler;
mod source;
mod stats;

use anyhow::{Context, Result};
use std::io::{self, BufReader};

use args::Args;
use config::RunConfig;
use pipeline::Pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse_normalized();
    let config = RunConfig::from_args(&args).context("invalid configuration")?;
    log::info!(
        "reporting {}percentiles {}{}{} every {:?}",
        if config.percentiles.is_defaulted() { "default " } else { "" },
        config.percentiles,
        if config.show_mean { " mean," } else { "" },
        if config.show_max { " max," } else { "" },
        config.refresh_rate
    );

    let driver = Pipeline::start(&config, BufReader::new(io::stdin()), io::stdout())?;
    driver.run()?;
    Ok(())
}
