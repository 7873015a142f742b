//! Report cities above a population threshold, grouped by state.
//!
//! Usage: `city-report <DIR> <MIN_POP> [--workers N] [--policy contiguous|round-robin]`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger;
use failure::Error;
use log;

use city_report::{Config, ConfigError, Policy};

#[derive(Parser, Debug)]
#[command(name = "city-report", about = "Group cities above a population threshold by state")]
struct CliArgs {
    /// Directory holding the city CSV files.
    dir: PathBuf,
    /// Minimum population a city needs to be reported.
    #[arg(allow_hyphen_values = true)]
    min_pop: String,
    #[arg(short, long, default_value_t = city_report::config::DEFAULT_WORKERS)]
    workers: usize,
    #[arg(short, long, default_value = "contiguous")]
    policy: String,
    /// Only read these files from DIR instead of every `.csv` in it.
    #[arg(short, long = "source")]
    sources: Vec<String>,
}

fn main() {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");

    env_logger::init_from_env(env);

    let args = CliArgs::parse();

    let config = match configure(args) {
        Ok(config) => config,
        Err(error) => {
            log::error!("{}", error);
            process::exit(2);
        }
    };

    match city_report::build_report(&config) {
        Ok(report) => {
            for skipped in &report.skipped {
                log::warn!("Skipped {}", skipped);
            }
            log::info!(
                "Read {} of {} sources.",
                report.scanned - report.skipped.len(),
                report.scanned
            );
            print!("{}", report.text);
        }
        Err(error) => {
            let causes: Vec<String> = error.iter_chain().map(|cause| cause.to_string()).collect();
            log::error!("Failed to build report, cause: {}", causes.join(": "));
            process::exit(exit_code(&error));
        }
    }
}

/// Configuration problems anywhere in the chain exit with 2, everything else with 1.
fn exit_code(error: &Error) -> i32 {
    let misconfigured = error
        .iter_chain()
        .any(|cause| cause.downcast_ref::<ConfigError>().is_some());

    if misconfigured {
        2
    } else {
        1
    }
}

fn configure(args: CliArgs) -> Result<Config, ConfigError> {
    let threshold = Config::parse_threshold(&args.min_pop)?;
    let policy: Policy = args.policy.parse()?;

    Ok(Config::new(args.dir, threshold)
        .with_workers(args.workers)
        .with_policy(policy)
        .with_sources(args.sources))
}
