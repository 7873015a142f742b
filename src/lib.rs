//! Report cities above a population threshold, grouped by state.
//!
//! The sources are split across a fixed number of filter threads (map), the partial results
//! are merged once every thread is done (fan-in), and a single reducer ranks the states by
//! how many of their cities survived and renders the report.

use std::sync::Arc;

use failure::{Error, ResultExt};
use log;

pub mod config;
pub mod csv_parser;
pub mod error;
pub mod map_reduce;
pub mod partition;
pub mod record;
pub mod reduce;

pub use crate::config::Config;
pub use crate::csv_parser::{CsvDirectory, RecordSource};
pub use crate::error::{ConfigError, PipelineError, SourceError};
pub use crate::map_reduce::{Aggregator, Combined, FilterTask};
pub use crate::partition::{Assignment, Policy};
pub use crate::record::Record;
pub use crate::reduce::{Group, Reducer};

/// Outcome of a full run.
#[derive(Debug)]
pub struct Report {
    pub text: String,
    pub groups: Vec<Group>,
    /// Sources that could not be read, in no particular order.
    pub skipped: Vec<SourceError>,
    /// Number of sources that were scheduled.
    pub scanned: usize,
}

/// Main entry function: run the whole pipeline over the CSV files described by `config`.
pub fn build_report(config: &Config) -> Result<Report, Error> {
    log::info!(
        "Build report for {} with minimum population {}",
        config.dir.display(),
        config.threshold
    );

    let sources = config
        .resolve_sources()
        .context("Unable to resolve input sources")?;

    if sources.is_empty() {
        log::warn!("No sources found in {}", config.dir.display());
    }

    let source = Arc::new(CsvDirectory::new(&config.dir));

    run_pipeline(source, &sources, config)
}

/// Same as `build_report` over any record source.
pub fn run_pipeline<S: RecordSource + 'static>(
    source: Arc<S>,
    sources: &[String],
    config: &Config,
) -> Result<Report, Error> {
    let tasks: Vec<FilterTask> = config
        .policy
        .partition(sources, config.workers)?
        .into_iter()
        .map(|assignment| FilterTask::new(assignment, config.threshold))
        .collect();

    let combined = Aggregator::new(source).run(tasks)?;

    let groups = Reducer::group(&combined.records);
    let text = reduce::render(&groups);

    Ok(Report {
        text,
        groups,
        skipped: combined.skipped,
        scanned: sources.len(),
    })
}
