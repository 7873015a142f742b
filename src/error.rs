//! Error kinds raised across the pipeline.
//!
//! `SourceError` never escapes a filter task; it is only carried back as a diagnostic.
//! `ConfigError` stops the run before any worker is spawned.

use std::io;
use std::num::ParseIntError;

use failure::Fail;

/// A single source could not be read or decoded.
#[derive(Debug, Fail)]
pub enum SourceError {
    #[fail(display = "source {} is unavailable: {}", id, cause)]
    Unavailable {
        id: String,
        #[fail(cause)]
        cause: io::Error,
    },

    #[fail(display = "source {} is malformed: {}", id, cause)]
    Parse {
        id: String,
        #[fail(cause)]
        cause: csv::Error,
    },

    #[fail(display = "source {} has a bad population {:?} on row {}", id, value, row)]
    BadValue {
        id: String,
        row: u64,
        value: String,
        #[fail(cause)]
        cause: ParseIntError,
    },

    #[fail(display = "source {} has {} fields on row {}, expected 3", id, fields, row)]
    ShortRow { id: String, row: u64, fields: usize },
}

impl SourceError {
    pub fn source_id(&self) -> &str {
        match self {
            SourceError::Unavailable { id, .. } => id,
            SourceError::Parse { id, .. } => id,
            SourceError::BadValue { id, .. } => id,
            SourceError::ShortRow { id, .. } => id,
        }
    }
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "invalid population value: {}", value)]
    InvalidThreshold {
        value: String,
        #[fail(cause)]
        cause: ParseIntError,
    },

    #[fail(display = "worker count must be at least 1")]
    NoWorkers,

    #[fail(display = "unknown partition policy: {}", name)]
    UnknownPolicy { name: String },

    #[fail(display = "cannot list source directory {}: {}", path, cause)]
    MissingDirectory {
        path: String,
        #[fail(cause)]
        cause: io::Error,
    },
}

#[derive(Debug, Fail)]
pub enum PipelineError {
    #[fail(display = "filter task {} panicked", task_id)]
    WorkerPanicked { task_id: usize },
}
