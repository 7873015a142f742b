//! Read city CSV sources into memory.
//!
//! Each source is a headerless CSV file with rows of `city,state,population`.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use log;

use crate::error::SourceError;
use crate::record::Record;

/// Anything able to turn a source identifier into its rows.
///
/// Implementations are shared by every filter task, so they must be usable from several
/// threads at once.
pub trait RecordSource: Send + Sync {
    fn read(&self, source_id: &str) -> Result<Vec<Record>, SourceError>;
}

/// Sources are file names resolved against one directory.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> CsvDirectory {
        CsvDirectory {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl RecordSource for CsvDirectory {
    fn read(&self, source_id: &str) -> Result<Vec<Record>, SourceError> {
        let path = self.root.join(source_id);

        log::debug!("Read source {}", path.display());

        let file = File::open(&path).map_err(|cause| SourceError::Unavailable {
            id: source_id.to_string(),
            cause,
        })?;

        parse_records(source_id, BufReader::new(file))
    }
}

/// Parse every row of one source. The first bad row fails the whole source.
pub fn parse_records<R: Read>(source_id: &str, reader: R) -> Result<Vec<Record>, SourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = vec![];

    for row in csv_reader.records() {
        let row = row.map_err(|cause| into_source_error(source_id, cause))?;
        let lineno = row.position().map(|pos| pos.line()).unwrap_or(0);

        if row.len() < 3 {
            return Err(SourceError::ShortRow {
                id: source_id.to_string(),
                row: lineno,
                fields: row.len(),
            });
        }

        let value: i64 = row[2].parse().map_err(|cause| SourceError::BadValue {
            id: source_id.to_string(),
            row: lineno,
            value: row[2].to_string(),
            cause,
        })?;

        records.push(Record::new(&row[1], &row[0], value));
    }

    Ok(records)
}

// An I/O failure while streaming is still an unavailable source, not a malformed one.
fn into_source_error(source_id: &str, cause: csv::Error) -> SourceError {
    if cause.is_io_error() {
        if let csv::ErrorKind::Io(err) = cause.into_kind() {
            return SourceError::Unavailable {
                id: source_id.to_string(),
                cause: err,
            };
        }
        return SourceError::Unavailable {
            id: source_id.to_string(),
            cause: io::Error::new(io::ErrorKind::Other, "csv reader failed"),
        };
    }

    SourceError::Parse {
        id: source_id.to_string(),
        cause,
    }
}
