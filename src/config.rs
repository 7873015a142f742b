//! Run configuration and source discovery.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log;

use crate::error::ConfigError;
use crate::partition::Policy;

pub const DEFAULT_WORKERS: usize = 3;

const SOURCE_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub dir: PathBuf,
    pub threshold: i64,
    pub workers: usize,
    pub policy: Policy,
    /// Explicit source names; when empty the directory is scanned instead.
    pub sources: Vec<String>,
}

impl Config {
    pub fn new<P: AsRef<Path>>(dir: P, threshold: i64) -> Config {
        Config {
            dir: dir.as_ref().to_path_buf(),
            threshold,
            workers: DEFAULT_WORKERS,
            policy: Policy::default(),
            sources: vec![],
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Config {
        self.workers = workers;
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Config {
        self.policy = policy;
        self
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Config
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn parse_threshold(value: &str) -> Result<i64, ConfigError> {
        value
            .trim()
            .parse()
            .map_err(|cause| ConfigError::InvalidThreshold {
                value: value.to_string(),
                cause,
            })
    }

    /// The ordered, duplicate free list of sources to process.
    pub fn resolve_sources(&self) -> Result<Vec<String>, ConfigError> {
        if self.sources.is_empty() {
            return discover_sources(&self.dir);
        }

        check_directory(&self.dir)?;

        let mut seen = HashSet::new();
        let sources = self
            .sources
            .iter()
            .filter(|source| seen.insert(source.as_str()))
            .cloned()
            .collect();

        Ok(sources)
    }
}

fn check_directory(dir: &Path) -> Result<(), ConfigError> {
    let missing = |cause| ConfigError::MissingDirectory {
        path: dir.display().to_string(),
        cause,
    };

    let metadata = fs::metadata(dir).map_err(missing)?;
    if !metadata.is_dir() {
        return Err(missing(io::Error::new(
            io::ErrorKind::Other,
            "not a directory",
        )));
    }

    Ok(())
}

/// List every `.csv` file directly under `dir`, in natural order.
pub fn discover_sources<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, ConfigError> {
    let dir = dir.as_ref();

    let entries = fs::read_dir(dir).map_err(|cause| ConfigError::MissingDirectory {
        path: dir.display().to_string(),
        cause,
    })?;

    let mut sources: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == SOURCE_EXTENSION))
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();

    sources.sort_by(|a, b| natural_cmp(a, b));

    log::debug!("Discovered {} sources in {}", sources.len(), dir.display());

    Ok(sources)
}

/// Compare names so that embedded numbers sort by value: `cities2` < `cities10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ln = take_number(&mut left);
                let rn = take_number(&mut right);
                let order = ln
                    .trim_start_matches('0')
                    .len()
                    .cmp(&rn.trim_start_matches('0').len())
                    .then_with(|| ln.trim_start_matches('0').cmp(rn.trim_start_matches('0')));
                if order != Ordering::Equal {
                    return order;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_number<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}
