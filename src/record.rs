//! Record module consists of the basic row abstraction flowing through the pipeline.

use std::fmt::{self, Display};

/// One parsed city row.
///
/// `key` is the state used for grouping, `label` the city name and `value` its population.
/// Records are never mutated once parsed, only moved between stages.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Record {
    pub key: String,
    pub label: String,
    pub value: i64,
}

impl Record {
    pub fn new<K: Into<String>, L: Into<String>>(key: K, label: L, value: i64) -> Record {
        Record {
            key: key.into(),
            label: label.into(),
            value,
        }
    }

    #[inline]
    pub fn meets(&self, threshold: i64) -> bool {
        self.value >= threshold
    }
}

impl Display for Record {
    /// Same column layout as the input files: `city,state,population`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{},{},{}", self.label, self.key, self.value)
    }
}
