//! Static assignment of sources to filter tasks.
//!
//! The assignment is computed once, before any worker starts, and never rebalanced.

use std::str::FromStr;

use crate::error::ConfigError;

/// The sources one filter task owns, in the order it will read them.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Assignment {
    pub task_id: usize,
    pub sources: Vec<String>,
}

/// How sources are dealt out across workers.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Policy {
    /// Consecutive runs of sources; the trailing tasks absorb the remainder.
    Contiguous,
    /// Source `i` goes to task `i % workers`.
    RoundRobin,
}

impl Default for Policy {
    fn default() -> Policy {
        Policy::Contiguous
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Policy, ConfigError> {
        match name {
            "contiguous" => Ok(Policy::Contiguous),
            "round-robin" => Ok(Policy::RoundRobin),
            _ => Err(ConfigError::UnknownPolicy {
                name: name.to_string(),
            }),
        }
    }
}

impl Policy {
    /// Split `sources` into exactly `workers` assignments.
    ///
    /// Every source lands in exactly one assignment. When there are more workers than
    /// sources the surplus tasks get an empty list.
    pub fn partition(
        self,
        sources: &[String],
        workers: usize,
    ) -> Result<Vec<Assignment>, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }

        let mut assignments: Vec<Assignment> = (0..workers)
            .map(|task_id| Assignment {
                task_id,
                sources: vec![],
            })
            .collect();

        match self {
            Policy::Contiguous => {
                let base = sources.len() / workers;
                let extra = sources.len() % workers;
                let mut rest = sources;

                for (task_id, assignment) in assignments.iter_mut().enumerate() {
                    let take = if task_id >= workers - extra { base + 1 } else { base };
                    let (head, tail) = rest.split_at(take);
                    assignment.sources = head.to_vec();
                    rest = tail;
                }
            }
            Policy::RoundRobin => {
                for (index, source) in sources.iter().enumerate() {
                    assignments[index % workers].sources.push(source.clone());
                }
            }
        }

        Ok(assignments)
    }
}
