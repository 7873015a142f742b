//! Map stage and fan-in.
//!
//! The workflow is illustrated as following:
//!
//! ```text
//! sources --partition--> task 0 (thread) --\
//!                        task 1 (thread) ---+--> channel --> aggregator --> join all
//!                        task N (thread) --/
//! ```
//!
//! Each filter task runs on its own thread and reads only the sources it was assigned.
//! When a task is done it sends its whole partial result through a channel; the aggregator
//! drains that channel until every sender is gone, which is the single barrier of the run.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use log;

use crate::csv_parser::RecordSource;
use crate::error::{PipelineError, SourceError};
use crate::partition::Assignment;
use crate::record::Record;

type Sender = mpsc::Sender<TaskOutput>;
type Join = thread::JoinHandle<()>;

/// What one filter task hands over once finished.
#[derive(Debug)]
pub struct TaskOutput {
    pub task_id: usize,
    pub records: Vec<Record>,
    pub skipped: Vec<SourceError>,
}

/// A map worker bound to a fixed list of sources.
#[derive(Debug, Clone)]
pub struct FilterTask {
    assignment: Assignment,
    threshold: i64,
}

impl FilterTask {
    pub fn new(assignment: Assignment, threshold: i64) -> FilterTask {
        FilterTask {
            assignment,
            threshold,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.assignment.task_id
    }

    /// Read every assigned source in order and keep the rows meeting the threshold.
    ///
    /// A source that fails is reported and skipped; the remaining sources are still read.
    pub fn run<S: RecordSource + ?Sized>(&self, source: &S) -> TaskOutput {
        let mut records = vec![];
        let mut skipped = vec![];

        for source_id in &self.assignment.sources {
            match source.read(source_id) {
                Ok(rows) => {
                    let before = records.len();

                    for record in rows.into_iter().filter(|r| r.meets(self.threshold)) {
                        log::trace!("Task {} keeps {}", self.id(), record);
                        records.push(record);
                    }

                    log::debug!(
                        "Task {} kept {} records from {}",
                        self.id(),
                        records.len() - before,
                        source_id
                    );
                }
                Err(err) => {
                    log::warn!("Task {} skips {}: {}", self.id(), source_id, err);
                    skipped.push(err);
                }
            }
        }

        TaskOutput {
            task_id: self.id(),
            records,
            skipped,
        }
    }
}

/// The merged output of every task.
///
/// Records of one task stay contiguous and in read order; the order between tasks follows
/// completion order and is not stable across runs.
#[derive(Debug, Default)]
pub struct Combined {
    pub records: Vec<Record>,
    pub skipped: Vec<SourceError>,
}

pub struct Aggregator<S: RecordSource + 'static> {
    source: Arc<S>,
}

impl<S: RecordSource + 'static> Aggregator<S> {
    pub fn new(source: Arc<S>) -> Aggregator<S> {
        Aggregator { source }
    }

    /// Run all tasks concurrently and block until the last one has finished.
    pub fn run(&self, tasks: Vec<FilterTask>) -> Result<Combined, PipelineError> {
        let (rx, joins) = self.spawn_mappers(tasks);

        let mut combined = Combined::default();
        let mut finished = 0;

        // Ends once every worker has dropped its sender.
        for output in rx {
            log::debug!(
                "Task {} finished with {} records",
                output.task_id,
                output.records.len()
            );

            finished += 1;
            combined.records.extend(output.records);
            combined.skipped.extend(output.skipped);
        }

        for (task_id, join) in joins {
            if join.join().is_err() {
                return Err(PipelineError::WorkerPanicked { task_id });
            }
        }

        log::info!(
            "{} tasks finished, {} records combined, {} sources skipped",
            finished,
            combined.records.len(),
            combined.skipped.len()
        );

        Ok(combined)
    }

    fn spawn_mappers(
        &self,
        tasks: Vec<FilterTask>,
    ) -> (mpsc::Receiver<TaskOutput>, Vec<(usize, Join)>) {
        let (tx, rx) = mpsc::channel();

        let joins = tasks
            .into_iter()
            .map(|task| {
                let tx: Sender = tx.clone();
                let source = Arc::clone(&self.source);
                let task_id = task.id();

                log::debug!(
                    "Spawn task {} over {} sources",
                    task_id,
                    task.assignment.sources.len()
                );

                let handle = thread::spawn(move || {
                    let output = task.run(source.as_ref());
                    // The receiver outlives every worker.
                    let _ = tx.send(output);
                });

                (task_id, handle)
            })
            .collect();

        // To avoid deadlock, the collector must not hold a sender of its own.
        drop(tx);

        (rx, joins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// In-memory source with optional per-source delay and failure.
    #[derive(Default)]
    struct FakeSource {
        rows: HashMap<String, Vec<Record>>,
        delays: HashMap<String, Duration>,
        reads: AtomicUsize,
    }

    impl FakeSource {
        fn with(mut self, id: &str, rows: Vec<Record>) -> FakeSource {
            self.rows.insert(id.to_string(), rows);
            self
        }

        fn slow(mut self, id: &str, delay: Duration) -> FakeSource {
            self.delays.insert(id.to_string(), delay);
            self
        }
    }

    impl RecordSource for FakeSource {
        fn read(&self, source_id: &str) -> Result<Vec<Record>, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delays.get(source_id) {
                thread::sleep(*delay);
            }

            self.rows
                .get(source_id)
                .cloned()
                .ok_or_else(|| SourceError::Unavailable {
                    id: source_id.to_string(),
                    cause: io::Error::new(io::ErrorKind::NotFound, "no such source"),
                })
        }
    }

    fn task(task_id: usize, sources: &[&str], threshold: i64) -> FilterTask {
        let assignment = Assignment {
            task_id,
            sources: sources.iter().map(|s| s.to_string()).collect(),
        };
        FilterTask::new(assignment, threshold)
    }

    #[test]
    fn test_filter_task_keeps_order_and_threshold() {
        let source = FakeSource::default()
            .with(
                "a.csv",
                vec![
                    Record::new("CA", "LA", 5000),
                    Record::new("CA", "Tiny", 10),
                    Record::new("CA", "SF", 3000),
                ],
            )
            .with("b.csv", vec![Record::new("NY", "NYC", 1000)]);

        let output = task(0, &["a.csv", "b.csv"], 1000).run(&source);

        assert_eq!(
            output.records,
            vec![
                Record::new("CA", "LA", 5000),
                Record::new("CA", "SF", 3000),
                Record::new("NY", "NYC", 1000),
            ]
        );
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_filter_task_skips_unreadable_source() {
        let source = FakeSource::default()
            .with("a.csv", vec![Record::new("TX", "Austin", 961855)])
            .with("c.csv", vec![Record::new("TX", "Dallas", 1304379)]);

        let output = task(1, &["a.csv", "missing.csv", "c.csv"], 0).run(&source);

        assert_eq!(output.records.len(), 2);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].source_id(), "missing.csv");
        assert_eq!(source.reads.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_assignment_yields_empty_output() {
        let source = FakeSource::default();

        let output = task(2, &[], 0).run(&source);

        assert!(output.records.is_empty());
        assert_eq!(source.reads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_aggregator_combines_every_partial() {
        let source = FakeSource::default()
            .with("a.csv", vec![Record::new("CA", "LA", 5000), Record::new("CA", "SF", 3000)])
            .with("b.csv", vec![Record::new("NY", "NYC", 9000)])
            .with("c.csv", vec![Record::new("NY", "Buffalo", 100)]);

        let tasks = vec![
            task(0, &["a.csv"], 1000),
            task(1, &["b.csv", "c.csv"], 1000),
            task(2, &[], 1000),
        ];

        let combined = Aggregator::new(Arc::new(source)).run(tasks).unwrap();

        let mut labels: Vec<_> = combined.records.iter().map(|r| r.label.as_str()).collect();
        labels.sort();
        assert_eq!(labels, vec!["LA", "NYC", "SF"]);

        // Records of one task stay adjacent and in read order.
        let la = combined.records.iter().position(|r| r.label == "LA").unwrap();
        assert_eq!(combined.records[la + 1].label, "SF");
    }

    #[test]
    fn test_aggregator_waits_for_slowest_task() {
        let delay = Duration::from_millis(300);
        let source = FakeSource::default()
            .with("fast.csv", vec![Record::new("CA", "LA", 5000)])
            .with("slow.csv", vec![Record::new("NY", "NYC", 9000)])
            .slow("slow.csv", delay);

        let tasks = vec![task(0, &["fast.csv"], 0), task(1, &["slow.csv"], 0)];

        let started = Instant::now();
        let combined = Aggregator::new(Arc::new(source)).run(tasks).unwrap();

        assert!(started.elapsed() >= delay);
        assert_eq!(combined.records.len(), 2);
        assert!(combined.records.iter().any(|r| r.label == "NYC"));
    }

    #[test]
    fn test_aggregator_collects_skipped_sources() {
        let source = FakeSource::default().with("a.csv", vec![Record::new("CA", "LA", 5000)]);

        let tasks = vec![task(0, &["a.csv", "x.csv"], 0), task(1, &["y.csv"], 0)];

        let combined = Aggregator::new(Arc::new(source)).run(tasks).unwrap();

        let mut skipped: Vec<_> = combined.skipped.iter().map(|e| e.source_id()).collect();
        skipped.sort();
        assert_eq!(skipped, vec!["x.csv", "y.csv"]);
        assert_eq!(combined.records.len(), 1);
    }

    struct PanickingSource;

    impl RecordSource for PanickingSource {
        fn read(&self, _source_id: &str) -> Result<Vec<Record>, SourceError> {
            panic!("broken source");
        }
    }

    #[test]
    fn test_aggregator_reports_worker_panic() {
        let tasks = vec![task(0, &[], 0), task(1, &["boom.csv"], 0)];

        let err = Aggregator::new(Arc::new(PanickingSource)).run(tasks).unwrap_err();

        match err {
            PipelineError::WorkerPanicked { task_id } => assert_eq!(task_id, 1),
        }
    }
}
