//! Generate city csv files for tests.

use rand::{self, Rng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use city_report::Record;

const STATES: &[&str] = &["CA", "NY", "TX", "WA", "OR", "FL", "IL"];

// Generate random string in alphanumeric distributions ([a-zA-Z0-9]*) in a given length.
#[inline]
fn random_string(length: usize) -> String {
    let rand_string: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(length)
        .collect();

    rand_string
}

pub fn random_records(rows: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();

    (0..rows)
        .map(|_| {
            let state = STATES[rng.gen_range(0, STATES.len())];
            Record::new(state, random_string(10), rng.gen_range(0, 10_000_000))
        })
        .collect()
}

pub fn write_csv(path: &Path, records: &[Record]) -> Result<(), std::io::Error> {
    let file = File::create(path)?;
    let mut buff_writer = BufWriter::new(file);

    for record in records {
        writeln!(buff_writer, "{}", record)?;
    }

    buff_writer.flush()
}
