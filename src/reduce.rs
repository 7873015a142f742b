//! Reducer

use std::collections::HashMap;

use log;

use crate::record::Record;

/// All surviving records sharing one key.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Group {
    pub key: String,
    pub frequency: usize,
    pub members: Vec<Record>,
}

pub struct Reducer;

impl Reducer {
    /// Group, rank and render in one go.
    pub fn run(records: &[Record]) -> String {
        log::info!("Start reducing {} records.", records.len());

        render(&Reducer::group(records))
    }

    /// Group records by key, ranked by descending frequency.
    ///
    /// Members keep the order they have in `records`. Keys with the same frequency are
    /// ordered lexically.
    pub fn group(records: &[Record]) -> Vec<Group> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Group> = vec![];

        for record in records {
            let slot = *index.entry(record.key.as_str()).or_insert_with(|| {
                groups.push(Group {
                    key: record.key.clone(),
                    frequency: 0,
                    members: vec![],
                });
                groups.len() - 1
            });

            groups[slot].frequency += 1;
            groups[slot].members.push(record.clone());
        }

        groups.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.key.cmp(&b.key)));

        groups
    }
}

/// One `<key>: <frequency>` header per group, each member below as `- <label>, <value>`.
pub fn render(groups: &[Group]) -> String {
    groups.iter().fold(String::new(), |mut output, group| {
        output.push_str(&format!("{}: {}\n", group.key, group.frequency));
        for member in &group.members {
            output.push_str(&format!("- {}, {}\n", member.label, member.value));
        }
        output
    })
}
