use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use structeval_core::{Branch, InputModality, TaskRecord, DEFAULT_OPEN_MARKER};

/// Assigns each record to one of the four evaluation branches.
///
/// Modality comes from the query (does it embed a payload marker?),
/// renderability straight from the record's `rendering` flag.
#[derive(Debug, Clone)]
pub struct TaskClassifier {
    payload_marker: String,
}

impl TaskClassifier {
    pub fn new(payload_marker: impl Into<String>) -> Self {
        Self {
            payload_marker: payload_marker.into(),
        }
    }

    pub fn modality(&self, record: &TaskRecord) -> InputModality {
        InputModality::of_query(&record.query, &self.payload_marker)
    }

    pub fn classify(&self, record: &TaskRecord) -> Branch {
        Branch::new(self.modality(record), record.rendering)
    }

    pub fn partition(&self, records: &[TaskRecord]) -> ClassifiedBatch {
        let mut buckets: BTreeMap<Branch, Vec<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            buckets.entry(self.classify(record)).or_default().push(index);
        }
        ClassifiedBatch { buckets }
    }
}

impl Default for TaskClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_OPEN_MARKER)
    }
}

/// Record indices grouped by branch. Every index appears in exactly one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedBatch {
    pub buckets: BTreeMap<Branch, Vec<usize>>,
}

impl ClassifiedBatch {
    pub fn indices(&self, branch: Branch) -> &[usize] {
        self.buckets.get(&branch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, branch: Branch) -> usize {
        self.indices(branch).len()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Branch of every record, in batch order.
    pub fn branches(&self) -> Vec<Branch> {
        let mut assigned: Vec<(usize, Branch)> = self
            .buckets
            .iter()
            .flat_map(|(branch, indices)| indices.iter().map(move |index| (*index, *branch)))
            .collect();
        assigned.sort_by_key(|(index, _)| *index);
        assigned.into_iter().map(|(_, branch)| branch).collect()
    }
}
