use crate::progress::types::ProgressRecord;
use crate::upload::types::UploadResult;
use std::collections::HashMap;

/// Latest record per file name, plus the order completions arrived in
///
/// Records are keyed by file name, so two units with the same name share one
/// entry and the later record wins.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    records: HashMap<String, ProgressRecord>,
    completion_order: Vec<String>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` as the latest state of its file
    pub fn apply(&mut self, record: ProgressRecord) {
        let name = record.file_name.clone();
        if record.is_completed() {
            if !self.completion_order.contains(&name) {
                self.completion_order.push(name.clone());
            }
        } else {
            self.completion_order.retain(|n| n != &name);
        }
        self.records.insert(name, record);
    }

    pub fn get(&self, file_name: &str) -> Option<&ProgressRecord> {
        self.records.get(file_name)
    }

    pub fn remove(&mut self, file_name: &str) -> Option<ProgressRecord> {
        self.completion_order.retain(|n| n != file_name);
        self.records.remove(file_name)
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.completion_order.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values()
    }

    pub fn completed_count(&self) -> usize {
        self.completion_order.len()
    }

    /// Responses of completed files, first completion first
    pub fn completed_in_arrival_order(&self) -> Vec<UploadResult> {
        self.completion_order
            .iter()
            .filter_map(|name| self.records.get(name))
            .filter_map(|record| record.response().cloned())
            .collect()
    }

    /// True when every name in `selected` has a completed record
    ///
    /// An empty selection is never complete.
    pub fn is_batch_complete<'a, I>(&self, selected: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut any = false;
        for name in selected {
            any = true;
            if !self.get(name).is_some_and(ProgressRecord::is_completed) {
                return false;
            }
        }
        any
    }
}
