//! In-memory corpus source, used by tests and by callers that already hold
//! their records (e.g. loaded from a JSON export).

use std::collections::HashMap;

use crate::traits::CorpusSource;
use crate::types::CorpusRecord;

#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    partitions: HashMap<String, Vec<CorpusRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, partition_id: impl Into<String>, record: CorpusRecord) {
        self.partitions.entry(partition_id.into()).or_default().push(record);
    }

    pub fn with_partition(mut self, partition_id: impl Into<String>, records: Vec<CorpusRecord>) -> Self {
        self.partitions.entry(partition_id.into()).or_default().extend(records);
        self
    }
}

impl CorpusSource for InMemorySource {
    async fn load(&self, partition_id: &str) -> anyhow::Result<Vec<CorpusRecord>> {
        Ok(self.partitions.get(partition_id).cloned().unwrap_or_default())
    }
}
