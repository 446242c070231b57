use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use congress_application::refine::{apply_pagination, apply_sort};
use congress_application::{PaginationWindow, Predicate, RecordRepository, ResolvedSortKey};
use congress_core::{AppError, AppResult};
use congress_domain::{EntityKind, Record};

/// In-memory record store evaluating predicates with `Predicate::matches`.
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    records: RwLock<HashMap<(EntityKind, String), Record>>,
}

impl InMemoryRecordRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn matching(&self, kind: EntityKind, predicate: &Predicate) -> Vec<Record> {
        self.records
            .read()
            .await
            .values()
            .filter(|record| record.entity() == kind && predicate.matches(record))
            .cloned()
            .collect()
    }
}

fn key(kind: EntityKind, record_id: &str) -> (EntityKind, String) {
    (kind, record_id.to_owned())
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn count_records(&self, kind: EntityKind, predicate: &Predicate) -> AppResult<u64> {
        Ok(self.matching(kind, predicate).await.len() as u64)
    }

    async fn fetch_records(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[ResolvedSortKey],
        window: PaginationWindow,
    ) -> AppResult<Vec<Record>> {
        let mut records = self.matching(kind, predicate).await;
        apply_sort(&mut records, sort);
        Ok(apply_pagination(records, window).0)
    }

    async fn find_record(&self, kind: EntityKind, record_id: &str) -> AppResult<Option<Record>> {
        Ok(self.records.read().await.get(&key(kind, record_id)).cloned())
    }

    async fn insert_record(&self, record: Record) -> AppResult<()> {
        let record_key = key(record.entity(), record.record_id().as_str());
        let mut records = self.records.write().await;

        if records.contains_key(&record_key) {
            return Err(AppError::Conflict(format!(
                "{} record '{}' already exists",
                record_key.0, record_key.1
            )));
        }

        records.insert(record_key, record);
        Ok(())
    }

    async fn update_record(&self, record: Record) -> AppResult<()> {
        let record_key = key(record.entity(), record.record_id().as_str());
        let mut records = self.records.write().await;

        let Some(existing) = records.get_mut(&record_key) else {
            return Err(AppError::NotFound(format!(
                "{} record '{}' does not exist",
                record_key.0, record_key.1
            )));
        };

        *existing = record;
        Ok(())
    }

    async fn delete_record(&self, kind: EntityKind, record_id: &str) -> AppResult<bool> {
        Ok(self
            .records
            .write()
            .await
            .remove(&key(kind, record_id))
            .is_some())
    }
}
