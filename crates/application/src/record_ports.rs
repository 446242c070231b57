use async_trait::async_trait;

use congress_core::AppResult;
use congress_domain::{EntityKind, Record};

use crate::refine::{PaginationWindow, Predicate, ResolvedSortKey};

/// Repository port for congress records of every entity kind.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Counts records of a kind matching the predicate.
    async fn count_records(&self, kind: EntityKind, predicate: &Predicate) -> AppResult<u64>;

    /// Returns one sorted page of records matching the predicate.
    async fn fetch_records(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[ResolvedSortKey],
        window: PaginationWindow,
    ) -> AppResult<Vec<Record>>;

    /// Finds a record by id.
    async fn find_record(&self, kind: EntityKind, record_id: &str) -> AppResult<Option<Record>>;

    /// Inserts a new record.
    async fn insert_record(&self, record: Record) -> AppResult<()>;

    /// Replaces an existing record.
    async fn update_record(&self, record: Record) -> AppResult<()>;

    /// Deletes a record; returns whether it existed.
    async fn delete_record(&self, kind: EntityKind, record_id: &str) -> AppResult<bool>;
}
