//! In-memory store for tests and embedded single-process use.
//!
//! One mutex guards both the counters and the assignment log, so an
//! allocation's increment and ledger append are a single critical section,
//! matching the atomic-unit contract of [`SequenceStore::allocate`].
//! Not suitable as shared state across multiple service instances; the
//! durable store stays authoritative there.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sequora_shared::types::{AssignmentId, DocumentId, OrganizationId};

use super::error::NumberingError;
use super::store::{AssignmentLedger, ConfigSource, SequenceStore};
use super::types::{
    AssignmentRecord, BucketKey, DocumentKind, NewAssignment, NumberingConfig,
};

#[derive(Debug, Default)]
struct Inner {
    counters: HashMap<BucketKey, u64>,
    assignments: Vec<AssignmentRecord>,
}

/// In-memory sequence store and assignment ledger.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every assignment ever recorded, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::Internal` if the internal lock is poisoned.
    pub fn all_assignments(&self) -> Result<Vec<AssignmentRecord>, NumberingError> {
        Ok(self.lock()?.assignments.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, NumberingError> {
        self.inner
            .lock()
            .map_err(|_| NumberingError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn current_value(&self, bucket: &BucketKey) -> Result<u64, NumberingError> {
        let inner = self.lock()?;
        Ok(inner.counters.get(bucket).copied().unwrap_or(0))
    }

    async fn allocate(
        &self,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, NumberingError> {
        let mut inner = self.lock()?;

        // Idempotency: a retried commit returns the already-issued record.
        if let Some(existing) = inner.assignments.iter().find(|r| {
            r.document_id == assignment.document_id
                && r.revision_number == assignment.revision_number
        }) {
            if existing.bucket == assignment.bucket {
                return Ok(existing.clone());
            }
            return Err(NumberingError::DuplicateCommit {
                document_id: assignment.document_id,
                committed: existing.bucket.clone(),
                requested: assignment.bucket,
            });
        }

        let counter = inner.counters.entry(assignment.bucket.clone()).or_insert(0);
        *counter += 1;
        let sequence_value = *counter;

        let record = AssignmentRecord {
            id: AssignmentId::new(),
            document_id: assignment.document_id,
            revision_number: assignment.revision_number,
            display_number: assignment.display.render(&assignment.bucket, sequence_value),
            bucket: assignment.bucket,
            sequence_value,
            document_date: assignment.document_date,
            issued_at: Utc::now(),
        };
        inner.assignments.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl AssignmentLedger for MemoryStore {
    async fn find_by_document(
        &self,
        document_id: DocumentId,
        revision_number: u32,
    ) -> Result<Option<AssignmentRecord>, NumberingError> {
        let inner = self.lock()?;
        Ok(inner
            .assignments
            .iter()
            .find(|r| r.document_id == document_id && r.revision_number == revision_number)
            .cloned())
    }

    async fn find_revisions(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        let inner = self.lock()?;
        let mut revisions: Vec<AssignmentRecord> = inner
            .assignments
            .iter()
            .filter(|r| r.document_id == document_id)
            .cloned()
            .collect();
        revisions.sort_by_key(|r| r.revision_number);
        Ok(revisions)
    }

    async fn record(&self, record: AssignmentRecord) -> Result<(), NumberingError> {
        let mut inner = self.lock()?;
        let exists = inner.assignments.iter().any(|r| {
            r.document_id == record.document_id && r.revision_number == record.revision_number
        });
        if !exists {
            inner.assignments.push(record);
        }
        Ok(())
    }

    async fn bump_revision(
        &self,
        document_id: DocumentId,
        revision_number: u32,
        document_date: chrono::NaiveDate,
    ) -> Result<AssignmentRecord, NumberingError> {
        let mut inner = self.lock()?;

        // Idempotent: a retried bump that already applied returns the record.
        if let Some(existing) = inner
            .assignments
            .iter()
            .find(|r| r.document_id == document_id && r.revision_number == revision_number)
        {
            return Ok(existing.clone());
        }

        let target = inner
            .assignments
            .iter_mut()
            .filter(|r| r.document_id == document_id && r.revision_number < revision_number)
            .max_by_key(|r| r.revision_number)
            .ok_or(NumberingError::RevisionBaseMissing {
                document_id,
                revision_number,
            })?;
        target.revision_number = revision_number;
        target.document_date = document_date;
        Ok(target.clone())
    }

    async fn query_bucket(
        &self,
        bucket: &BucketKey,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        let inner = self.lock()?;
        let mut records: Vec<AssignmentRecord> = inner
            .assignments
            .iter()
            .filter(|r| &r.bucket == bucket)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.sequence_value);
        Ok(records)
    }
}

/// Fixed set of numbering configurations, for tests and embedded use.
#[derive(Debug, Default)]
pub struct StaticConfigs {
    configs: HashMap<(OrganizationId, DocumentKind), NumberingConfig>,
}

impl StaticConfigs {
    /// Creates an empty config source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a configuration.
    pub fn insert(&mut self, config: NumberingConfig) {
        self.configs
            .insert((config.organization_id, config.document_kind), config);
    }
}

#[async_trait]
impl ConfigSource for StaticConfigs {
    async fn numbering_config(
        &self,
        organization_id: OrganizationId,
        document_kind: DocumentKind,
    ) -> Result<NumberingConfig, NumberingError> {
        self.configs
            .get(&(organization_id, document_kind))
            .cloned()
            .ok_or(NumberingError::ConfigNotFound {
                organization_id,
                document_kind,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::DisplayRule;
    use chrono::NaiveDate;

    fn bucket(period_label: &str) -> BucketKey {
        BucketKey {
            organization_id: OrganizationId::from_uuid(uuid::Uuid::nil()),
            document_kind: DocumentKind::Invoice,
            fiscal_year: 2024,
            period_label: period_label.to_string(),
        }
    }

    fn new_assignment(bucket: BucketKey, document_id: DocumentId) -> NewAssignment {
        NewAssignment {
            bucket,
            document_id,
            revision_number: 0,
            document_date: NaiveDate::from_ymd_opt(2024, 10, 24).unwrap(),
            display: DisplayRule {
                prefix: "INV".to_string(),
                fiscal_year_start_month: 1,
                sequence_padding: 5,
            },
        }
    }

    #[tokio::test]
    async fn test_counters_start_at_zero_and_increment() {
        let store = MemoryStore::new();
        let b = bucket("OCT");
        assert_eq!(store.current_value(&b).await.unwrap(), 0);

        let first = store
            .allocate(new_assignment(b.clone(), DocumentId::new()))
            .await
            .unwrap();
        assert_eq!(first.sequence_value, 1);
        assert_eq!(first.display_number, "INV/2024/OCT/00001");
        assert_eq!(store.current_value(&b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_buckets_do_not_share_counters() {
        let store = MemoryStore::new();
        store
            .allocate(new_assignment(bucket("OCT"), DocumentId::new()))
            .await
            .unwrap();
        let nov = store
            .allocate(new_assignment(bucket("NOV"), DocumentId::new()))
            .await
            .unwrap();
        assert_eq!(nov.sequence_value, 1);
    }

    #[tokio::test]
    async fn test_allocate_is_idempotent_per_document_revision() {
        let store = MemoryStore::new();
        let doc = DocumentId::new();
        let first = store
            .allocate(new_assignment(bucket("OCT"), doc))
            .await
            .unwrap();
        let second = store
            .allocate(new_assignment(bucket("OCT"), doc))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.current_value(&bucket("OCT")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_allocate_rejects_bucket_change() {
        let store = MemoryStore::new();
        let doc = DocumentId::new();
        store
            .allocate(new_assignment(bucket("OCT"), doc))
            .await
            .unwrap();
        let err = store
            .allocate(new_assignment(bucket("NOV"), doc))
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::DuplicateCommit { .. }));
    }

    #[tokio::test]
    async fn test_record_is_idempotent() {
        let store = MemoryStore::new();
        let doc = DocumentId::new();
        let rec = store
            .allocate(new_assignment(bucket("OCT"), doc))
            .await
            .unwrap();
        store.record(rec.clone()).await.unwrap();
        assert_eq!(store.all_assignments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_revisions_sorted_ascending() {
        let store = MemoryStore::new();
        let doc = DocumentId::new();
        let other = DocumentId::new();

        // Insert out of order; each amendment consumes a fresh value.
        for revision in [0, 2, 1] {
            let mut assignment = new_assignment(bucket("OCT"), doc);
            assignment.revision_number = revision;
            store.allocate(assignment).await.unwrap();
        }
        store
            .allocate(new_assignment(bucket("OCT"), other))
            .await
            .unwrap();

        let revisions = store.find_revisions(doc).await.unwrap();
        let numbers: Vec<u32> = revisions.iter().map(|r| r.revision_number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert!(revisions.iter().all(|r| r.document_id == doc));
    }

    #[tokio::test]
    async fn test_bump_revision_updates_in_place() {
        let store = MemoryStore::new();
        let doc = DocumentId::new();
        let original = store
            .allocate(new_assignment(bucket("OCT"), doc))
            .await
            .unwrap();

        let amended = store
            .bump_revision(doc, 1, NaiveDate::from_ymd_opt(2024, 10, 30).unwrap())
            .await
            .unwrap();

        assert_eq!(amended.sequence_value, original.sequence_value);
        assert_eq!(amended.display_number, original.display_number);
        assert_eq!(amended.revision_number, 1);
        assert_eq!(store.all_assignments().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bump_revision_requires_base() {
        let store = MemoryStore::new();
        let err = store
            .bump_revision(DocumentId::new(), 1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::RevisionBaseMissing { .. }));
    }

    #[tokio::test]
    async fn test_query_bucket_ordered_by_sequence() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            store
                .allocate(new_assignment(bucket("OCT"), DocumentId::new()))
                .await
                .unwrap();
        }
        let records = store.query_bucket(&bucket("OCT")).await.unwrap();
        let values: Vec<u64> = records.iter().map(|r| r.sequence_value).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
