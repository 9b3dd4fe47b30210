//! Storage seams for the allocation service.
//!
//! The durable store is the only authority for counter values; no
//! in-process cache may stand in for it, since multiple service instances
//! share one store. The ledger is never consulted for the next counter
//! value, and its records are immutable except for revision bumps.

use async_trait::async_trait;
use sequora_shared::types::{DocumentId, OrganizationId};

use super::error::NumberingError;
use super::types::{
    AssignmentRecord, BucketKey, DocumentKind, NewAssignment, NumberingConfig,
};

/// Durable, per-bucket counter with atomic increment-and-fetch.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Reads the counter for a bucket without consuming a value.
    /// Buckets that have never allocated read as 0.
    async fn current_value(&self, bucket: &BucketKey) -> Result<u64, NumberingError>;

    /// Atomically increments the bucket counter and appends the assignment
    /// record as one unit: either both become durable or neither does.
    ///
    /// Idempotent on `(document_id, revision_number)`: retrying after a
    /// crash returns the already-issued record instead of allocating again.
    /// A retry that resolves to a different bucket fails with
    /// `NumberingError::DuplicateCommit`.
    async fn allocate(
        &self,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, NumberingError>;
}

/// Durable record of every issued number.
#[async_trait]
pub trait AssignmentLedger: Send + Sync {
    /// Finds the assignment for one document revision, if issued.
    async fn find_by_document(
        &self,
        document_id: DocumentId,
        revision_number: u32,
    ) -> Result<Option<AssignmentRecord>, NumberingError>;

    /// Returns every revision issued for a logical document, ordered by
    /// `revision_number` ascending.
    async fn find_revisions(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AssignmentRecord>, NumberingError>;

    /// Appends a record. Idempotent: re-recording an identical
    /// `(document_id, revision_number)` tuple is a no-op.
    async fn record(&self, record: AssignmentRecord) -> Result<(), NumberingError>;

    /// Advances the revision of an already-issued assignment in place,
    /// keeping its sequence value and display number. The record's
    /// `document_date` is updated to the amended date. Returns the updated
    /// record.
    ///
    /// Fails with `NumberingError::RevisionBaseMissing` when no issuance
    /// with a lower revision exists for the document.
    async fn bump_revision(
        &self,
        document_id: DocumentId,
        revision_number: u32,
        document_date: chrono::NaiveDate,
    ) -> Result<AssignmentRecord, NumberingError>;

    /// Returns all assignments in a bucket, ordered by `sequence_value`
    /// ascending.
    async fn query_bucket(
        &self,
        bucket: &BucketKey,
    ) -> Result<Vec<AssignmentRecord>, NumberingError>;
}

#[async_trait]
impl<T: SequenceStore + ?Sized> SequenceStore for std::sync::Arc<T> {
    async fn current_value(&self, bucket: &BucketKey) -> Result<u64, NumberingError> {
        (**self).current_value(bucket).await
    }

    async fn allocate(
        &self,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, NumberingError> {
        (**self).allocate(assignment).await
    }
}

#[async_trait]
impl<T: AssignmentLedger + ?Sized> AssignmentLedger for std::sync::Arc<T> {
    async fn find_by_document(
        &self,
        document_id: DocumentId,
        revision_number: u32,
    ) -> Result<Option<AssignmentRecord>, NumberingError> {
        (**self).find_by_document(document_id, revision_number).await
    }

    async fn find_revisions(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        (**self).find_revisions(document_id).await
    }

    async fn record(&self, record: AssignmentRecord) -> Result<(), NumberingError> {
        (**self).record(record).await
    }

    async fn bump_revision(
        &self,
        document_id: DocumentId,
        revision_number: u32,
        document_date: chrono::NaiveDate,
    ) -> Result<AssignmentRecord, NumberingError> {
        (**self)
            .bump_revision(document_id, revision_number, document_date)
            .await
    }

    async fn query_bucket(
        &self,
        bucket: &BucketKey,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        (**self).query_bucket(bucket).await
    }
}

/// Read-only lookup of numbering configuration, owned by an external
/// collaborator. Changes made there are simply observed on next resolution.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Returns the numbering configuration for an organization and kind.
    async fn numbering_config(
        &self,
        organization_id: OrganizationId,
        document_kind: DocumentKind,
    ) -> Result<NumberingConfig, NumberingError>;
}

#[async_trait]
impl<T: ConfigSource + ?Sized> ConfigSource for std::sync::Arc<T> {
    async fn numbering_config(
        &self,
        organization_id: OrganizationId,
        document_kind: DocumentKind,
    ) -> Result<NumberingConfig, NumberingError> {
        (**self).numbering_config(organization_id, document_kind).await
    }
}
