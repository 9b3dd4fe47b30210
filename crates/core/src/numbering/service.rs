//! Allocation orchestration: the two public entry points of the engine.
//!
//! `preview` is read-only and safe to call arbitrarily often; `commit` is
//! the single mutating path. Commit never re-runs conflict analysis:
//! rejecting a backdated entry is a caller policy, not a numbering
//! invariant, so a commit into a conflicting ordering still succeeds.

use chrono::NaiveDate;
use sequora_shared::config::AllocationConfig;
use sequora_shared::types::OrganizationId;

use super::bucket;
use super::conflict;
use super::error::NumberingError;
use super::store::{AssignmentLedger, ConfigSource, SequenceStore};
use super::types::{
    AssignmentRecord, CommitRequest, DocumentKind, NewAssignment, Preview, RevisionPolicy,
};

/// Orchestrates bucket resolution, conflict analysis, and atomic allocation.
pub struct AllocationService<C, S, L> {
    configs: C,
    store: S,
    ledger: L,
    max_attempts: u32,
}

impl<C, S, L> AllocationService<C, S, L>
where
    C: ConfigSource,
    S: SequenceStore,
    L: AssignmentLedger,
{
    /// Creates a service with the default retry budget.
    pub fn new(configs: C, store: S, ledger: L) -> Self {
        Self {
            configs,
            store,
            ledger,
            max_attempts: AllocationConfig::default().max_attempts,
        }
    }

    /// Overrides the retry budget for idempotent store operations.
    #[must_use]
    pub fn with_retry(mut self, config: &AllocationConfig) -> Self {
        self.max_attempts = config.max_attempts.max(1);
        self
    }

    /// Computes the number the next commit would receive and analyzes the
    /// candidate date for backdated conflicts. Consumes nothing; safe to
    /// call on every date-field change.
    ///
    /// # Errors
    ///
    /// Configuration errors surface immediately; a ledger read failure
    /// surfaces as `NumberingError::LedgerUnavailable` (the caller may
    /// still commit, which does not read the ledger).
    pub async fn preview(
        &self,
        organization_id: OrganizationId,
        document_kind: DocumentKind,
        candidate_date: NaiveDate,
    ) -> Result<Preview, NumberingError> {
        let config = self
            .configs
            .numbering_config(organization_id, document_kind)
            .await?;
        config.validate()?;

        let bucket = bucket::resolve(candidate_date, &config)?;
        let current = self.store.current_value(&bucket).await?;
        let records = self.ledger.query_bucket(&bucket).await?;
        let conflict = conflict::analyze(candidate_date, &bucket, &records);

        Ok(Preview {
            next_number: config.display_rule().render(&bucket, current + 1),
            conflict,
        })
    }

    /// Issues a number for a document as one atomic unit of work and
    /// returns the persisted record.
    ///
    /// Idempotent on `(document_id, revision_number)`: an unchanged retry
    /// returns the original record without allocating a second value. A
    /// retry whose date resolved to a different bucket fails with
    /// `NumberingError::DuplicateCommit`.
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` and configuration validation errors are fatal;
    /// `AllocationUnavailable` is retried up to the configured budget
    /// before surfacing.
    pub async fn commit(&self, request: CommitRequest) -> Result<AssignmentRecord, NumberingError> {
        let config = self
            .configs
            .numbering_config(request.organization_id, request.document_kind)
            .await?;
        config.validate()?;

        let bucket = bucket::resolve(request.document_date, &config)?;
        let reuses_sequence =
            request.revision_number > 0 && config.revision_policy == RevisionPolicy::ReuseSequence;

        if let Some(existing) = self
            .ledger
            .find_by_document(request.document_id, request.revision_number)
            .await?
        {
            // Amendments keep the original bucket, so a date moving across
            // buckets is benign under the reuse policy.
            if existing.bucket == bucket || reuses_sequence {
                return Ok(existing);
            }
            return Err(NumberingError::DuplicateCommit {
                document_id: request.document_id,
                committed: existing.bucket,
                requested: bucket,
            });
        }

        if reuses_sequence {
            return self.reissue(&request).await;
        }

        let assignment = NewAssignment {
            bucket,
            document_id: request.document_id,
            revision_number: request.revision_number,
            document_date: request.document_date,
            display: config.display_rule(),
        };
        self.allocate_with_retry(assignment).await
    }

    /// Re-issues an amended document under the reuse policy: the ledger
    /// record keeps its sequence value and display number, only the
    /// revision (and the amended date) advance. No counter value is
    /// consumed.
    async fn reissue(&self, request: &CommitRequest) -> Result<AssignmentRecord, NumberingError> {
        let mut attempt = 1;
        loop {
            let result = self
                .ledger
                .bump_revision(
                    request.document_id,
                    request.revision_number,
                    request.document_date,
                )
                .await;
            match result {
                Ok(record) => return Ok(record),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Bounded retry for the idempotent allocate operation.
    async fn allocate_with_retry(
        &self,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, NumberingError> {
        let mut attempt = 1;
        loop {
            match self.store.allocate(assignment.clone()).await {
                Ok(record) => return Ok(record),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
