//! Durable sequence counter repository.
//!
//! One row per bucket with atomic increment-and-fetch. The increment and
//! the ledger append run in a single database transaction, so either both
//! become durable or neither does. Allocation is idempotent on
//! `(document_id, revision_number)`: a retried commit after a crash finds
//! the already-issued assignment instead of consuming another value.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, QueryFilter, Statement, TransactionTrait,
};
use tracing::debug;

use sequora_core::numbering::{
    AssignmentRecord, BucketKey, NewAssignment, NumberingError, SequenceStore,
};
use sequora_shared::types::AssignmentId;

use crate::entities::{number_assignments, sequence_counters};
use crate::repositories::assignment::{active_model_from_record, record_from_model};

/// Atomic increment-and-fetch. `ON CONFLICT` creates the counter row lazily
/// on first allocation; the row-level lock taken by the update serializes
/// concurrent allocations for the same bucket without blocking other
/// buckets.
const ALLOCATE_SQL: &str = r"
INSERT INTO sequence_counters
    (organization_id, document_kind, fiscal_year, period_label, current_value, updated_at)
VALUES ($1, $2, $3, $4, 1, NOW())
ON CONFLICT (organization_id, document_kind, fiscal_year, period_label)
DO UPDATE SET
    current_value = sequence_counters.current_value + 1,
    updated_at = NOW()
RETURNING current_value
";

fn store_err(err: DbErr) -> NumberingError {
    NumberingError::AllocationUnavailable(err.to_string())
}

/// Sequence counter repository.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_existing(
        &self,
        txn: &DatabaseTransaction,
        assignment: &NewAssignment,
    ) -> Result<Option<number_assignments::Model>, DbErr> {
        number_assignments::Entity::find()
            .filter(
                number_assignments::Column::DocumentId
                    .eq(assignment.document_id.into_inner()),
            )
            .filter(
                number_assignments::Column::RevisionNumber
                    .eq(i32::try_from(assignment.revision_number).unwrap_or(i32::MAX)),
            )
            .one(txn)
            .await
    }

    async fn increment(
        &self,
        txn: &DatabaseTransaction,
        bucket: &BucketKey,
    ) -> Result<u64, NumberingError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            ALLOCATE_SQL,
            [
                bucket.organization_id.into_inner().into(),
                bucket.document_kind.as_str().into(),
                bucket.fiscal_year.into(),
                bucket.period_label.clone().into(),
            ],
        );
        let row = txn
            .query_one(stmt)
            .await
            .map_err(store_err)?
            .ok_or_else(|| {
                NumberingError::Internal("counter upsert returned no row".to_string())
            })?;
        let value: i64 = row.try_get("", "current_value").map_err(store_err)?;
        u64::try_from(value).map_err(|_| {
            NumberingError::Internal(format!("counter overflowed into negative: {value}"))
        })
    }
}

#[async_trait]
impl SequenceStore for SequenceRepository {
    async fn current_value(&self, bucket: &BucketKey) -> Result<u64, NumberingError> {
        let model = sequence_counters::Entity::find_by_id((
            bucket.organization_id.into_inner(),
            bucket.document_kind.as_str().to_string(),
            bucket.fiscal_year,
            bucket.period_label.clone(),
        ))
        .one(&self.db)
        .await
        .map_err(store_err)?;

        Ok(model
            .map(|m| u64::try_from(m.current_value).unwrap_or(0))
            .unwrap_or(0))
    }

    async fn allocate(
        &self,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, NumberingError> {
        let txn = self.db.begin().await.map_err(store_err)?;

        // Idempotency: a retried commit returns the already-issued record.
        if let Some(existing) = self
            .find_existing(&txn, &assignment)
            .await
            .map_err(store_err)?
        {
            txn.commit().await.map_err(store_err)?;
            let record = record_from_model(existing)?;
            if record.bucket == assignment.bucket {
                return Ok(record);
            }
            return Err(NumberingError::DuplicateCommit {
                document_id: assignment.document_id,
                committed: record.bucket,
                requested: assignment.bucket,
            });
        }

        let sequence_value = self.increment(&txn, &assignment.bucket).await?;

        let record = AssignmentRecord {
            id: AssignmentId::new(),
            document_id: assignment.document_id,
            revision_number: assignment.revision_number,
            display_number: assignment.display.render(&assignment.bucket, sequence_value),
            bucket: assignment.bucket,
            sequence_value,
            document_date: assignment.document_date,
            issued_at: chrono::Utc::now(),
        };

        number_assignments::Entity::insert(active_model_from_record(&record))
            .exec(&txn)
            .await
            .map_err(store_err)?;

        txn.commit().await.map_err(store_err)?;

        debug!(
            bucket = %record.bucket,
            sequence_value = record.sequence_value,
            display_number = %record.display_number,
            "allocated document number"
        );
        Ok(record)
    }
}
