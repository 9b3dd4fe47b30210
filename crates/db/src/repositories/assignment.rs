//! Assignment ledger repository.
//!
//! The ledger serves conflict analysis and audit. Rows are immutable except
//! for revision bumps, and the ledger is never consulted for the next
//! counter value; that is the sequence repository's job.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use sequora_core::numbering::{
    AssignmentLedger, AssignmentRecord, BucketKey, DocumentKind, NumberingError,
};
use sequora_shared::types::{AssignmentId, DocumentId, OrganizationId};

use crate::entities::number_assignments;

/// Converts a row into the core assignment record.
pub(crate) fn record_from_model(
    model: number_assignments::Model,
) -> Result<AssignmentRecord, NumberingError> {
    let document_kind: DocumentKind = model.document_kind.parse()?;
    let sequence_value = u64::try_from(model.sequence_value).map_err(|_| {
        NumberingError::Internal(format!(
            "negative sequence value in ledger: {}",
            model.sequence_value
        ))
    })?;
    let revision_number = u32::try_from(model.revision_number).map_err(|_| {
        NumberingError::Internal(format!(
            "negative revision number in ledger: {}",
            model.revision_number
        ))
    })?;

    Ok(AssignmentRecord {
        id: AssignmentId::from_uuid(model.id),
        document_id: DocumentId::from_uuid(model.document_id),
        revision_number,
        bucket: BucketKey {
            organization_id: OrganizationId::from_uuid(model.organization_id),
            document_kind,
            fiscal_year: model.fiscal_year,
            period_label: model.period_label,
        },
        sequence_value,
        document_date: model.document_date,
        display_number: model.display_number,
        issued_at: model.issued_at.with_timezone(&Utc),
    })
}

/// Converts a core assignment record into an insertable row.
pub(crate) fn active_model_from_record(
    record: &AssignmentRecord,
) -> number_assignments::ActiveModel {
    number_assignments::ActiveModel {
        id: Set(record.id.into_inner()),
        organization_id: Set(record.bucket.organization_id.into_inner()),
        document_kind: Set(record.bucket.document_kind.as_str().to_string()),
        document_id: Set(record.document_id.into_inner()),
        revision_number: Set(i32::try_from(record.revision_number).unwrap_or(i32::MAX)),
        fiscal_year: Set(record.bucket.fiscal_year),
        period_label: Set(record.bucket.period_label.clone()),
        sequence_value: Set(i64::try_from(record.sequence_value).unwrap_or(i64::MAX)),
        document_date: Set(record.document_date),
        display_number: Set(record.display_number.clone()),
        issued_at: Set(record.issued_at.into()),
    }
}

fn ledger_err(err: DbErr) -> NumberingError {
    NumberingError::LedgerUnavailable(err.to_string())
}

/// Assignment ledger repository.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    db: DatabaseConnection,
}

impl AssignmentRepository {
    /// Creates a new assignment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(
        &self,
        document_id: Uuid,
        revision_number: i32,
    ) -> Result<Option<number_assignments::Model>, DbErr> {
        number_assignments::Entity::find()
            .filter(number_assignments::Column::DocumentId.eq(document_id))
            .filter(number_assignments::Column::RevisionNumber.eq(revision_number))
            .one(&self.db)
            .await
    }
}

#[async_trait]
impl AssignmentLedger for AssignmentRepository {
    async fn find_by_document(
        &self,
        document_id: DocumentId,
        revision_number: u32,
    ) -> Result<Option<AssignmentRecord>, NumberingError> {
        let revision = i32::try_from(revision_number).unwrap_or(i32::MAX);
        let model = self
            .find_model(document_id.into_inner(), revision)
            .await
            .map_err(ledger_err)?;
        model.map(record_from_model).transpose()
    }

    async fn find_revisions(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        let models = number_assignments::Entity::find()
            .filter(number_assignments::Column::DocumentId.eq(document_id.into_inner()))
            .order_by_asc(number_assignments::Column::RevisionNumber)
            .all(&self.db)
            .await
            .map_err(ledger_err)?;
        models.into_iter().map(record_from_model).collect()
    }

    async fn record(&self, record: AssignmentRecord) -> Result<(), NumberingError> {
        // Idempotent append: an identical (document_id, revision_number)
        // tuple is a no-op, never an error.
        let insert = number_assignments::Entity::insert(active_model_from_record(&record))
            .on_conflict(
                OnConflict::columns([
                    number_assignments::Column::DocumentId,
                    number_assignments::Column::RevisionNumber,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.db)
            .await;

        match insert {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(err) => Err(ledger_err(err)),
        }
    }

    async fn bump_revision(
        &self,
        document_id: DocumentId,
        revision_number: u32,
        document_date: chrono::NaiveDate,
    ) -> Result<AssignmentRecord, NumberingError> {
        let revision = i32::try_from(revision_number).unwrap_or(i32::MAX);

        // Idempotent: a retried bump that already applied returns the record.
        if let Some(applied) = self
            .find_model(document_id.into_inner(), revision)
            .await
            .map_err(ledger_err)?
        {
            return record_from_model(applied);
        }

        let base = number_assignments::Entity::find()
            .filter(number_assignments::Column::DocumentId.eq(document_id.into_inner()))
            .filter(number_assignments::Column::RevisionNumber.lt(revision))
            .order_by_desc(number_assignments::Column::RevisionNumber)
            .one(&self.db)
            .await
            .map_err(ledger_err)?
            .ok_or(NumberingError::RevisionBaseMissing {
                document_id,
                revision_number,
            })?;

        let mut active: number_assignments::ActiveModel = base.into();
        active.revision_number = Set(revision);
        active.document_date = Set(document_date);
        let updated = active.update(&self.db).await.map_err(ledger_err)?;
        record_from_model(updated)
    }

    async fn query_bucket(
        &self,
        bucket: &BucketKey,
    ) -> Result<Vec<AssignmentRecord>, NumberingError> {
        let models = number_assignments::Entity::find()
            .filter(
                number_assignments::Column::OrganizationId
                    .eq(bucket.organization_id.into_inner()),
            )
            .filter(
                number_assignments::Column::DocumentKind.eq(bucket.document_kind.as_str()),
            )
            .filter(number_assignments::Column::FiscalYear.eq(bucket.fiscal_year))
            .filter(number_assignments::Column::PeriodLabel.eq(bucket.period_label.clone()))
            .order_by_asc(number_assignments::Column::SequenceValue)
            .all(&self.db)
            .await
            .map_err(ledger_err)?;
        models.into_iter().map(record_from_model).collect()
    }
}
