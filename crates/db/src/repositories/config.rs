//! Numbering configuration lookup.
//!
//! Configuration is owned by an external administration surface; this
//! repository only reads it. A change there is simply observed on the next
//! resolution, never applied retroactively to issued numbers.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use sequora_core::numbering::{
    ConfigSource, DocumentKind, NumberingConfig, NumberingError, PeriodGranularity,
    RevisionPolicy,
};
use sequora_shared::types::OrganizationId;

use crate::entities::numbering_configs;

fn parse_granularity(value: &str) -> Result<PeriodGranularity, NumberingError> {
    match value {
        "none" => Ok(PeriodGranularity::None),
        "month" => Ok(PeriodGranularity::Month),
        "quarter" => Ok(PeriodGranularity::Quarter),
        "year" => Ok(PeriodGranularity::Year),
        other => Err(NumberingError::Internal(format!(
            "unknown period granularity in config: {other}"
        ))),
    }
}

fn parse_policy(value: &str) -> Result<RevisionPolicy, NumberingError> {
    match value {
        "reuse_sequence" => Ok(RevisionPolicy::ReuseSequence),
        "new_sequence" => Ok(RevisionPolicy::NewSequence),
        other => Err(NumberingError::Internal(format!(
            "unknown revision policy in config: {other}"
        ))),
    }
}

fn config_from_model(
    model: numbering_configs::Model,
) -> Result<NumberingConfig, NumberingError> {
    Ok(NumberingConfig {
        organization_id: OrganizationId::from_uuid(model.organization_id),
        document_kind: model.document_kind.parse()?,
        prefix: model.prefix,
        period_granularity: parse_granularity(&model.period_granularity)?,
        fiscal_year_start_month: u32::try_from(model.fiscal_year_start_month).unwrap_or(0),
        sequence_padding: u32::try_from(model.sequence_padding).unwrap_or(0),
        revision_policy: parse_policy(&model.revision_policy)?,
    })
}

fn db_err(err: DbErr) -> NumberingError {
    NumberingError::Database(err.to_string())
}

/// Read-only numbering configuration repository.
#[derive(Debug, Clone)]
pub struct NumberingConfigRepository {
    db: DatabaseConnection,
}

impl NumberingConfigRepository {
    /// Creates a new configuration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConfigSource for NumberingConfigRepository {
    async fn numbering_config(
        &self,
        organization_id: OrganizationId,
        document_kind: DocumentKind,
    ) -> Result<NumberingConfig, NumberingError> {
        let model = numbering_configs::Entity::find_by_id((
            organization_id.into_inner(),
            document_kind.as_str().to_string(),
        ))
        .one(&self.db)
        .await
        .map_err(db_err)?;

        model
            .map(config_from_model)
            .transpose()?
            .ok_or(NumberingError::ConfigNotFound {
                organization_id,
                document_kind,
            })
    }
}
