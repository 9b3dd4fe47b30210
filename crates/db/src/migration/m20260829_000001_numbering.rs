//! Initial numbering schema migration.
//!
//! Creates the configuration, counter, and assignment tables with the
//! uniqueness constraints the engine relies on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(NUMBERING_CONFIGS_SQL).await?;
        db.execute_unprepared(SEQUENCE_COUNTERS_SQL).await?;
        db.execute_unprepared(NUMBER_ASSIGNMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const NUMBERING_CONFIGS_SQL: &str = r"
CREATE TABLE numbering_configs (
    organization_id UUID NOT NULL,
    document_kind TEXT NOT NULL CHECK (document_kind IN (
        'invoice', 'credit_note', 'debit_note', 'receipt', 'quote'
    )),
    prefix TEXT NOT NULL DEFAULT '',
    period_granularity TEXT NOT NULL CHECK (period_granularity IN (
        'none', 'month', 'quarter', 'year'
    )),
    fiscal_year_start_month INTEGER NOT NULL
        CHECK (fiscal_year_start_month BETWEEN 1 AND 12),
    sequence_padding INTEGER NOT NULL DEFAULT 5
        CHECK (sequence_padding BETWEEN 1 AND 18),
    revision_policy TEXT NOT NULL DEFAULT 'reuse_sequence'
        CHECK (revision_policy IN ('reuse_sequence', 'new_sequence')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (organization_id, document_kind)
);
";

const SEQUENCE_COUNTERS_SQL: &str = r"
-- One row per bucket, created lazily on first allocation, never deleted.
CREATE TABLE sequence_counters (
    organization_id UUID NOT NULL,
    document_kind TEXT NOT NULL,
    fiscal_year INTEGER NOT NULL,
    period_label TEXT NOT NULL DEFAULT '',
    current_value BIGINT NOT NULL DEFAULT 0 CHECK (current_value >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (organization_id, document_kind, fiscal_year, period_label)
);
";

const NUMBER_ASSIGNMENTS_SQL: &str = r"
-- Rows are never deleted; the only update is a revision bump that
-- rewrites revision_number and document_date in place.
CREATE TABLE number_assignments (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL,
    document_kind TEXT NOT NULL,
    document_id UUID NOT NULL,
    revision_number INTEGER NOT NULL DEFAULT 0 CHECK (revision_number >= 0),
    fiscal_year INTEGER NOT NULL,
    period_label TEXT NOT NULL DEFAULT '',
    sequence_value BIGINT NOT NULL CHECK (sequence_value >= 1),
    document_date DATE NOT NULL,
    display_number TEXT NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- Idempotent commits key on the document revision.
    CONSTRAINT uq_assignment_document_revision
        UNIQUE (document_id, revision_number),

    -- Display numbers are unique per organization and kind for all time.
    CONSTRAINT uq_assignment_display_number
        UNIQUE (organization_id, document_kind, display_number),

    -- Each counter value is issued at most once per bucket.
    CONSTRAINT uq_assignment_bucket_sequence
        UNIQUE (organization_id, document_kind, fiscal_year, period_label, sequence_value)
);

-- Conflict analysis scans one bucket ordered by sequence value.
CREATE INDEX idx_assignments_bucket
    ON number_assignments (organization_id, document_kind, fiscal_year, period_label, sequence_value);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS number_assignments;
DROP TABLE IF EXISTS sequence_counters;
DROP TABLE IF EXISTS numbering_configs;
";
