//! `SeaORM` Entity for the number_assignments table.
//!
//! Rows are inserted exactly once per successful allocation and never
//! deleted; revision bumps rewrite `revision_number` and `document_date`
//! in place.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "number_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub document_kind: String,
    pub document_id: Uuid,
    pub revision_number: i32,
    pub fiscal_year: i32,
    pub period_label: String,
    pub sequence_value: i64,
    pub document_date: Date,
    pub display_number: String,
    pub issued_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
