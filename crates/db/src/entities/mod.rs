//! `SeaORM` entity definitions.

pub mod number_assignments;
pub mod numbering_configs;
pub mod sequence_counters;
