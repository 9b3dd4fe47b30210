//! Core numbering logic for Sequora.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, bucket resolution, formatting, conflict analysis, and the
//! allocation orchestration live here.
//!
//! # Modules
//!
//! - `numbering` - Document sequence issuance and backdated-conflict detection

pub mod numbering;
