//! Document sequence issuance and backdated-conflict detection.
//!
//! This module implements the numbering engine:
//! - Bucket resolution (fiscal year and period math)
//! - Atomic, gap-free sequence allocation behind the `SequenceStore` seam
//! - Canonical display-number formatting
//! - Append-only assignment ledger for audit and conflict analysis
//! - Backdated-conflict analysis with remediation suggestions
//! - Allocation service orchestrating preview and commit

pub mod bucket;
pub mod conflict;
pub mod error;
pub mod format;
pub mod memory;
pub mod service;
pub mod store;
pub mod types;


pub use bucket::resolve;
pub use conflict::analyze;
pub use error::NumberingError;
pub use format::{display_number, fiscal_year_label};
pub use memory::{MemoryStore, StaticConfigs};
pub use service::AllocationService;
pub use store::{AssignmentLedger, ConfigSource, SequenceStore};
pub use types::{
    AssignmentRecord, BucketKey, CommitRequest, ConflictReport, DisplayRule, DocumentKind,
    NewAssignment, NumberingConfig, PeriodGranularity, Preview, RevisionPolicy,
    DEFAULT_SEQUENCE_PADDING,
};
