//! Domain types for document number issuance.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sequora_shared::types::{AssignmentId, DocumentId, OrganizationId};

use super::error::NumberingError;
use super::format;

/// Default zero-padded width of the sequence segment.
pub const DEFAULT_SEQUENCE_PADDING: u32 = 5;

fn default_sequence_padding() -> u32 {
    DEFAULT_SEQUENCE_PADDING
}

/// Kinds of commercial documents that receive sequential numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Sales invoice.
    Invoice,
    /// Credit note issued against an invoice.
    CreditNote,
    /// Debit note issued against an invoice.
    DebitNote,
    /// Payment receipt.
    Receipt,
    /// Quotation / pro-forma document.
    Quote,
}

impl DocumentKind {
    /// Returns the stable string form used in storage and bucket keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::CreditNote => "credit_note",
            Self::DebitNote => "debit_note",
            Self::Receipt => "receipt",
            Self::Quote => "quote",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = NumberingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::Invoice),
            "credit_note" => Ok(Self::CreditNote),
            "debit_note" => Ok(Self::DebitNote),
            "receipt" => Ok(Self::Receipt),
            "quote" => Ok(Self::Quote),
            other => Err(NumberingError::Internal(format!(
                "unknown document kind: {other}"
            ))),
        }
    }
}

/// How often a counter bucket rolls over within a fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    /// One bucket per fiscal year, no period segment.
    None,
    /// One bucket per calendar month.
    Month,
    /// One bucket per fiscal quarter (Q1 starts at the fiscal year start month).
    Quarter,
    /// One bucket per fiscal year. Resolves identically to `None` (the
    /// fiscal year is already part of every bucket key); kept distinct so
    /// configurations record the intent explicitly.
    Year,
}

/// What a re-issuance of an existing document does to the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionPolicy {
    /// Amendments keep the original sequence value and display number.
    ReuseSequence,
    /// Each revision is numbered as a brand-new document.
    NewSequence,
}

/// Numbering configuration for one organization and document kind.
///
/// Immutable per effective date: a change only affects buckets resolved after
/// the change, never already-issued numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingConfig {
    /// Organization this configuration belongs to.
    pub organization_id: OrganizationId,
    /// Document kind this configuration applies to.
    pub document_kind: DocumentKind,
    /// Display prefix (may be empty).
    pub prefix: String,
    /// How often the counter bucket rolls over.
    pub period_granularity: PeriodGranularity,
    /// First month of the fiscal year (1 = January).
    pub fiscal_year_start_month: u32,
    /// Zero-padded width of the sequence segment.
    #[serde(default = "default_sequence_padding")]
    pub sequence_padding: u32,
    /// Behavior of re-issuance under the same logical document.
    pub revision_policy: RevisionPolicy,
}

impl NumberingConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::InvalidFiscalYearStartMonth` or
    /// `NumberingError::InvalidSequencePadding` when out of range.
    pub fn validate(&self) -> Result<(), NumberingError> {
        if !(1..=12).contains(&self.fiscal_year_start_month) {
            return Err(NumberingError::InvalidFiscalYearStartMonth(
                self.fiscal_year_start_month,
            ));
        }
        if !(1..=18).contains(&self.sequence_padding) {
            return Err(NumberingError::InvalidSequencePadding(
                self.sequence_padding,
            ));
        }
        Ok(())
    }

    /// Returns the display rule derived from this configuration.
    #[must_use]
    pub fn display_rule(&self) -> DisplayRule {
        DisplayRule {
            prefix: self.prefix.clone(),
            fiscal_year_start_month: self.fiscal_year_start_month,
            sequence_padding: self.sequence_padding,
        }
    }
}

/// The scope within which one counter issues numbers.
///
/// Two documents with the same `BucketKey` share one counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Document kind.
    pub document_kind: DocumentKind,
    /// The calendar year in which the fiscal year begins.
    pub fiscal_year: i32,
    /// Period label: empty for yearly buckets, `"Q1".."Q4"` for quarters,
    /// a three-letter month abbreviation for months.
    pub period_label: String,
}

impl std::fmt::Display for BucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document_kind, self.fiscal_year)?;
        if !self.period_label.is_empty() {
            write!(f, ":{}", self.period_label)?;
        }
        Ok(())
    }
}

/// Pure formatting inputs carried alongside an allocation request so store
/// implementations can render the display number inside their atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRule {
    /// Display prefix (may be empty).
    pub prefix: String,
    /// First month of the fiscal year, for the fiscal-year label form.
    pub fiscal_year_start_month: u32,
    /// Zero-padded width of the sequence segment.
    pub sequence_padding: u32,
}

impl DisplayRule {
    /// Renders the canonical display number for a sequence value in a bucket.
    #[must_use]
    pub fn render(&self, bucket: &BucketKey, sequence_value: u64) -> String {
        format::display_number(
            &self.prefix,
            bucket,
            sequence_value,
            self.sequence_padding,
            self.fiscal_year_start_month,
        )
    }
}

/// Request to allocate the next sequence value for a document.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    /// Target bucket.
    pub bucket: BucketKey,
    /// Caller-owned document reference.
    pub document_id: DocumentId,
    /// Revision of the logical document (0 for the original issuance).
    pub revision_number: u32,
    /// Date written on the document.
    pub document_date: NaiveDate,
    /// How to render the display number for the allocated value.
    pub display: DisplayRule,
}

/// One issued number: the append-only audit record of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// Unique identifier of this record.
    pub id: AssignmentId,
    /// Caller-owned document reference.
    pub document_id: DocumentId,
    /// Revision of the logical document (0 for the original issuance).
    pub revision_number: u32,
    /// Bucket the number was issued in.
    pub bucket: BucketKey,
    /// The allocated counter value within the bucket.
    pub sequence_value: u64,
    /// Date written on the document.
    pub document_date: NaiveDate,
    /// Formatted, human-readable number.
    pub display_number: String,
    /// Wall-clock time of allocation.
    pub issued_at: DateTime<Utc>,
}

/// Outcome of a backdated-conflict analysis for a candidate date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// True when committing now would issue a number out of date order.
    pub has_conflict: bool,
    /// Number of already-issued documents dated after the candidate date.
    pub later_count: usize,
    /// Earliest date the caller could use without creating a conflict.
    /// `None` when there is no conflict.
    pub suggested_date: Option<NaiveDate>,
    /// Period label of the bucket, for user display.
    pub period_label: String,
}

impl ConflictReport {
    /// A report stating that no conflict exists.
    #[must_use]
    pub fn clear(period_label: String) -> Self {
        Self {
            has_conflict: false,
            later_count: 0,
            suggested_date: None,
            period_label,
        }
    }
}

/// Result of a non-mutating preview: the number that would be issued next,
/// plus the conflict analysis for the candidate date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    /// The display number the next commit into this bucket would receive.
    pub next_number: String,
    /// Backdated-conflict analysis for the candidate date.
    pub conflict: ConflictReport,
}

/// Input to a commit allocation.
#[derive(Debug, Clone)]
pub struct CommitRequest {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Document kind.
    pub document_kind: DocumentKind,
    /// Date written on the document.
    pub document_date: NaiveDate,
    /// Caller-owned document reference.
    pub document_id: DocumentId,
    /// Revision of the logical document (0 for the original issuance).
    pub revision_number: u32,
}
