//! Error types for number issuance and conflict analysis.

use sequora_shared::error::AppError;
use sequora_shared::types::{DocumentId, OrganizationId};
use thiserror::Error;

use super::types::{BucketKey, DocumentKind};

/// Errors that can occur during numbering operations.
#[derive(Debug, Error)]
pub enum NumberingError {
    // ========== Configuration Errors ==========
    /// No numbering configuration exists for the organization and kind.
    #[error("No numbering configuration for organization {organization_id}, kind {document_kind}")]
    ConfigNotFound {
        /// Organization the lookup was scoped to.
        organization_id: OrganizationId,
        /// Document kind the lookup was scoped to.
        document_kind: DocumentKind,
    },

    /// Fiscal year start month must be in 1..=12.
    #[error("Invalid fiscal year start month: {0} (must be 1-12)")]
    InvalidFiscalYearStartMonth(u32),

    /// Sequence padding must be in 1..=18.
    #[error("Invalid sequence padding: {0} (must be 1-18)")]
    InvalidSequencePadding(u32),

    // ========== Store Errors ==========
    /// Counter store contention or outage; safe to retry.
    #[error("Allocation unavailable: {0}")]
    AllocationUnavailable(String),

    /// Assignment ledger could not be queried; preview is degraded.
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    // ========== Caller Errors ==========
    /// The same document and revision was committed under two different
    /// buckets (the caller changed the date between attempts).
    #[error(
        "Duplicate commit for document {document_id}: already issued in bucket {committed}, requested bucket {requested}"
    )]
    DuplicateCommit {
        /// The document that was committed twice.
        document_id: DocumentId,
        /// Bucket the number was originally issued in.
        committed: BucketKey,
        /// Bucket the retried commit resolved to.
        requested: BucketKey,
    },

    /// A re-issuance referenced a document that was never issued.
    #[error("No prior issuance found for document {document_id} revision {revision_number}")]
    RevisionBaseMissing {
        /// The document the revision refers to.
        document_id: DocumentId,
        /// The revision that was requested.
        revision_number: u32,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NumberingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::InvalidFiscalYearStartMonth(_) | Self::InvalidSequencePadding(_) => {
                "CONFIGURATION_INVALID"
            }
            Self::AllocationUnavailable(_) => "ALLOCATION_UNAVAILABLE",
            Self::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            Self::DuplicateCommit { .. } => "DUPLICATE_COMMIT",
            Self::RevisionBaseMissing { .. } => "REVISION_BASE_MISSING",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - configuration must be fixed first
            Self::InvalidFiscalYearStartMonth(_) | Self::InvalidSequencePadding(_) => 400,

            // 404 Not Found
            Self::ConfigNotFound { .. } | Self::RevisionBaseMissing { .. } => 404,

            // 409 Conflict - caller must reconcile
            Self::DuplicateCommit { .. } => 409,

            // 503 Service Unavailable - transient
            Self::AllocationUnavailable(_) | Self::LedgerUnavailable(_) => 503,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is transient and the operation may be
    /// retried as-is. Only idempotent store operations qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllocationUnavailable(_) | Self::LedgerUnavailable(_)
        )
    }

    /// Returns true if the caller must fix configuration before retrying.
    #[must_use]
    pub fn is_configuration_invalid(&self) -> bool {
        matches!(
            self,
            Self::InvalidFiscalYearStartMonth(_) | Self::InvalidSequencePadding(_)
        )
    }
}

impl From<NumberingError> for AppError {
    fn from(err: NumberingError) -> Self {
        match &err {
            NumberingError::ConfigNotFound { .. } | NumberingError::RevisionBaseMissing { .. } => {
                Self::NotFound(err.to_string())
            }
            NumberingError::InvalidFiscalYearStartMonth(_)
            | NumberingError::InvalidSequencePadding(_) => Self::Validation(err.to_string()),
            NumberingError::AllocationUnavailable(_) | NumberingError::LedgerUnavailable(_) => {
                Self::Unavailable(err.to_string())
            }
            NumberingError::DuplicateCommit { .. } => Self::Conflict(err.to_string()),
            NumberingError::Database(_) => Self::Database(err.to_string()),
            NumberingError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::DocumentKind;
    use sequora_shared::types::OrganizationId;

    fn bucket(fiscal_year: i32, period_label: &str) -> BucketKey {
        BucketKey {
            organization_id: OrganizationId::new(),
            document_kind: DocumentKind::Invoice,
            fiscal_year,
            period_label: period_label.to_string(),
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            NumberingError::InvalidFiscalYearStartMonth(0).error_code(),
            "CONFIGURATION_INVALID"
        );
        assert_eq!(
            NumberingError::InvalidSequencePadding(0).error_code(),
            "CONFIGURATION_INVALID"
        );
        assert_eq!(
            NumberingError::AllocationUnavailable(String::new()).error_code(),
            "ALLOCATION_UNAVAILABLE"
        );
        assert_eq!(
            NumberingError::LedgerUnavailable(String::new()).error_code(),
            "LEDGER_UNAVAILABLE"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            NumberingError::InvalidFiscalYearStartMonth(13).http_status_code(),
            400
        );
        assert_eq!(
            NumberingError::DuplicateCommit {
                document_id: DocumentId::new(),
                committed: bucket(2024, "OCT"),
                requested: bucket(2024, "NOV"),
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            NumberingError::AllocationUnavailable(String::new()).http_status_code(),
            503
        );
        assert_eq!(
            NumberingError::Database(String::new()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(NumberingError::AllocationUnavailable(String::new()).is_retryable());
        assert!(NumberingError::LedgerUnavailable(String::new()).is_retryable());
        assert!(!NumberingError::InvalidFiscalYearStartMonth(13).is_retryable());
        assert!(!NumberingError::DuplicateCommit {
            document_id: DocumentId::new(),
            committed: bucket(2024, "OCT"),
            requested: bucket(2025, "APR"),
        }
        .is_retryable());
    }

    #[test]
    fn test_configuration_invalid() {
        assert!(NumberingError::InvalidFiscalYearStartMonth(13).is_configuration_invalid());
        assert!(NumberingError::InvalidSequencePadding(0).is_configuration_invalid());
        assert!(!NumberingError::AllocationUnavailable(String::new()).is_configuration_invalid());
    }

    #[test]
    fn test_app_error_conversion() {
        let app: AppError = NumberingError::AllocationUnavailable("down".into()).into();
        assert_eq!(app.status_code(), 503);
        assert!(app.is_retryable());

        let app: AppError = NumberingError::DuplicateCommit {
            document_id: DocumentId::new(),
            committed: bucket(2024, "OCT"),
            requested: bucket(2024, "NOV"),
        }
        .into();
        assert_eq!(app.status_code(), 409);
    }
}
