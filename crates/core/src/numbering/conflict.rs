//! Backdated-conflict analysis.
//!
//! A commit into a bucket always receives the next counter value. If any
//! already-issued document in that bucket is dated after the candidate
//! date, the new number would be chronologically out of order with the
//! existing numbers, which violates the display-order-matches-date-order
//! rule many jurisdictions require. Analysis is read-only and may be run
//! speculatively on every keystroke of a date field.

use chrono::NaiveDate;

use super::types::{AssignmentRecord, BucketKey, ConflictReport};

/// Analyzes whether issuing a number for `candidate_date` into `bucket`
/// would create an ordering anomaly with the records already in the bucket.
///
/// `records` must be the assignments of the candidate bucket. When a
/// conflict exists, `suggested_date` is the latest document date already
/// present; dating the candidate on or after it is safely non-conflicting.
#[must_use]
pub fn analyze(
    candidate_date: NaiveDate,
    bucket: &BucketKey,
    records: &[AssignmentRecord],
) -> ConflictReport {
    let later_count = records
        .iter()
        .filter(|r| r.document_date > candidate_date)
        .count();

    if later_count == 0 {
        return ConflictReport::clear(bucket.period_label.clone());
    }

    let suggested_date = records.iter().map(|r| r.document_date).max();

    ConflictReport {
        has_conflict: true,
        later_count,
        suggested_date,
        period_label: bucket.period_label.clone(),
    }
}
