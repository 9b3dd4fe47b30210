//! Bucket resolution: mapping a document date to its counter bucket.
//!
//! Resolution is a pure function of the document date and the numbering
//! configuration. The same date must resolve to the same bucket no matter
//! when the resolution runs; nothing here may read the clock.

use chrono::{Datelike, NaiveDate};

use super::error::NumberingError;
use super::types::{BucketKey, NumberingConfig, PeriodGranularity};

/// Three-letter month labels used in bucket keys and display numbers.
const MONTH_LABELS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Resolves the bucket a document dated `document_date` belongs to.
///
/// The fiscal year is the calendar year containing the most recent fiscal
/// year start on or before the date. Quarters are counted from the fiscal
/// year start month, so Q1 begins at `fiscal_year_start_month`, not
/// necessarily January.
///
/// # Errors
///
/// Returns `NumberingError::InvalidFiscalYearStartMonth` when the
/// configuration carries a start month outside 1..=12.
pub fn resolve(
    document_date: NaiveDate,
    config: &NumberingConfig,
) -> Result<BucketKey, NumberingError> {
    let start_month = config.fiscal_year_start_month;
    if !(1..=12).contains(&start_month) {
        return Err(NumberingError::InvalidFiscalYearStartMonth(start_month));
    }

    Ok(BucketKey {
        organization_id: config.organization_id,
        document_kind: config.document_kind,
        fiscal_year: fiscal_year_of(document_date, start_month),
        period_label: period_label(document_date, config.period_granularity, start_month),
    })
}

/// Returns the calendar year in which the fiscal year containing `date` begins.
#[must_use]
pub fn fiscal_year_of(date: NaiveDate, fiscal_year_start_month: u32) -> i32 {
    if date.month() >= fiscal_year_start_month {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Returns the period label for a date under the given granularity.
fn period_label(date: NaiveDate, granularity: PeriodGranularity, start_month: u32) -> String {
    match granularity {
        PeriodGranularity::None | PeriodGranularity::Year => String::new(),
        PeriodGranularity::Month => {
            MONTH_LABELS[(date.month() - 1) as usize].to_string()
        }
        PeriodGranularity::Quarter => {
            let months_into_year = (date.month() + 12 - start_month) % 12;
            format!("Q{}", months_into_year / 3 + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::{DocumentKind, RevisionPolicy};
    use proptest::prelude::*;
    use rstest::rstest;
    use sequora_shared::types::OrganizationId;

    fn config(granularity: PeriodGranularity, start_month: u32) -> NumberingConfig {
        NumberingConfig {
            organization_id: OrganizationId::new(),
            document_kind: DocumentKind::Invoice,
            prefix: "INV".to_string(),
            period_granularity: granularity,
            fiscal_year_start_month: start_month,
            sequence_padding: 5,
            revision_policy: RevisionPolicy::ReuseSequence,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_fiscal_year_equals_calendar_year() {
        assert_eq!(fiscal_year_of(date(2024, 1, 1), 1), 2024);
        assert_eq!(fiscal_year_of(date(2024, 12, 31), 1), 2024);
    }

    #[test]
    fn test_fiscal_boundary_april_start() {
        // March 31 belongs to the fiscal year that began the previous April.
        assert_eq!(fiscal_year_of(date(2025, 3, 31), 4), 2024);
        assert_eq!(fiscal_year_of(date(2025, 4, 1), 4), 2025);
    }

    #[rstest]
    #[case(date(2024, 4, 1), "Q1")]
    #[case(date(2024, 6, 30), "Q1")]
    #[case(date(2024, 7, 1), "Q2")]
    #[case(date(2024, 12, 31), "Q3")]
    #[case(date(2025, 1, 15), "Q4")]
    #[case(date(2025, 3, 31), "Q4")]
    fn test_quarters_relative_to_april_start(#[case] d: NaiveDate, #[case] expected: &str) {
        let bucket = resolve(d, &config(PeriodGranularity::Quarter, 4)).unwrap();
        assert_eq!(bucket.period_label, expected);
    }

    #[rstest]
    #[case(date(2024, 1, 15), "Q1")]
    #[case(date(2024, 4, 15), "Q2")]
    #[case(date(2024, 10, 1), "Q4")]
    fn test_quarters_calendar_start(#[case] d: NaiveDate, #[case] expected: &str) {
        let bucket = resolve(d, &config(PeriodGranularity::Quarter, 1)).unwrap();
        assert_eq!(bucket.period_label, expected);
    }

    #[test]
    fn test_month_labels_are_calendar_months() {
        let bucket = resolve(date(2024, 10, 24), &config(PeriodGranularity::Month, 4)).unwrap();
        assert_eq!(bucket.period_label, "OCT");
        assert_eq!(bucket.fiscal_year, 2024);

        let bucket = resolve(date(2025, 2, 1), &config(PeriodGranularity::Month, 4)).unwrap();
        assert_eq!(bucket.period_label, "FEB");
        assert_eq!(bucket.fiscal_year, 2024);
    }

    #[test]
    fn test_none_and_year_have_empty_label() {
        let none = resolve(date(2024, 7, 1), &config(PeriodGranularity::None, 1)).unwrap();
        let year = resolve(date(2024, 7, 1), &config(PeriodGranularity::Year, 1)).unwrap();
        assert_eq!(none.period_label, "");
        assert_eq!(year.period_label, "");
    }

    #[test]
    fn test_invalid_start_month_is_configuration_error() {
        let err = resolve(date(2024, 1, 1), &config(PeriodGranularity::Month, 0)).unwrap_err();
        assert!(err.is_configuration_invalid());
        let err = resolve(date(2024, 1, 1), &config(PeriodGranularity::Month, 13)).unwrap_err();
        assert!(err.is_configuration_invalid());
    }

    proptest! {
        /// Resolution is deterministic: identical inputs always yield
        /// identical buckets.
        #[test]
        fn prop_resolve_deterministic(
            days in 0i64..36500,
            start_month in 1u32..=12,
            granularity_idx in 0usize..4,
        ) {
            let granularity = [
                PeriodGranularity::None,
                PeriodGranularity::Month,
                PeriodGranularity::Quarter,
                PeriodGranularity::Year,
            ][granularity_idx];
            let d = date(1970, 1, 1) + chrono::Duration::days(days);
            let cfg = config(granularity, start_month);
            prop_assert_eq!(resolve(d, &cfg).unwrap(), resolve(d, &cfg).unwrap());
        }

        /// Every date within one fiscal year maps to that year's bucket year.
        #[test]
        fn prop_fiscal_year_spans_twelve_months(
            year in 1990i32..2100,
            start_month in 1u32..=12,
            offset in 0u32..12,
        ) {
            let month = (start_month - 1 + offset) % 12 + 1;
            let y = if month >= start_month { year } else { year + 1 };
            let d = date(y, month, 1);
            prop_assert_eq!(fiscal_year_of(d, start_month), year);
        }

        /// Quarter labels are always Q1..Q4 and month labels match the
        /// calendar month regardless of fiscal start.
        #[test]
        fn prop_labels_well_formed(
            days in 0i64..36500,
            start_month in 1u32..=12,
        ) {
            let d = date(1970, 1, 1) + chrono::Duration::days(days);
            let q = resolve(d, &config(PeriodGranularity::Quarter, start_month)).unwrap();
            prop_assert!(["Q1", "Q2", "Q3", "Q4"].contains(&q.period_label.as_str()));

            let m = resolve(d, &config(PeriodGranularity::Month, start_month)).unwrap();
            prop_assert_eq!(m.period_label.as_str(), MONTH_LABELS[(d.month() - 1) as usize]);
        }
    }
}
