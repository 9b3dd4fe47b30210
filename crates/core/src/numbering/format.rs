//! Canonical display-number formatting.
//!
//! Pure and total: every input renders to a string, no I/O, so format
//! strings can be asserted directly in tests.

use super::types::BucketKey;

/// Renders the fiscal-year segment of a display number.
///
/// A fiscal year aligned with the calendar year renders as the four-digit
/// year (`2024`). A fiscal year crossing a calendar boundary renders as a
/// two-year span abbreviation (`2425` for the year beginning 2024 and
/// ending 2025).
#[must_use]
pub fn fiscal_year_label(fiscal_year: i32, fiscal_year_start_month: u32) -> String {
    if fiscal_year_start_month == 1 {
        format!("{fiscal_year}")
    } else {
        let begin = fiscal_year.rem_euclid(100);
        let end = (fiscal_year + 1).rem_euclid(100);
        format!("{begin:02}{end:02}")
    }
}

/// Renders the canonical display number `PREFIX/FY/PERIOD/NNNNN`.
///
/// Empty segments are omitted: no leading `PREFIX/` when the prefix is
/// empty, no `PERIOD` segment for yearly buckets. The sequence value is
/// zero-padded to `padding` digits and never truncated when wider.
#[must_use]
pub fn display_number(
    prefix: &str,
    bucket: &BucketKey,
    sequence_value: u64,
    padding: u32,
    fiscal_year_start_month: u32,
) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(4);
    if !prefix.is_empty() {
        segments.push(prefix.to_string());
    }
    segments.push(fiscal_year_label(bucket.fiscal_year, fiscal_year_start_month));
    if !bucket.period_label.is_empty() {
        segments.push(bucket.period_label.clone());
    }
    let width = padding as usize;
    segments.push(format!("{sequence_value:0width$}"));
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numbering::types::DocumentKind;
    use proptest::prelude::*;
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
    fn test_calendar_year_label_is_four_digits() {
        assert_eq!(fiscal_year_label(2024, 1), "2024");
        assert_eq!(fiscal_year_label(1999, 1), "1999");
    }

    #[test]
    fn test_crossing_year_label_is_span() {
        assert_eq!(fiscal_year_label(2024, 4), "2425");
        assert_eq!(fiscal_year_label(1999, 7), "9900");
        assert_eq!(fiscal_year_label(2009, 10), "0910");
    }

    #[test]
    fn test_full_layout() {
        // First allocation for PMT, April fiscal start, October 2024.
        assert_eq!(
            display_number("PMT", &bucket(2024, "OCT"), 1, 5, 4),
            "PMT/2425/OCT/00001"
        );
    }

    #[test]
    fn test_empty_prefix_omitted() {
        assert_eq!(
            display_number("", &bucket(2024, "OCT"), 42, 5, 4),
            "2425/OCT/00042"
        );
    }

    #[test]
    fn test_empty_period_omitted() {
        assert_eq!(
            display_number("INV", &bucket(2024, ""), 7, 5, 1),
            "INV/2024/00007"
        );
    }

    #[test]
    fn test_wide_values_never_truncated() {
        assert_eq!(
            display_number("INV", &bucket(2024, ""), 1_234_567, 5, 1),
            "INV/2024/1234567"
        );
    }

    #[test]
    fn test_padding_width() {
        assert_eq!(display_number("", &bucket(2024, ""), 3, 8, 1), "2024/00000003");
        assert_eq!(display_number("", &bucket(2024, ""), 3, 1, 1), "2024/3");
    }

    proptest! {
        /// The sequence segment always parses back to the input value.
        #[test]
        fn prop_sequence_segment_round_trips(
            value in 0u64..10_000_000,
            padding in 1u32..=18,
            fiscal_year in 1990i32..2100,
            start_month in 1u32..=12,
        ) {
            let rendered = display_number("INV", &bucket(fiscal_year, "Q1"), value, padding, start_month);
            let last = rendered.rsplit('/').next().unwrap();
            prop_assert!(last.len() >= padding as usize);
            prop_assert_eq!(last.parse::<u64>().unwrap(), value);
        }

        /// Formatting is total: any combination of inputs renders.
        #[test]
        fn prop_format_is_total(
            value in 0u64..u64::MAX,
            padding in 1u32..=18,
            start_month in 1u32..=12,
        ) {
            let rendered = display_number("X", &bucket(2024, "OCT"), value, padding, start_month);
            prop_assert!(!rendered.is_empty());
        }
    }
}
