use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use crate::extraction::PageContent;
use crate::parsing::values::parse_cleaned;

static TOTAL_DEPOSITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s+Deposits:?\s*[^0-9\n]*?([\d,]+(?:\.\d+)?)").unwrap()
});

static TOTAL_WITHDRAWALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total\s+Withdrawals:?\s*[^0-9\n]*?([\d,]+(?:\.\d+)?)").unwrap()
});

/// Statement-level totals printed in a summary box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTotals {
    pub total_deposits: Decimal,
    pub total_withdrawals: Decimal,
}

/// Sum "Total Deposits" / "Total Withdrawals" across pages.
///
/// A page contributes only when both labels appear on it.
pub fn find_summary_totals(pages: &[PageContent]) -> Option<SummaryTotals> {
    let mut found: Option<SummaryTotals> = None;

    for page in pages {
        let (Some(deposits), Some(withdrawals)) = (
            TOTAL_DEPOSITS.captures(&page.text),
            TOTAL_WITHDRAWALS.captures(&page.text),
        ) else {
            continue;
        };

        let parsed = parse_cleaned(&deposits[1])
            .and_then(|d| parse_cleaned(&withdrawals[1]).map(|w| (d, w)));
        let (deposits, withdrawals) = match parsed {
            Ok((Some(d), Some(w))) => (d, w),
            Ok(_) => continue,
            Err(failure) => {
                debug!(page = page.page_number, %failure, "ignoring summary totals");
                continue;
            }
        };

        let so_far = found.clone().unwrap_or(SummaryTotals {
            total_deposits: Decimal::ZERO,
            total_withdrawals: Decimal::ZERO,
        });
        match (
            so_far.total_deposits.checked_add(deposits),
            so_far.total_withdrawals.checked_add(withdrawals),
        ) {
            (Some(total_deposits), Some(total_withdrawals)) => {
                found = Some(SummaryTotals {
                    total_deposits,
                    total_withdrawals,
                });
            }
            _ => debug!(page = page.page_number, "summary totals overflow, ignoring page"),
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_on_one_page() {
        let pages = vec![PageContent::from_lines(
            1,
            &["Account summary", "Total Deposits: 200,000.00", "Total Withdrawals: 50,000.00"],
        )];
        let totals = find_summary_totals(&pages).unwrap();
        assert_eq!(totals.total_deposits, dec!(200000.00));
        assert_eq!(totals.total_withdrawals, dec!(50000.00));
    }

    #[test]
    fn test_currency_prefix_and_case() {
        let pages = vec![PageContent::from_lines(
            1,
            &["TOTAL DEPOSITS  NGN 1,000", "total withdrawals: ₦250.50"],
        )];
        let totals = find_summary_totals(&pages).unwrap();
        assert_eq!(totals.total_deposits, dec!(1000));
        assert_eq!(totals.total_withdrawals, dec!(250.50));
    }

    #[test]
    fn test_summed_across_pages() {
        let pages = vec![
            PageContent::from_lines(1, &["Total Deposits: 100.00", "Total Withdrawals: 40.00"]),
            PageContent::from_lines(2, &["Total Deposits: 50.00", "Total Withdrawals: 10.00"]),
        ];
        let totals = find_summary_totals(&pages).unwrap();
        assert_eq!(totals.total_deposits, dec!(150.00));
        assert_eq!(totals.total_withdrawals, dec!(50.00));
    }

    #[test]
    fn test_overflowing_page_is_ignored() {
        let huge = "Total Deposits: 50000000000000000000000000000";
        let pages = vec![
            PageContent::from_lines(1, &[huge, "Total Withdrawals: 1.00"]),
            PageContent::from_lines(2, &[huge, "Total Withdrawals: 2.00"]),
            PageContent::from_lines(3, &["Total Deposits: 5.00", "Total Withdrawals: 3.00"]),
        ];
        let totals = find_summary_totals(&pages).unwrap();
        assert_eq!(totals.total_deposits, dec!(50000000000000000000000000005));
        assert_eq!(totals.total_withdrawals, dec!(4.00));
    }

    #[test]
    fn test_labels_split_across_pages_are_ignored() {
        let pages = vec![
            PageContent::from_lines(1, &["Total Deposits: 100.00"]),
            PageContent::from_lines(2, &["Total Withdrawals: 40.00"]),
        ];
        assert_eq!(find_summary_totals(&pages), None);
    }

    #[test]
    fn test_no_labels() {
        let pages = vec![PageContent::new(1, "Closing balance 1,000.00")];
        assert_eq!(find_summary_totals(&pages), None);
    }
}
