use regex::Regex;
use std::sync::LazyLock;

use crate::model::{StatementHeader, StatementPeriod};
use crate::parsing::dates::normalize_date;

static ACCOUNT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)account\s+(?:number|no\.?)\s*:?\s*([0-9]+)").unwrap());

static PERIOD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*–\s*|\s+(?:-|to)\s+").unwrap());

/// Extract account metadata from the first page's lines.
pub fn parse_header(lines: &[&str]) -> StatementHeader {
    let mut header = StatementHeader::default();

    for line in lines {
        let line = line.trim();

        if header.account_name.is_none() {
            header.account_name = extract_after_label(line, "account name")
                .or_else(|| extract_after_label(line, "account holder"));
        }

        if header.account_number.is_none() {
            if let Some(caps) = ACCOUNT_NUMBER.captures(line) {
                header.account_number = Some(caps[1].to_string());
            }
        }

        if header.period.is_none() {
            if let Some(value) = extract_after_label(line, "statement period") {
                header.period = parse_period(&value);
            }
        }
    }

    header
}

/// Split `"01 Jan 2024 - 31 Jan 2024"` (or `–`, `to`) into a period.
fn parse_period(value: &str) -> Option<StatementPeriod> {
    let mut parts = PERIOD_SEPARATOR.splitn(value, 2);
    let start = parts.next()?.trim();
    let end = parts.next()?.trim();
    if start.is_empty() || end.is_empty() {
        return None;
    }
    Some(StatementPeriod {
        start: normalize_date(start),
        end: normalize_date(end),
    })
}

/// Extract a value appearing after a label (case-insensitive).
/// Handles patterns like "Label: value" or "Label    value".
/// Truncates at the next large whitespace gap (3+ spaces) so trailing fields
/// of a layout-preserving extraction are not captured.
fn extract_after_label(line: &str, label: &str) -> Option<String> {
    let lower = line.to_lowercase();
    let idx = lower.find(label)?;
    // Lowercasing can shift byte offsets for non-ASCII text.
    let after = line.get(idx + label.len()..)?;
    let trimmed = after.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    let value = match trimmed.find("   ") {
        Some(gap_pos) => trimmed[..gap_pos].trim(),
        None => trimmed.trim(),
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_basic() {
        let lines = [
            "ACME BANK PLC",
            "Account Name: ADA OBI           Branch: Lekki",
            "Account Number: 0123456789",
            "Statement Period: 01 Jan 2024 - 31 Jan 2024",
        ];
        let h = parse_header(&lines);
        assert_eq!(h.account_name.as_deref(), Some("ADA OBI"));
        assert_eq!(h.account_number.as_deref(), Some("0123456789"));
        let period = h.period.unwrap();
        assert_eq!(period.start.normalized, "2024-01-01");
        assert_eq!(period.end.normalized, "2024-01-31");
    }

    #[test]
    fn test_account_holder_and_to_separator() {
        let lines = [
            "Account Holder : Jane Smith",
            "Statement Period: 01/03/2024 to 31/03/2024",
        ];
        let h = parse_header(&lines);
        assert_eq!(h.account_name.as_deref(), Some("Jane Smith"));
        let period = h.period.unwrap();
        assert_eq!(period.start.normalized, "2024-03-01");
        assert_eq!(period.end.normalized, "2024-03-31");
    }

    #[test]
    fn test_dash_dates_are_not_split_apart() {
        let h = parse_header(&["Statement Period: 01-03-2024 - 31-03-2024"]);
        let period = h.period.unwrap();
        assert_eq!(period.start.normalized, "2024-03-01");
        assert_eq!(period.end.normalized, "2024-03-31");
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let h = parse_header(&["Opening Balance  1,000.00"]);
        assert_eq!(h, StatementHeader::default());
    }
}
