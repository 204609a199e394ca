use regex::Regex;
use std::sync::LazyLock;

use crate::cascade::{
    direction_from_sign, ParseContext, ParseStrategy, RowOutcome, StrategyKind, StrategyOutput,
};
use crate::extraction::PageContent;
use crate::model::{StatementDate, Transaction};
use crate::parsing::values::parse_signed_amount;

static LONG_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}\s+[A-Za-z]+\s+\d{4}").unwrap());

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{2}\s+[A-Za-z]{3}\s+\d{4})").unwrap());

/// Party name running up to the first explicitly signed number.
static SIGNED_PARTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Transfer (to|from)\s+(.*?)\s+[-+]\d").unwrap());

/// Party name running up to the first two-decimal amount or end of line.
static MONEY_PARTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Transfer (to|from)\s+(.+?)(?:\s+[-+]?[\d,]+\.\d{2}|\s*$)").unwrap()
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d[\d,]*(?:\.\d+)?").unwrap());

static MONEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-+]?[\d,]+\.\d{2}").unwrap());

static CHANNEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:E-Channel|USSD|SMS)\b(?:[ \t]+[A-Za-z][\w-]*)?").unwrap()
});

/// Strategy 4: prose-like lines that mention a transfer.
///
/// Each candidate line tries two shapes, first match wins: a line carrying a
/// transaction date and a value date, then a line led by a single date.
pub struct NarrativeStrategy;

impl ParseStrategy for NarrativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Narrative
    }

    fn parse(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> StrategyOutput {
        let mut out = StrategyOutput::default();

        for page in pages {
            for line in page.lines() {
                if !(line.contains("Transfer to") || line.contains("Transfer from")) {
                    continue;
                }
                let outcome = match parse_dated_pair(line, ctx) {
                    Ok(None) => parse_leading_date(line, ctx),
                    other => other,
                };
                out.record(self.kind(), page.page_number, line, outcome);
            }
        }

        out
    }
}

/// `<date> <value date> ... Transfer to|from <party> <amount> <balance>`
fn parse_dated_pair(line: &str, ctx: &ParseContext<'_>) -> RowOutcome {
    let dates: Vec<&str> = LONG_DATE.find_iter(line).map(|m| m.as_str()).collect();
    let [_, value_date, ..] = dates.as_slice() else {
        return Ok(None);
    };

    let (description, is_from, rest_start) = match SIGNED_PARTY.captures(line) {
        Some(caps) => {
            let party = caps.get(2).map_or("", |m| m.as_str().trim());
            let end = caps.get(2).map_or(0, |m| m.end());
            let is_from = &caps[1] == "from";
            (format!("Transfer {} {}", &caps[1], party), is_from, end)
        }
        None => match line.find("Transfer to") {
            Some(idx) => ("Transfer out".to_string(), false, idx + "Transfer to".len()),
            None => match line.find("Transfer from") {
                Some(idx) => ("Transfer in".to_string(), true, idx + "Transfer from".len()),
                None => return Ok(None),
            },
        },
    };

    let numbers: Vec<&str> = NUMBER.find_iter(&line[rest_start..]).map(|m| m.as_str()).collect();
    let [amount, balance, ..] = numbers.as_slice() else {
        return Ok(None);
    };

    build(line, value_date, description, is_from, amount, Some(*balance), ctx)
}

/// `<date> ... Transfer to|from <party> ... <amount> [<balance>]`
fn parse_leading_date(line: &str, ctx: &ParseContext<'_>) -> RowOutcome {
    let Some(caps) = LEADING_DATE.captures(line) else {
        return Ok(None);
    };
    let Some(date) = caps.get(1) else {
        return Ok(None);
    };

    let money: Vec<&str> = MONEY.find_iter(&line[date.end()..]).map(|m| m.as_str()).collect();
    let Some(amount) = money.first() else {
        return Ok(None);
    };

    let (description, is_from) = match MONEY_PARTY.captures(line) {
        Some(party) => (
            format!("Transfer {} {}", &party[1], party[2].trim()),
            &party[1] == "from",
        ),
        None => return Ok(None),
    };

    build(line, date.as_str(), description, is_from, amount, money.get(1).copied(), ctx)
}

fn build(
    line: &str,
    date: &str,
    description: String,
    is_from: bool,
    amount: &str,
    balance: Option<&str>,
    ctx: &ParseContext<'_>,
) -> RowOutcome {
    let amount = parse_signed_amount(amount)?;
    let balance = balance.map(parse_signed_amount).transpose()?;
    let direction = direction_from_sign(amount.sign, is_from);
    let channel = CHANNEL.find(line).map(|m| m.as_str().trim().to_string());
    let category = ctx.category(&description);

    let date = StatementDate::parse(date);
    Ok(
        Transaction::new(date, description, amount.magnitude, direction, category)
            .map(|t| t.with_balance(balance.map(|b| b.value())).with_channel(channel)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Categorizer;
    use crate::model::Direction;
    use rust_decimal_macros::dec;

    fn run(lines: &[&str]) -> StrategyOutput {
        let ctx = ParseContext {
            categorizer: Categorizer::builtin(),
        };
        NarrativeStrategy.parse(&[PageContent::from_lines(1, lines)], &ctx)
    }

    #[test]
    fn test_two_date_line() {
        let out = run(&[
            "On 12 Mar 2024 (value 13 Mar 2024) E-Channel MOBILE Transfer to JOHN DOE -15,000.00 balance 85,000.00",
        ]);
        assert_eq!(out.transactions.len(), 1);
        let t = &out.transactions[0];
        assert_eq!(t.date.normalized, "2024-03-13");
        assert_eq!(t.description, "Transfer to JOHN DOE");
        assert_eq!(t.direction, Direction::Debit);
        assert_eq!(t.amount, dec!(15000.00));
        assert_eq!(t.balance, Some(dec!(85000.00)));
        assert_eq!(t.channel.as_deref(), Some("E-Channel MOBILE"));
    }

    #[test]
    fn test_unsigned_transfer_from_is_credit() {
        let out = run(&["12 Mar 2024 12 Mar 2024 Transfer from ADA 5000.00 90000.00"]);
        let t = &out.transactions[0];
        assert_eq!(t.description, "Transfer in");
        assert_eq!(t.direction, Direction::Credit);
        assert_eq!(t.amount, dec!(5000.00));
    }

    #[test]
    fn test_single_leading_date_line() {
        let out = run(&["05 Apr 2024 USSD Transfer to MAMA PUT 2,500.00 80,000.00"]);
        assert_eq!(out.transactions.len(), 1);
        let t = &out.transactions[0];
        assert_eq!(t.date.normalized, "2024-04-05");
        assert_eq!(t.description, "Transfer to MAMA PUT");
        assert_eq!(t.direction, Direction::Debit);
        assert_eq!(t.amount, dec!(2500.00));
        assert_eq!(t.balance, Some(dec!(80000.00)));
        assert_eq!(t.channel.as_deref(), Some("USSD Transfer"));
    }

    #[test]
    fn test_lines_without_transfer_are_ignored() {
        let out = run(&["12 Mar 2024 12 Mar 2024 POS SHOPRITE -5,000.00 80,000.00"]);
        assert!(out.transactions.is_empty());
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_transfer_without_amounts_yields_nothing() {
        let out = run(&["Transfer to savings is free for all customers"]);
        assert!(out.transactions.is_empty());
    }
}
