use regex::Regex;
use std::sync::LazyLock;

use crate::cascade::{
    direction_from_keywords, ParseContext, ParseStrategy, RowOutcome, StrategyKind, StrategyOutput,
};
use crate::extraction::PageContent;
use crate::model::{Direction, StatementDate, Transaction};
use crate::parsing::split_by_whitespace_gaps;
use crate::parsing::values::{looks_like_amount, parse_signed_amount, Sign, SignedAmount};

/// A page needs this many date-led lines before it is read as columns.
const MIN_DATE_LINES: usize = 3;

const CREDIT_KEYWORDS: &[&str] = &["credit", "deposit", "salary"];

static DATE_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}",
        r"^\d{1,2}[-\s][A-Za-z]{3}[-\s]\d{2,4}",
        r"^\d{2}-[A-Za-z]{3}-\d{2}",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// The date a line starts with, if any (`01/02/2024`, `12 Mar 2024`,
/// `31-Dec-23`).
pub fn date_prefix(line: &str) -> Option<&str> {
    let line = line.trim_start();
    DATE_PREFIXES
        .iter()
        .find_map(|regex| regex.find(line))
        .map(|m| m.as_str())
}

/// Strategy 3: whitespace-aligned columns without a recognizable header.
pub struct ColumnHeuristicStrategy;

impl ParseStrategy for ColumnHeuristicStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ColumnHeuristic
    }

    fn parse(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> StrategyOutput {
        let mut out = StrategyOutput::default();

        for page in pages {
            let dated: Vec<&str> = page.lines().filter(|l| date_prefix(l).is_some()).collect();
            if dated.len() < MIN_DATE_LINES {
                continue;
            }
            for line in dated {
                let outcome = parse_line(line, ctx);
                out.record(self.kind(), page.page_number, line, outcome);
            }
        }

        out
    }
}

fn parse_line(line: &str, ctx: &ParseContext<'_>) -> RowOutcome {
    let trimmed = line.trim();
    let Some(date) = date_prefix(trimmed) else {
        return Ok(None);
    };

    // The date may share a cell with the description when only one space
    // separates them.
    let remainder = trimmed[date.len()..].trim();
    let tokens: Vec<&str> = split_by_whitespace_gaps(remainder);

    let Some(first_amount) = tokens.iter().position(|t| looks_like_amount(t)) else {
        return Ok(None);
    };
    let description = tokens[..first_amount].join(" ");
    let numbers = tokens[first_amount..]
        .iter()
        .filter(|t| looks_like_amount(t))
        .map(|t| parse_signed_amount(t))
        .collect::<Result<Vec<SignedAmount>, _>>()?;

    let (amount, direction, consumed) = match numbers.as_slice() {
        [first, second, ..] if first.is_zero() != second.is_zero() => {
            if first.is_zero() {
                (second.magnitude, Direction::Credit, 2)
            } else {
                (first.magnitude, Direction::Debit, 2)
            }
        }
        [first, ..] => {
            let direction = match first.sign {
                Some(Sign::Plus) => Direction::Credit,
                Some(Sign::Minus) => Direction::Debit,
                None => direction_from_keywords(&description, CREDIT_KEYWORDS),
            };
            (first.magnitude, direction, 1)
        }
        [] => return Ok(None),
    };
    let balance = if numbers.len() > consumed {
        numbers.last().map(SignedAmount::value)
    } else {
        None
    };

    let category = ctx.category(&description);
    Ok(
        Transaction::new(StatementDate::parse(date), description, amount, direction, category)
            .map(|t| t.with_balance(balance)),
    )
}
