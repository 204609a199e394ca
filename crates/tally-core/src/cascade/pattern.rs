use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::cascade::{
    direction_from_sign, ParseContext, ParseStrategy, RowOutcome, StrategyKind, StrategyOutput,
};
use crate::extraction::PageContent;
use crate::model::{StatementDate, Transaction};
use crate::parsing::values::parse_signed_amount;

const DATE: &str = r"\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4}";
const SIGNED_AMOUNT: &str = r"[-+]?[0-9][0-9,.]*";
const BALANCE: &str = r"[0-9][0-9,.]*";

/// Line idioms with a fixed shape, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternRule {
    /// `<date> <value date> Transfer to|from <party> <amount> <balance>`
    Transfer,
    /// `<date> <value date> Airtime <amount> <balance>`
    Airtime,
    /// `<date> <value date> USSD Charge <amount> <balance>`
    UssdCharge,
}

static PATTERN_RULES: LazyLock<Vec<(PatternRule, Regex)>> = LazyLock::new(|| {
    let rule = |middle: &str| {
        Regex::new(&format!(
            r"(?i)({DATE})\s+({DATE})\s+{middle}\s+({SIGNED_AMOUNT})\s+({BALANCE})"
        ))
        .unwrap()
    };
    vec![
        (PatternRule::Transfer, rule(r"Transfer\s+(?P<dir>to|from)\s+(?P<party>.*?)")),
        (PatternRule::Airtime, rule("Airtime")),
        (PatternRule::UssdCharge, rule(r"USSD\s+Charge")),
    ]
});

impl PatternRule {
    fn description(&self, caps: &Captures<'_>) -> String {
        match self {
            PatternRule::Transfer => {
                let dir = caps.name("dir").map_or("to", |m| m.as_str());
                let party = caps.name("party").map_or("", |m| m.as_str().trim());
                format!("Transfer {dir} {party}")
            }
            PatternRule::Airtime => "Airtime".to_string(),
            PatternRule::UssdCharge => "USSD Charge".to_string(),
        }
    }
}

struct Candidate {
    start: usize,
    end: usize,
    outcome: RowOutcome,
}

/// Strategy 2: recognizable single-line idioms matched over whole pages.
pub struct PatternStrategy;

impl ParseStrategy for PatternStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pattern
    }

    fn parse(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> StrategyOutput {
        let mut out = StrategyOutput::default();

        for page in pages {
            let mut candidates: Vec<Candidate> = Vec::new();

            for (rule, regex) in PATTERN_RULES.iter() {
                for caps in regex.captures_iter(&page.text) {
                    let Some(m) = caps.get(0) else { continue };
                    let overlaps = candidates
                        .iter()
                        .any(|c| c.start < m.end() && m.start() < c.end);
                    if overlaps {
                        continue;
                    }
                    candidates.push(Candidate {
                        start: m.start(),
                        end: m.end(),
                        outcome: build_transaction(*rule, &caps, ctx),
                    });
                }
            }

            candidates.sort_by_key(|c| c.start);
            for candidate in candidates {
                let text = &page.text[candidate.start..candidate.end];
                out.record(self.kind(), page.page_number, text, candidate.outcome);
            }
        }

        out
    }
}

fn build_transaction(rule: PatternRule, caps: &Captures<'_>, ctx: &ParseContext<'_>) -> RowOutcome {
    let description = rule.description(caps);
    let value_date = StatementDate::parse(&caps[2]);
    let amount = parse_signed_amount(&caps[caps.len() - 2])?;
    let balance = parse_signed_amount(&caps[caps.len() - 1])?;

    let is_from = description.to_lowercase().contains("from");
    let direction = direction_from_sign(amount.sign, is_from);
    let category = ctx.category(&description);

    Ok(
        Transaction::new(value_date, description, amount.magnitude, direction, category)
            .map(|t| t.with_balance(Some(balance.value()))),
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
        PatternStrategy.parse(&[PageContent::from_lines(1, lines)], &ctx)
    }

    #[test]
    fn test_transfer_to_is_debit() {
        let out = run(&["12 Mar 2024  12 Mar 2024  Transfer to JOHN DOE  -15000.00  85000.00"]);
        assert_eq!(out.transactions.len(), 1);
        let t = &out.transactions[0];
        assert_eq!(t.description, "Transfer to JOHN DOE");
        assert_eq!(t.direction, Direction::Debit);
        assert_eq!(t.amount, dec!(15000.00));
        assert_eq!(t.balance, Some(dec!(85000.00)));
        assert_eq!(t.category, "Transfers");
    }

    #[test]
    fn test_value_date_is_used() {
        let out = run(&["11 Mar 2024 12 Mar 2024 Airtime -100.00 84,900.00"]);
        assert_eq!(out.transactions[0].date.normalized, "2024-03-12");
        assert_eq!(out.transactions[0].date.raw, "12 Mar 2024");
        assert_eq!(out.transactions[0].balance, Some(dec!(84900.00)));
    }

    #[test]
    fn test_unsigned_transfer_from_is_credit() {
        let out = run(&["01 Apr 2024 01 Apr 2024 Transfer from ADA OBI 20,000.00 104,900.00"]);
        let t = &out.transactions[0];
        assert_eq!(t.direction, Direction::Credit);
        assert_eq!(t.description, "Transfer from ADA OBI");
        assert_eq!(t.amount, dec!(20000.00));
    }

    #[test]
    fn test_explicit_sign_beats_keyword() {
        let out = run(&["01 Apr 2024 01 Apr 2024 Transfer from ADA OBI -20.00 104,880.00"]);
        assert_eq!(out.transactions[0].direction, Direction::Debit);
    }

    #[test]
    fn test_results_in_document_order() {
        let out = run(&[
            "12 Mar 2024 12 Mar 2024 USSD Charge -6.98 84,893.02",
            "13 Mar 2024 13 Mar 2024 Transfer to JOHN DOE -1,000.00 83,893.02",
            "14 Mar 2024 14 Mar 2024 Airtime -100.00 83,793.02",
        ]);
        let descriptions: Vec<&str> =
            out.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, vec!["USSD Charge", "Transfer to JOHN DOE", "Airtime"]);
        assert_eq!(out.transactions[0].category, "Telecom");
    }

    #[test]
    fn test_zero_amount_is_not_a_transaction() {
        let out = run(&["12 Mar 2024 12 Mar 2024 Airtime 0.00 84,900.00"]);
        assert!(out.transactions.is_empty());
    }

    #[test]
    fn test_malformed_amount_is_skipped_and_recorded() {
        let out = run(&["12 Mar 2024 12 Mar 2024 Airtime -1.0.0 84,900.00"]);
        assert!(out.transactions.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].strategy, StrategyKind::Pattern);
    }

    #[test]
    fn test_unrelated_text_yields_nothing() {
        let out = run(&["01/02/2024  SALARY PAYMENT   +500000.00   1500000.00"]);
        assert!(out.transactions.is_empty());
    }
}
