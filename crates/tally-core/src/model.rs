use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parsing::dates;

/// Whether money came into the account or left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => write!(f, "credit"),
            Direction::Debit => write!(f, "debit"),
        }
    }
}

/// A date as it appeared on the statement plus its ISO form.
///
/// `normalized` is `YYYY-MM-DD` when the raw token had a recognized shape,
/// otherwise it repeats the raw token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementDate {
    pub raw: String,
    pub normalized: String,
}

impl StatementDate {
    pub fn parse(raw: &str) -> Self {
        dates::normalize_date(raw)
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.normalized, "%Y-%m-%d").ok()
    }
}

impl fmt::Display for StatementDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: StatementDate,
    pub description: String,
    /// Always positive; the sign lives in `direction`.
    pub amount: Decimal,
    pub direction: Direction,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Transaction {
    /// Build a transaction, or `None` when `amount` is not positive.
    pub fn new(
        date: StatementDate,
        description: impl Into<String>,
        amount: Decimal,
        direction: Direction,
        category: impl Into<String>,
    ) -> Option<Self> {
        if amount <= Decimal::ZERO {
            return None;
        }
        Some(Transaction {
            date,
            description: description.into(),
            amount,
            direction,
            category: category.into(),
            balance: None,
            channel: None,
            reference: None,
        })
    }

    pub fn with_balance(mut self, balance: Option<Decimal>) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_channel(mut self, channel: Option<String>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Amount with the direction applied: credits positive, debits negative.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: StatementDate,
    pub end: StatementDate,
}

/// Account metadata read from the top of the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementHeader {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub period: Option<StatementPeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub transactions: Vec<Transaction>,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<StatementPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

/// Debit spending for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(raw: &str) -> StatementDate {
        StatementDate::parse(raw)
    }

    #[test]
    fn test_transaction_rejects_zero_and_negative() {
        for amount in [dec!(0), dec!(-5.00)] {
            let t = Transaction::new(date("01/02/2024"), "x", amount, Direction::Debit, "Cash");
            assert!(t.is_none());
        }
    }

    #[test]
    fn test_signed_amount_follows_direction() {
        let day = date("01/02/2024");
        let credit =
            Transaction::new(day.clone(), "salary", dec!(10.50), Direction::Credit, "Income")
                .unwrap();
        let debit = Transaction::new(day, "rent", dec!(4), Direction::Debit, "Housing").unwrap();
        assert_eq!(credit.signed_amount(), dec!(10.50));
        assert_eq!(debit.signed_amount(), dec!(-4));
    }

    #[test]
    fn test_statement_date_as_date() {
        assert_eq!(
            date("31-Dec-23").as_date(),
            NaiveDate::from_ymd_opt(2023, 12, 31)
        );
        assert_eq!(date("sometime").as_date(), None);
    }

    #[test]
    fn test_transaction_serializes_amount_as_string() {
        let day = date("12 Mar 2024");
        let t = Transaction::new(day, "Airtime", dec!(100.00), Direction::Debit, "Telecom")
            .unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["amount"], "100.00");
        assert_eq!(json["direction"], "debit");
        assert_eq!(json["date"]["normalized"], "2024-03-12");
        assert!(json.get("balance").is_none());
    }
}
