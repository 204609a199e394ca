//! Turns cascade output into a [`Statement`]: totals by direction, header
//! metadata attached, transactions sorted newest first.

use rust_decimal::Decimal;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::cascade::summary::SummaryTotals;
use crate::cascade::Extraction;
use crate::model::{CategoryTotal, Direction, Statement, StatementHeader, Transaction};

pub fn aggregate(extraction: Extraction, header: StatementHeader) -> Statement {
    match extraction {
        Extraction::Itemized { transactions, .. } => from_transactions(transactions, header),
        Extraction::SummaryOnly(totals) => from_summary(&totals, header),
        Extraction::Nothing => empty(header),
    }
}

/// A transaction amount that would push its direction's total past
/// `Decimal::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("amount {amount} overflows the {direction} total")]
pub struct TotalOverflow {
    pub amount: Decimal,
    pub direction: Direction,
}

/// Income and expense accumulated one transaction at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunningTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl RunningTotals {
    /// Leaves the totals untouched when the amount does not fit.
    pub fn add(&mut self, transaction: &Transaction) -> Result<(), TotalOverflow> {
        let total = match transaction.direction {
            Direction::Credit => &mut self.income,
            Direction::Debit => &mut self.expense,
        };
        *total = total.checked_add(transaction.amount).ok_or(TotalOverflow {
            amount: transaction.amount,
            direction: transaction.direction,
        })?;
        Ok(())
    }
}

/// Sum credits and debits and sort by date, newest first.
///
/// The sort is stable, so same-day transactions keep extraction order.
/// Transactions whose date could not be normalized sort last. A transaction
/// that would overflow its total is dropped.
pub fn from_transactions(mut transactions: Vec<Transaction>, header: StatementHeader) -> Statement {
    let mut totals = RunningTotals::default();
    transactions.retain(|t| match totals.add(t) {
        Ok(()) => true,
        Err(overflow) => {
            warn!(description = %t.description, %overflow, "dropping transaction");
            false
        }
    });

    transactions.sort_by_cached_key(|t| Reverse(t.date.as_date()));

    build(transactions, totals.income, totals.expense, header)
}

/// Totals taken verbatim from a statement summary box.
pub fn from_summary(totals: &SummaryTotals, header: StatementHeader) -> Statement {
    build(
        Vec::new(),
        totals.total_deposits,
        totals.total_withdrawals,
        header,
    )
}

pub fn empty(header: StatementHeader) -> Statement {
    build(Vec::new(), Decimal::ZERO, Decimal::ZERO, header)
}

fn build(
    transactions: Vec<Transaction>,
    total_income: Decimal,
    total_expense: Decimal,
    header: StatementHeader,
) -> Statement {
    Statement {
        transactions,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        period: header.period,
        account_name: header.account_name,
        account_number: header.account_number,
    }
}

impl Statement {
    /// Debit totals per category, largest first.
    pub fn category_breakdown(&self) -> Vec<CategoryTotal> {
        let mut by_category: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
        for t in self.transactions.iter().filter(|t| t.direction == Direction::Debit) {
            let entry = by_category.entry(t.category.as_str()).or_default();
            entry.0 = entry.0.saturating_add(t.amount);
            entry.1 += 1;
        }

        let mut totals: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, (amount, count))| CategoryTotal {
                category: category.to_string(),
                amount,
                count,
            })
            .collect();
        totals.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
        totals
    }

    /// A copy with personal identifiers stripped, safe to hand to an
    /// external insight generator.
    pub fn sanitized(&self) -> Statement {
        let mut copy = self.clone();
        copy.account_name = None;
        copy.account_number = self.account_number.as_deref().map(mask_account_number);
        for t in &mut copy.transactions {
            t.reference = None;
        }
        copy
    }
}

/// `0123456789` becomes `******6789`.
fn mask_account_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let visible = chars.len().saturating_sub(4);
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}
