//! Ordered parsing strategies, tried until one yields transactions.
//!
//! The order is a contract: table layout, known line patterns, column
//! heuristic, narrative lines. When none of them produce a transaction the
//! summary totals are consulted, and failing that the result is empty.

pub mod columns;
pub mod narrative;
pub mod pattern;
pub mod summary;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::aggregate::RunningTotals;
use crate::categorize::Categorizer;
use crate::extraction::PageContent;
use crate::model::{Direction, Transaction};
use crate::parsing::values::{NumericParseFailure, Sign};
use crate::trace::{ExtractionTrace, SkippedLine, StrategyAttempt};
use summary::SummaryTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Table,
    Pattern,
    ColumnHeuristic,
    Narrative,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Table => write!(f, "table"),
            StrategyKind::Pattern => write!(f, "pattern"),
            StrategyKind::ColumnHeuristic => write!(f, "column_heuristic"),
            StrategyKind::Narrative => write!(f, "narrative"),
        }
    }
}

/// Shared inputs for every strategy.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub categorizer: &'a Categorizer,
}

impl ParseContext<'_> {
    pub fn category(&self, description: &str) -> String {
        self.categorizer.categorize(description).to_string()
    }
}

/// What one strategy recovered from the whole page set.
#[derive(Debug, Clone, Default)]
pub struct StrategyOutput {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<SkippedLine>,
    totals: RunningTotals,
}

impl StrategyOutput {
    /// Record the result of parsing one candidate row.
    ///
    /// A row whose amount would overflow the running income or expense total
    /// is skipped like a malformed number.
    pub(crate) fn record(
        &mut self,
        strategy: StrategyKind,
        page_number: usize,
        line: &str,
        outcome: RowOutcome,
    ) {
        match outcome {
            Ok(Some(transaction)) => match self.totals.add(&transaction) {
                Ok(()) => self.transactions.push(transaction),
                Err(overflow) => self.skip(strategy, page_number, line, overflow),
            },
            Ok(None) => {}
            Err(failure) => self.skip(strategy, page_number, line, failure),
        }
    }

    fn skip(
        &mut self,
        strategy: StrategyKind,
        page_number: usize,
        line: &str,
        reason: impl fmt::Display,
    ) {
        debug!(%strategy, page = page_number, line = line.trim(), %reason, "skipping row");
        self.skipped.push(SkippedLine::new(page_number, strategy, line, reason));
    }
}

/// `Ok(None)` means the row is not a transaction (zero amount, no match).
pub(crate) type RowOutcome = Result<Option<Transaction>, NumericParseFailure>;

pub trait ParseStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn parse(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> StrategyOutput;
}

/// What the cascade recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Itemized {
        strategy: StrategyKind,
        transactions: Vec<Transaction>,
    },
    SummaryOnly(SummaryTotals),
    Nothing,
}

#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub extraction: Extraction,
    pub trace: ExtractionTrace,
}

pub struct Cascade {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl Cascade {
    /// Table, pattern, column heuristic, narrative.
    pub fn standard() -> Self {
        Cascade {
            strategies: vec![
                Box::new(table::TableStrategy),
                Box::new(pattern::PatternStrategy),
                Box::new(columns::ColumnHeuristicStrategy),
                Box::new(narrative::NarrativeStrategy),
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Cascade { strategies }
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// Run strategies in order, stopping at the first that yields a
    /// transaction. Never fails.
    pub fn run(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> CascadeOutcome {
        let mut trace = ExtractionTrace::default();

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let output = strategy.parse(pages, ctx);
            debug!(
                strategy = %kind,
                transactions = output.transactions.len(),
                skipped = output.skipped.len(),
                "strategy finished"
            );
            trace.attempts.push(StrategyAttempt {
                strategy: kind,
                transactions_found: output.transactions.len(),
                skipped_lines: output.skipped.len(),
            });
            trace.skipped_lines.extend(output.skipped);

            if !output.transactions.is_empty() {
                info!(
                    strategy = %kind,
                    transactions = output.transactions.len(),
                    "strategy matched"
                );
                return CascadeOutcome {
                    extraction: Extraction::Itemized {
                        strategy: kind,
                        transactions: output.transactions,
                    },
                    trace,
                };
            }
        }

        trace.summary_fallback_used = true;
        let extraction = match summary::find_summary_totals(pages) {
            Some(totals) => {
                info!(
                    deposits = %totals.total_deposits,
                    withdrawals = %totals.total_withdrawals,
                    "no line items found, using summary totals"
                );
                Extraction::SummaryOnly(totals)
            }
            None => {
                info!(pages = pages.len(), "no transactions found");
                Extraction::Nothing
            }
        };

        CascadeOutcome { extraction, trace }
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Cascade::standard()
    }
}

/// Direction from an explicit amount sign, else from the transfer keyword:
/// money coming "from" someone is a credit.
pub(crate) fn direction_from_sign(sign: Option<Sign>, is_from: bool) -> Direction {
    match sign {
        Some(Sign::Plus) => Direction::Credit,
        Some(Sign::Minus) => Direction::Debit,
        None if is_from => Direction::Credit,
        None => Direction::Debit,
    }
}

/// Credit when the description mentions any of `credit_keywords`.
pub(crate) fn direction_from_keywords(description: &str, credit_keywords: &[&str]) -> Direction {
    let lower = description.to_lowercase();
    if credit_keywords.iter().any(|k| lower.contains(k)) {
        Direction::Credit
    } else {
        Direction::Debit
    }
}
