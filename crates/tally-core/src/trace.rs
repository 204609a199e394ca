use serde::{Deserialize, Serialize};

use crate::cascade::StrategyKind;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

/// One strategy run during the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyKind,
    pub transactions_found: usize,
    pub skipped_lines: usize,
}

/// A row that looked like a transaction but was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub page_number: usize,
    pub strategy: StrategyKind,
    pub line_text: String,
    pub reason: String,
}

impl SkippedLine {
    pub fn new(
        page_number: usize,
        strategy: StrategyKind,
        line_text: &str,
        reason: impl ToString,
    ) -> Self {
        SkippedLine {
            page_number,
            strategy,
            line_text: line_text.trim().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// How the ledger was recovered: strategies attempted in order, whether the
/// summary totals fallback was consulted, and every skipped row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionTrace {
    pub trace_schema_version: String,
    pub attempts: Vec<StrategyAttempt>,
    #[serde(default)]
    pub summary_fallback_used: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_lines: Vec<SkippedLine>,
}

impl Default for ExtractionTrace {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            attempts: Vec::new(),
            summary_fallback_used: false,
            skipped_lines: Vec::new(),
        }
    }
}

impl ExtractionTrace {
    /// The strategy that produced transactions, if any did.
    pub fn winning_strategy(&self) -> Option<StrategyKind> {
        self.attempts
            .iter()
            .find(|a| a.transactions_found > 0)
            .map(|a| a.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winning_strategy_is_first_with_results() {
        let trace = ExtractionTrace {
            attempts: vec![
                StrategyAttempt {
                    strategy: StrategyKind::Table,
                    transactions_found: 0,
                    skipped_lines: 2,
                },
                StrategyAttempt {
                    strategy: StrategyKind::Pattern,
                    transactions_found: 3,
                    skipped_lines: 0,
                },
            ],
            ..ExtractionTrace::default()
        };
        assert_eq!(trace.winning_strategy(), Some(StrategyKind::Pattern));
        assert_eq!(ExtractionTrace::default().winning_strategy(), None);
    }

    #[test]
    fn test_skipped_line_serializes_snake_case_strategy() {
        let line = SkippedLine::new(
            2,
            StrategyKind::ColumnHeuristic,
            "  01/02/2024  X  1.2.3 ",
            "bad",
        );
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["strategy"], "column_heuristic");
        assert_eq!(json["line_text"], "01/02/2024  X  1.2.3");
    }
}
