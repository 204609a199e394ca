use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;
use tracing::debug;

use crate::cascade::{
    columns, direction_from_keywords, direction_from_sign, ParseContext, ParseStrategy,
    RowOutcome, StrategyKind, StrategyOutput,
};
use crate::extraction::PageContent;
use crate::model::{Direction, StatementDate, Transaction};
use crate::parsing::values::{parse_cleaned, NumericParseFailure, Sign};
use crate::parsing::{dates, split_cells, Cell};

const MIN_HEADER_TOKENS: usize = 3;
const MIN_ROW_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnName {
    Date,
    Description,
    Type,
    Debit,
    Credit,
    Amount,
    Balance,
}

static HEADER_VOCABULARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:trans(?:action)?\s+date|date|description|details|narration|particulars|trans(?:action)?\s+type|type|debits?|withdrawals?|credits?|deposits?|amount|amt|balance|bal)\b",
    )
    .unwrap()
});

static COLUMN_PATTERNS: LazyLock<Vec<(ColumnName, Regex)>> = LazyLock::new(|| {
    let pattern = |p: &str| Regex::new(&format!(r"(?i)\b(?:{p})\b")).unwrap();
    vec![
        (ColumnName::Date, pattern(r"trans(?:action)?\s+date|date")),
        (ColumnName::Description, pattern("description|details|narration|particulars")),
        (ColumnName::Type, pattern(r"trans(?:action)?\s+type|type")),
        (ColumnName::Debit, pattern("debits?|withdrawals?|out|expense")),
        (ColumnName::Credit, pattern("credits?|deposits?|in|income")),
        (ColumnName::Amount, pattern("amount|amt")),
        (ColumnName::Balance, pattern("ending balance|balance|bal")),
    ]
});

static PAGE_FURNITURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)page|statement|generated|report|summary|total|balance").unwrap()
});

/// One header word and the horizontal range it labels, in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: ColumnName,
    pub start: usize,
    /// Start of the token following the header word, or end of line.
    /// Informational: cells are assigned up to the next column's start, so
    /// a value may run past `end` and still belong to this column.
    pub end: usize,
}

/// Column boundaries inferred from a single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<Column>,
}

impl ColumnLayout {
    /// Build a layout when `line` holds at least three column-vocabulary
    /// tokens.
    pub fn from_header(line: &str) -> Option<ColumnLayout> {
        if HEADER_VOCABULARY.find_iter(line).count() < MIN_HEADER_TOKENS {
            return None;
        }

        let mut found: Vec<(ColumnName, usize, usize)> = COLUMN_PATTERNS
            .iter()
            .flat_map(|(name, regex)| {
                regex
                    .find_iter(line)
                    .map(move |m| (*name, m.start(), m.end()))
            })
            .collect();
        found.sort_by_key(|&(_, start, _)| start);

        let mut columns: Vec<Column> = Vec::new();
        let mut last_end = 0;
        for (name, start, end) in found {
            if start < last_end {
                continue;
            }
            last_end = end;
            columns.push(Column {
                name,
                start: char_offset(line, start),
                end: char_offset(line, next_token_start(line, end)),
            });
        }

        Some(ColumnLayout { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn first_is(&self, name: ColumnName) -> bool {
        self.columns.first().is_some_and(|c| c.name == name)
    }

    /// Exclusive right edge of column `idx`: the next column's start.
    fn limit(&self, idx: usize) -> usize {
        self.columns.get(idx + 1).map_or(usize::MAX, |c| c.start)
    }

    /// Distribute a data line over the columns.
    ///
    /// Whitespace-separated cells go to the column whose range they overlap
    /// most, so numbers right-aligned under a left-aligned header word are
    /// not cut in half. A line with no column gaps is sliced at the raw
    /// offsets.
    pub fn slice(&self, line: &str) -> RowValues {
        let mut values = vec![String::new(); self.columns.len()];
        if self.columns.is_empty() {
            return RowValues { names: Vec::new(), values };
        }

        let cells = split_cells(line);
        if cells.len() < 2 {
            for (idx, column) in self.columns.iter().enumerate() {
                values[idx] = char_slice(line, column.start, self.limit(idx)).trim().to_string();
            }
        } else {
            for cell in &cells {
                let idx = self.best_column(cell);
                if !values[idx].is_empty() {
                    values[idx].push(' ');
                }
                values[idx].push_str(cell.text.trim());
            }
        }

        RowValues {
            names: self.columns.iter().map(|c| c.name).collect(),
            values,
        }
    }

    fn best_column(&self, cell: &Cell<'_>) -> usize {
        let mut best = (0, 0usize, usize::MAX);
        for (idx, column) in self.columns.iter().enumerate() {
            let limit = self.limit(idx);
            let overlap = cell.end.min(limit).saturating_sub(cell.start.max(column.start));
            let distance = if cell.end <= column.start {
                column.start - cell.end
            } else if cell.start >= limit {
                cell.start - limit
            } else {
                0
            };
            let (_, best_overlap, best_distance) = best;
            if overlap > best_overlap || (overlap == best_overlap && distance < best_distance) {
                best = (idx, overlap, distance);
            }
        }
        best.0
    }
}

/// Text of one data line, per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowValues {
    names: Vec<ColumnName>,
    values: Vec<String>,
}

impl RowValues {
    /// First non-empty value of a column with this name.
    pub fn get(&self, name: ColumnName) -> Option<&str> {
        self.position(name).map(|idx| self.values[idx].as_str())
    }

    /// Non-empty values to the right of the one [`RowValues::get`] returns.
    pub fn after(&self, name: ColumnName) -> impl Iterator<Item = (ColumnName, &str)> {
        let from = self.position(name).map_or(self.values.len(), |idx| idx + 1);
        self.names[from..]
            .iter()
            .zip(&self.values[from..])
            .filter(|(_, v)| !v.is_empty())
            .map(|(n, v)| (*n, v.as_str()))
    }

    fn position(&self, name: ColumnName) -> Option<usize> {
        self.names
            .iter()
            .zip(&self.values)
            .position(|(n, v)| *n == name && !v.is_empty())
    }
}

/// Strategy 1: pages with a recognizable column header.
pub struct TableStrategy;

impl ParseStrategy for TableStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Table
    }

    fn parse(&self, pages: &[PageContent], ctx: &ParseContext<'_>) -> StrategyOutput {
        let mut out = StrategyOutput::default();

        for page in pages {
            let lines: Vec<&str> = page.lines().collect();
            let Some((header_idx, layout)) = lines
                .iter()
                .enumerate()
                .find_map(|(i, line)| ColumnLayout::from_header(line).map(|layout| (i, layout)))
            else {
                continue;
            };
            debug!(
                page = page.page_number,
                columns = ?layout.columns().iter().map(|c| c.name).collect::<Vec<_>>(),
                "table header found"
            );

            for line in &lines[header_idx + 1..] {
                let outcome = parse_row(line, &layout, ctx);
                out.record(self.kind(), page.page_number, line, outcome);
            }
        }

        out
    }
}

fn parse_row(line: &str, layout: &ColumnLayout, ctx: &ParseContext<'_>) -> RowOutcome {
    let trimmed = line.trim();
    if trimmed.chars().count() < MIN_ROW_CHARS || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    if PAGE_FURNITURE.is_match(trimmed) && dates::find_date(trimmed).is_none() {
        return Ok(None);
    }

    let row = layout.slice(line);

    let date_text = match row.get(ColumnName::Date) {
        Some(text) => text,
        None if layout.first_is(ColumnName::Date) => match columns::date_prefix(trimmed) {
            Some(prefix) => prefix,
            None => return Ok(None),
        },
        None => return Ok(None),
    };
    if dates::find_date(date_text).is_none() {
        return Ok(None);
    }

    let amount = numeric(row.get(ColumnName::Amount))?;
    let debit = money_cell(row.get(ColumnName::Debit))?;
    let credit = money_cell(row.get(ColumnName::Credit))?;

    // The debit column wins when both hold a value. An explicit sign in the
    // cell overrides the column it landed in.
    let column_pick = [(ColumnName::Debit, debit), (ColumnName::Credit, credit)]
        .into_iter()
        .find_map(|(name, cell)| cell.filter(|c| !c.value.is_zero()).map(|c| (name, c)))
        .map(|(name, cell)| {
            let direction = direction_from_sign(cell.sign, name == ColumnName::Credit);
            (name, cell.value.abs(), direction)
        });
    let (value, consumed) = match (amount, column_pick) {
        (Some(a), _) => (a, ColumnName::Amount),
        (None, Some((name, v, _))) => (v, name),
        (None, None) => return Ok(None),
    };

    let description = row.get(ColumnName::Description).unwrap_or_default().to_string();
    let direction = row
        .get(ColumnName::Type)
        .map(type_direction)
        .or(column_pick.map(|(_, _, d)| d))
        .unwrap_or_else(|| direction_from_keywords(&description, &["credit", "deposit"]));
    let balance = match numeric(row.get(ColumnName::Balance))? {
        Some(balance) => Some(balance),
        None => trailing_balance(&row, consumed)?,
    };

    let category = ctx.category(&description);
    Ok(
        Transaction::new(StatementDate::parse(date_text), description, value, direction, category)
            .map(|t| t.with_balance(balance)),
    )
}

fn numeric(cell: Option<&str>) -> Result<Option<Decimal>, NumericParseFailure> {
    match cell {
        Some(text) => parse_cleaned(text),
        None => Ok(None),
    }
}

/// A debit or credit cell with its leading `+`/`-`, if any.
#[derive(Debug, Clone, Copy)]
struct MoneyCell {
    value: Decimal,
    sign: Option<Sign>,
}

fn money_cell(cell: Option<&str>) -> Result<Option<MoneyCell>, NumericParseFailure> {
    let Some(text) = cell else {
        return Ok(None);
    };
    let sign = match text.trim_start().chars().next() {
        Some('+') => Some(Sign::Plus),
        Some('-') => Some(Sign::Minus),
        _ => None,
    };
    Ok(parse_cleaned(text)?.map(|value| MoneyCell { value, sign }))
}

/// With the balance column empty, the last money value right of the amount
/// is the running balance. Right-aligned figures under a narrow header
/// often land one column early.
fn trailing_balance(
    row: &RowValues,
    consumed: ColumnName,
) -> Result<Option<Decimal>, NumericParseFailure> {
    let last = row
        .after(consumed)
        .filter(|(name, _)| {
            matches!(name, ColumnName::Debit | ColumnName::Credit | ColumnName::Amount)
        })
        .last();
    match last {
        Some((_, text)) => parse_cleaned(text),
        None => Ok(None),
    }
}

fn type_direction(text: &str) -> Direction {
    let lower = text.trim().to_lowercase();
    if lower.contains("credit") || lower == "cr" {
        Direction::Credit
    } else {
        Direction::Debit
    }
}

/// Byte offset of the token after the whitespace that follows `from`.
fn next_token_start(line: &str, from: usize) -> usize {
    let rest = &line[from..];
    let Some(ws) = rest.find(char::is_whitespace) else {
        return line.len();
    };
    match rest[ws..].find(|c: char| !c.is_whitespace()) {
        Some(token) => from + ws + token,
        None => line.len(),
    }
}

fn char_offset(line: &str, byte: usize) -> usize {
    line[..byte].chars().count()
}

fn char_slice(line: &str, start: usize, end: usize) -> &str {
    let byte_at = |chars: usize| line.char_indices().nth(chars).map_or(line.len(), |(b, _)| b);
    let start = byte_at(start);
    let end = byte_at(end).max(start);
    &line[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Categorizer;
    use rust_decimal_macros::dec;

    const HEADER: &str = "Date        Description Debit Credit      Balance";

    fn ctx() -> ParseContext<'static> {
        ParseContext {
            categorizer: Categorizer::builtin(),
        }
    }

    fn run(lines: &[&str]) -> StrategyOutput {
        TableStrategy.parse(&[PageContent::from_lines(1, lines)], &ctx())
    }

    #[test]
    fn test_header_detection_needs_three_tokens() {
        assert!(ColumnLayout::from_header("Date   Description   Amount").is_some());
        assert!(ColumnLayout::from_header("Date   Description").is_none());
        assert!(ColumnLayout::from_header("Opening balance as at date").is_none());
    }

    #[test]
    fn test_layout_offsets() {
        let layout = ColumnLayout::from_header(HEADER).unwrap();
        let names: Vec<ColumnName> = layout.columns().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                ColumnName::Date,
                ColumnName::Description,
                ColumnName::Debit,
                ColumnName::Credit,
                ColumnName::Balance
            ]
        );
        assert_eq!(layout.columns()[0], Column { name: ColumnName::Date, start: 0, end: 12 });
        assert_eq!(layout.columns()[3].start, 30);
        assert_eq!(layout.columns()[4].end, HEADER.len());
    }

    #[test]
    fn test_cell_may_run_past_header_word_end() {
        let layout = ColumnLayout::from_header("Date   Description   Amount").unwrap();
        assert_eq!(layout.columns()[2].end, 27);
        let row = layout.slice("01/02/2024   SALARY   1,500,000.00");
        assert_eq!(row.get(ColumnName::Amount), Some("1,500,000.00"));
        assert_eq!(row.get(ColumnName::Description), Some("SALARY"));
    }

    #[test]
    fn test_credit_row_under_debit_credit_header() {
        let out = run(&[HEADER, "01/02/2024  SALARY PAYMENT   +500000.00   1500000.00"]);
        assert_eq!(out.transactions.len(), 1);
        let t = &out.transactions[0];
        assert_eq!(t.direction, Direction::Credit);
        assert_eq!(t.amount, dec!(500000.00));
        assert_eq!(t.balance, Some(dec!(1500000.00)));
        assert_eq!(t.description, "SALARY PAYMENT");
        assert_eq!(t.category, "Income");
        assert_eq!(t.date.normalized, "2024-02-01");
    }

    #[test]
    fn test_debit_column_wins_when_populated() {
        let out = run(&[
            "Date        Description        Debit        Credit       Balance",
            "03/02/2024  POS SHOPRITE       5,000.00                  15,000.00",
            "04/02/2024  TRANSFER FROM ADA               2,500.00     17,500.00",
        ]);
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.transactions[0].direction, Direction::Debit);
        assert_eq!(out.transactions[0].amount, dec!(5000.00));
        assert_eq!(out.transactions[1].direction, Direction::Credit);
        assert_eq!(out.transactions[1].amount, dec!(2500.00));
        assert_eq!(out.transactions[1].balance, Some(dec!(17500.00)));
    }

    #[test]
    fn test_explicit_sign_and_trailing_balance_under_any_spacing() {
        let line = "01/02/2024  SALARY PAYMENT   +500000.00   1500000.00";
        for header in [
            HEADER,
            "Date        Description        Debit        Credit       Balance",
            "Date        Description     Debit       Credit      Balance",
        ] {
            let out = run(&[header, line]);
            assert_eq!(out.transactions.len(), 1, "header {header:?}");
            let t = &out.transactions[0];
            assert_eq!(t.direction, Direction::Credit, "header {header:?}");
            assert_eq!(t.amount, dec!(500000.00), "header {header:?}");
            assert_eq!(t.balance, Some(dec!(1500000.00)), "header {header:?}");
            assert_eq!(t.description, "SALARY PAYMENT", "header {header:?}");
        }
    }

    #[test]
    fn test_minus_sign_in_credit_column_is_a_debit() {
        let out = run(&[
            "Date        Description        Debit        Credit       Balance",
            "02/02/2024  AIRTIME RECHARGE                -100.00      1499900.00",
        ]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.transactions[0].direction, Direction::Debit);
        assert_eq!(out.transactions[0].amount, dec!(100.00));
        assert_eq!(out.transactions[0].balance, Some(dec!(1499900.00)));
    }

    #[test]
    fn test_row_values_after() {
        let layout = ColumnLayout::from_header(
            "Date        Description        Debit        Credit       Balance",
        )
        .unwrap();
        let row = layout.slice("01/02/2024  SALARY PAYMENT   +500000.00   1500000.00");
        let after: Vec<(ColumnName, &str)> = row.after(ColumnName::Debit).collect();
        assert_eq!(after, vec![(ColumnName::Credit, "1500000.00")]);
        assert_eq!(row.after(ColumnName::Balance).count(), 0);
    }

    #[test]
    fn test_type_column_and_amount() {
        let out = run(&[
            "Trans Date   Narration            Type    Amount      Balance",
            "05-Jan-24    NEFT INWARD ACME     CR      1,000.00    9,000.00",
            "06-Jan-24    NETFLIX.COM          DR      4,400.00    4,600.00",
        ]);
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.transactions[0].direction, Direction::Credit);
        assert_eq!(out.transactions[0].date.normalized, "2024-01-05");
        assert_eq!(out.transactions[1].direction, Direction::Debit);
        assert_eq!(out.transactions[1].category, "Entertainment");
    }

    #[test]
    fn test_amount_column_falls_back_to_keywords() {
        let out = run(&[
            "Date         Description            Amount",
            "07/01/2024   CASH DEPOSIT BRANCH    20,000.00",
            "08/01/2024   ATM WITHDRAWAL         5,000.00",
        ]);
        assert_eq!(out.transactions[0].direction, Direction::Credit);
        assert_eq!(out.transactions[1].direction, Direction::Debit);
    }

    #[test]
    fn test_furniture_and_short_lines_skipped() {
        let out = run(&[
            HEADER,
            "Page 2 of 3",
            "Total 12",
            "1234",
            "01/02/2024  SALARY PAYMENT   +500000.00   1500000.00",
        ]);
        assert_eq!(out.transactions.len(), 1);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_zero_and_negative_amounts_are_not_transactions() {
        let out = run(&[
            "Date         Description            Amount",
            "07/01/2024   REVERSAL               0.00",
            "08/01/2024   REVERSAL               -10.00",
        ]);
        assert!(out.transactions.is_empty());
    }

    #[test]
    fn test_malformed_number_skips_only_that_row() {
        let out = run(&[
            "Date         Description            Amount",
            "07/01/2024   BROKEN                 1.000.00",
            "08/01/2024   AIRTIME                100.00",
        ]);
        assert_eq!(out.transactions.len(), 1);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].strategy, StrategyKind::Table);
        assert!(out.skipped[0].reason.contains("1.000.00"));
    }

    #[test]
    fn test_page_without_header_yields_nothing() {
        let out = run(&["01/02/2024  SALARY PAYMENT   +500000.00   1500000.00"]);
        assert!(out.transactions.is_empty());
    }

    #[test]
    fn test_char_slice_handles_multibyte() {
        assert_eq!(char_slice("₦100  ok", 1, 4), "100");
        assert_eq!(char_slice("abc", 2, 10), "c");
        assert_eq!(char_slice("abc", 5, 10), "");
    }
}
