//! Reader for the JSON returned by the external vision model.
//!
//! The model is asked for `{ transactions: [...], summary: {...} }` but tends
//! to wrap it in markdown fences or chatter, so the outermost brace pair is
//! cut out before deserializing.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::aggregate::RunningTotals;
use crate::categorize::Categorizer;
use crate::error::TallyError;
use crate::model::{Direction, StatementDate, StatementPeriod, Transaction};
use crate::parsing::values::parse_signed_amount;

const MAX_DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionPayload {
    transactions: Vec<VisionRow>,
    #[serde(default)]
    summary: Option<VisionSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionRow {
    date: String,
    description: String,
    amount: Value,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionSummary {
    #[serde(default)]
    period: Option<VisionPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionPeriod {
    start_date: String,
    end_date: String,
}

/// Rows and period recovered from a vision response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionExtraction {
    pub transactions: Vec<Transaction>,
    pub period: Option<StatementPeriod>,
}

/// Parse a raw vision-model response.
///
/// Categories suggested by the model are ignored; every row goes through
/// `categorizer` so both input paths agree. Zero-amount rows are dropped, as
/// are rows whose amount is not a number or would overflow the totals.
pub fn read_vision_response(
    response: &str,
    categorizer: &Categorizer,
) -> Result<VisionExtraction, TallyError> {
    let json = outer_object(response)
        .ok_or_else(|| TallyError::InvalidVisionPayload("no JSON object found".into()))?;
    let payload: VisionPayload = serde_json::from_str(json)
        .map_err(|e| TallyError::InvalidVisionPayload(e.to_string()))?;

    let mut transactions = Vec::with_capacity(payload.transactions.len());
    let mut totals = RunningTotals::default();
    for (i, row) in payload.transactions.into_iter().enumerate() {
        let Some(amount) = row_amount(&row.amount) else {
            debug!(row = i, amount = %row.amount, "skipping vision row with invalid amount");
            continue;
        };
        let description = sanitize_description(&row.description);
        let direction = if row.kind == "income" {
            Direction::Credit
        } else {
            Direction::Debit
        };
        let category = categorizer.categorize(&description).to_string();
        let reference = row.reference.filter(|r| !r.trim().is_empty());

        if let Some(t) = Transaction::new(
            StatementDate::parse(&row.date),
            description,
            amount,
            direction,
            category,
        ) {
            match totals.add(&t) {
                Ok(()) => transactions.push(t.with_reference(reference)),
                Err(overflow) => debug!(row = i, %overflow, "skipping vision row"),
            }
        }
    }

    let period = payload
        .summary
        .and_then(|s| s.period)
        .map(|p| StatementPeriod {
            start: StatementDate::parse(&p.start_date),
            end: StatementDate::parse(&p.end_date),
        });

    Ok(VisionExtraction {
        transactions,
        period,
    })
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Absolute value of a number or numeric string.
fn row_amount(value: &Value) -> Option<rust_decimal::Decimal> {
    let token = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return None,
    };
    parse_signed_amount(&token).ok().map(|a| a.magnitude)
}

/// Keep word characters, whitespace and `-.,&()`; trim; cap the length.
fn sanitize_description(description: &str) -> String {
    let kept: String = description
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || "-.,&()".contains(*c)
        })
        .collect();
    kept.trim().chars().take(MAX_DESCRIPTION_CHARS).collect()
}
