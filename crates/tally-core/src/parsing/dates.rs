use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::model::StatementDate;

/// Recognized date shapes, tried in order. All numeric forms are day-first.
#[derive(Debug, Clone, Copy)]
enum DateShape {
    /// `2024-03-12`
    Iso,
    /// `12 Mar 2024`, `12 March 2024`, `12-Mar-2024`, `31-Dec-23`
    DayMonthName,
    /// `March 12, 2024`
    MonthNameDay,
    /// `12/03/2024`, `12/03/24`
    Slash,
    /// `12-03-2024`, `12-03-24`
    Dash,
}

static DATE_SHAPES: LazyLock<Vec<(DateShape, Regex)>> = LazyLock::new(|| {
    vec![
        (DateShape::Iso, Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap()),
        (
            DateShape::DayMonthName,
            Regex::new(r"\b(\d{1,2})[\s\-/]+([A-Za-z]{3,9})\.?,?[\s\-/]+(\d{4}|\d{2})\b").unwrap(),
        ),
        (
            DateShape::MonthNameDay,
            Regex::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").unwrap(),
        ),
        (DateShape::Slash, Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b").unwrap()),
        (DateShape::Dash, Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{4}|\d{2})\b").unwrap()),
    ]
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Turn a raw date token into a [`StatementDate`].
///
/// Unrecognized or impossible dates keep the raw token as their normalized
/// form so they still sort (after every real date).
pub fn normalize_date(raw: &str) -> StatementDate {
    let raw = raw.trim();
    let normalized = match find_date(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    };
    StatementDate {
        raw: raw.to_string(),
        normalized,
    }
}

/// Locate the first recognizable date inside `text`.
///
/// Shapes are tried in a fixed order; within a shape the leftmost valid
/// match wins.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    DATE_SHAPES.iter().find_map(|(shape, regex)| {
        regex
            .captures_iter(text)
            .find_map(|caps| date_from_captures(*shape, &caps))
    })
}

fn date_from_captures(shape: DateShape, caps: &Captures<'_>) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let (year, month, day) = match shape {
        DateShape::Iso => (num(1)? as i32, num(2)?, num(3)?),
        DateShape::DayMonthName => (
            year_from(caps.get(3)?.as_str())?,
            month_from_name(caps.get(2)?.as_str())?,
            num(1)?,
        ),
        DateShape::MonthNameDay => (
            year_from(caps.get(3)?.as_str())?,
            month_from_name(caps.get(1)?.as_str())?,
            num(2)?,
        ),
        DateShape::Slash | DateShape::Dash => {
            (year_from(caps.get(3)?.as_str())?, num(2)?, num(1)?)
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Two-digit years land in the 2000s.
fn year_from(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    match s.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Month number from an English name or abbreviation (`Mar`, `March`, `Sept`).
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|full| full.starts_with(&lower))
        .map(|i| i as u32 + 1)
}
