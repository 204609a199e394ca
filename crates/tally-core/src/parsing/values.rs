use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// A numeric token that looked like money but would not parse.
///
/// Never crosses the library boundary: the row is skipped and the failure
/// lands in the extraction trace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid number '{token}'")]
pub struct NumericParseFailure {
    pub token: String,
}

impl NumericParseFailure {
    fn new(token: &str) -> Self {
        NumericParseFailure {
            token: token.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// A money token split into its explicit sign (if any) and magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAmount {
    pub sign: Option<Sign>,
    pub magnitude: Decimal,
}

impl SignedAmount {
    pub fn value(&self) -> Decimal {
        match self.sign {
            Some(Sign::Minus) => -self.magnitude,
            _ => self.magnitude,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }
}

static AMOUNT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?\s?(?:₦|NGN|N|\$|£|€)?\s?\d[\d,.]*$").unwrap()
});

/// Keep only digits, `.` and `-`.
pub fn clean_numeric(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Parse a table cell after [`clean_numeric`].
///
/// Cells with no digits at all (blank, `-`, `CR`) are `Ok(None)`; cells with
/// digits that still do not form a number are an error.
pub fn parse_cleaned(s: &str) -> Result<Option<Decimal>, NumericParseFailure> {
    let cleaned = clean_numeric(s);
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    Decimal::from_str(&cleaned)
        .map(Some)
        .map_err(|_| NumericParseFailure::new(s))
}

/// True when `token` reads as a standalone currency amount. Malformed
/// groupings such as `1.000.00` still qualify so they can be reported.
pub fn looks_like_amount(token: &str) -> bool {
    AMOUNT_TOKEN.is_match(token.trim())
}

/// Parse a money token such as `-15,000.00`, `+₦500`, or `1500000.00`.
pub fn parse_signed_amount(token: &str) -> Result<SignedAmount, NumericParseFailure> {
    let trimmed = token.trim();
    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (Some(Sign::Plus), &trimmed[1..]),
        Some('-') => (Some(Sign::Minus), &trimmed[1..]),
        _ => (None, trimmed),
    };
    let digits: String = rest
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() {
        return Err(NumericParseFailure::new(token));
    }
    let magnitude = Decimal::from_str(&digits).map_err(|_| NumericParseFailure::new(token))?;
    Ok(SignedAmount { sign, magnitude })
}
