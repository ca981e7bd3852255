//! Locale-agnostic parsing of monetary input.
//!
//! Payment amounts arrive from form fields typed by people used to either
//! `5.606,39` or `5,606.39`. The rules below pick the decimal separator from
//! the shape of the string alone:
//!
//! | shape                         | decimal separator | result         |
//! |-------------------------------|-------------------|----------------|
//! | one `,`, no `.`               | `,`               | `"5606,39"`    |
//! | one `.`, no `,`               | `.`               | `"5606.39"`    |
//! | both present                  | whichever is last | `"5.606,39"`   |
//! | two or more `,`, no `.`       | none              | `"1,234,567"`  |
//! | two or more `.`, no `,`       | none              | `"1.234.567"`  |
//!
//! Parsing never fails. Anything that cannot be reduced to a number is
//! read as zero, and [`is_valid_number`] exists for callers that need to
//! tell the two apart.

use crate::decimal::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A payment amount as captured, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// Already numeric; passed through unchanged.
    Number(Decimal),
    /// Free text in any of the accepted separator styles.
    Text(String),
}

impl RawAmount {
    /// Normalizes this input into a [`Money`] value.
    pub fn to_money(&self) -> Money {
        match self {
            RawAmount::Number(value) => Money::new(*value),
            RawAmount::Text(text) => parse_amount(text),
        }
    }

    /// Returns `true` if the input is blank text.
    pub fn is_blank(&self) -> bool {
        matches!(self, RawAmount::Text(text) if text.trim().is_empty())
    }

    /// Stringified form used by the audit trail.
    pub fn to_audit_string(&self) -> String {
        match self {
            RawAmount::Number(value) => value.normalize().to_string(),
            RawAmount::Text(text) => text.trim().to_string(),
        }
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        RawAmount::Number(value)
    }
}

impl From<Money> for RawAmount {
    fn from(value: Money) -> Self {
        RawAmount::Number(value.as_decimal())
    }
}

/// Parses a locale-ambiguous numeric string.
///
/// Returns zero for the empty string and for anything unparseable.
///
/// ```
/// use reconciliation_engine::normalizer::parse_amount;
///
/// assert_eq!(parse_amount("5.606,39"), parse_amount("5,606.39"));
/// assert!(parse_amount("not a number").is_zero());
/// ```
pub fn parse_amount(input: &str) -> Money {
    canonicalize(input)
        .and_then(|canonical| Decimal::from_str(&canonical).ok())
        .map(Money::new)
        .unwrap_or(Money::ZERO)
}

/// Returns `true` if `input` is empty or reduces to a finite number.
pub fn is_valid_number(input: &str) -> bool {
    match canonicalize(input) {
        Some(canonical) => Decimal::from_str(&canonical).is_ok(),
        None => false,
    }
}

/// Rewrites `input` so that `.` is the only (decimal) separator.
///
/// Two or more dots with no comma are always read as thousands grouping, so
/// `"12.34.56"` becomes `"123456"`.
fn canonicalize(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Some("0".to_string());
    }

    let commas = trimmed.matches(',').count();
    let dots = trimmed.matches('.').count();

    let canonical = match (commas, dots) {
        (0, 0) | (0, 1) => trimmed.to_string(),
        (1, 0) => trimmed.replace(',', "."),
        (_, 0) => trimmed.replace(',', ""),
        (0, _) => trimmed.replace('.', ""),
        _ => {
            let last_comma = trimmed.rfind(',')?;
            let last_dot = trimmed.rfind('.')?;
            if last_comma > last_dot {
                trimmed.replace('.', "").replace(',', ".")
            } else {
                trimmed.replace(',', "")
            }
        }
    };

    Some(canonical)
}
