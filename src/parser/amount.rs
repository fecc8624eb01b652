//! Numeric coercion for financial input tokens
//!
//! Strips currency symbols and thousands separators before parsing.
//! Fails closed: a token that does not survive coercion yields `None`
//! and the caller routes the whole line to leftover raw text.

use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '₹', '¥'];

/// Coerce a token like "$4,500", "-12.50" or "₹95" into a decimal.
/// Sign is preserved (transaction amounts use it for debit/credit).
pub fn coerce_amount(token: &str) -> Option<Decimal> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c) && *c != ',')
        .collect();

    if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Coerce a token that must be a strictly positive amount
/// (income, expense and goal amounts).
pub fn coerce_positive_amount(token: &str) -> Option<Decimal> {
    coerce_amount(token).filter(|d| d.is_sign_positive() && !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_symbols_and_separators() {
        assert_eq!(coerce_amount("$4,500"), Some(Decimal::from_str("4500").unwrap()));
        assert_eq!(coerce_amount("€1,234.56"), Some(Decimal::from_str("1234.56").unwrap()));
        assert_eq!(coerce_amount(" ₹ 95 "), Some(Decimal::from_str("95").unwrap()));
    }

    #[test]
    fn test_sign_is_preserved() {
        assert_eq!(coerce_amount("-12.50"), Some(Decimal::from_str("-12.50").unwrap()));
        assert_eq!(coerce_amount("+6.50"), Some(Decimal::from_str("6.50").unwrap()));
    }

    #[test]
    fn test_non_numeric_fails_closed() {
        assert_eq!(coerce_amount("fifteen dollars"), None);
        assert_eq!(coerce_amount("$"), None);
        assert_eq!(coerce_amount(""), None);
        assert_eq!(coerce_amount("12.3.4"), None);
    }

    #[test]
    fn test_positive_only() {
        assert!(coerce_positive_amount("$15").is_some());
        assert_eq!(coerce_positive_amount("-15"), None);
        assert_eq!(coerce_positive_amount("0"), None);
    }
}
