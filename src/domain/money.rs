//! Decimal-string money helpers for display and validation.
//!
//! Values are parsed with `rust_decimal` so no float rounding ever reaches the screen.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a decimal string as sent by the backend or typed by the user.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// `$<value>` with two places. Non-numeric input is shown as given; missing as `—`.
pub fn format_money(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "—".to_string();
    };
    match parse_amount(raw) {
        Some(value) => format!("${}", two_places(value)),
        None => raw.to_string(),
    }
}

fn two_places(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Where a user stands in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceStatus {
    /// Others owe the user this (formatted) amount.
    Owed(String),
    /// The user owes this (formatted) amount.
    Owes(String),
    Settled,
}

impl BalanceStatus {
    /// Unparseable balances count as settled.
    pub fn from_balance(raw: &str) -> Self {
        let value = parse_amount(raw).unwrap_or_default();
        let money = format!("${}", two_places(value.abs()));
        if value.is_sign_positive() && !value.is_zero() {
            BalanceStatus::Owed(money)
        } else if value.is_sign_negative() && !value.is_zero() {
            BalanceStatus::Owes(money)
        } else {
            BalanceStatus::Settled
        }
    }
}

impl std::fmt::Display for BalanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceStatus::Owed(money) => write!(f, "is owed {}", money),
            BalanceStatus::Owes(money) => write!(f, "owes {}", money),
            BalanceStatus::Settled => write!(f, "is settled"),
        }
    }
}

/// Render a backend timestamp as `YYYY-MM-DD HH:MM`, or the date alone for plain dates.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// The `YYYY-MM-DD` part of a backend timestamp, for pre-filling date inputs.
pub fn date_part(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date().format("%Y-%m-%d").to_string());
    }
    let head = raw.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Some("42.5")), "$42.50");
        assert_eq!(format_money(Some("0.005")), "$0.01");
        assert_eq!(format_money(Some("  7 ")), "$7.00");
        assert_eq!(format_money(Some("n/a")), "n/a");
        assert_eq!(format_money(None), "—");
    }

    #[test]
    fn test_balance_status() {
        assert_eq!(BalanceStatus::from_balance("12.345").to_string(), "is owed $12.35");
        assert_eq!(BalanceStatus::from_balance("-3").to_string(), "owes $3.00");
        assert_eq!(BalanceStatus::from_balance("0.00"), BalanceStatus::Settled);
        assert_eq!(BalanceStatus::from_balance("-0"), BalanceStatus::Settled);
        assert_eq!(BalanceStatus::from_balance("garbage"), BalanceStatus::Settled);
    }

    #[test]
    fn test_parse_amount_keeps_precision() {
        let value = parse_amount("0.1").unwrap() + parse_amount("0.2").unwrap();
        assert_eq!(value, parse_amount("0.3").unwrap());
        assert!(parse_amount("").is_none());
        assert!(parse_amount("abc").is_none());
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(format_timestamp("2024-03-01T18:30:00Z"), "2024-03-01 18:30");
        assert_eq!(format_timestamp("2024-03-01T18:30:00.123456"), "2024-03-01 18:30");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(date_part("2024-03-01T23:30:00-02:00").as_deref(), Some("2024-03-02"));
        assert_eq!(date_part("2024-03-01T10:00:00").as_deref(), Some("2024-03-01"));
        assert_eq!(date_part("soon"), None);
    }
}
