//! Parsing and validation of the free-text answers users type during a conversation.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static DIGITS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("input is empty")]
    Empty,
    #[error("full name needs at least a surname and a given name")]
    IncompleteName,
    #[error("no number found in {0:?}")]
    NoNumber(String),
    #[error("price {0} is not accepted")]
    PriceNotAllowed(u32),
    #[error("table {0} is out of range 1..={1}")]
    TableOutOfRange(u32, u8),
}

/// Formats a buyer's name as `Surname Name [Patronymic]`.
///
/// Whitespace is collapsed, words past the third are dropped and each word is
/// capitalised.
pub fn format_full_name(input: &str) -> Result<String, ValidationError> {
    let words: Vec<&str> = input.split_whitespace().collect();
    match words.len() {
        0 => Err(ValidationError::Empty),
        1 => Err(ValidationError::IncompleteName),
        _ => Ok(words
            .iter()
            .take(3)
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(" ")),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Lower-cases, folds `ё` into `е` and collapses whitespace.
pub fn normalize_key(input: &str) -> String {
    input
        .split_whitespace()
        .map(|w| w.to_lowercase().replace('ё', "е"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalised surname, i.e. the first word of a full name.
pub fn surname_key(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .map(normalize_key)
        .unwrap_or_default()
}

/// A search term made only of digits (optionally prefixed with `#`) is a ticket number.
pub fn parse_ticket_id(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Extracts the first number from the input and checks it against the accepted prices.
///
/// `special_price` is accepted only when `special_allowed` is set.
pub fn parse_price(
    input: &str,
    prices: &[u32],
    special_price: Option<u32>,
    special_allowed: bool,
) -> Result<u32, ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let value: u32 = DIGITS_REGEX
        .find(input)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| ValidationError::NoNumber(input.to_string()))?;

    if prices.contains(&value) {
        return Ok(value);
    }
    if special_allowed && special_price == Some(value) {
        return Ok(value);
    }
    Err(ValidationError::PriceNotAllowed(value))
}

/// Parses a VIP table number in `1..=tables`.
pub fn parse_vip_table(input: &str, tables: u8) -> Result<u8, ValidationError> {
    let value: u32 = DIGITS_REGEX
        .find(input)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| ValidationError::NoNumber(input.to_string()))?;

    if value == 0 || value > u32::from(tables) {
        return Err(ValidationError::TableOutOfRange(value, tables));
    }
    Ok(value as u8)
}

/// `Some(true)` for yes, `Some(false)` for no, `None` for anything else.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "да" | "yes" | "y" | "+" => Some(true),
        "нет" | "no" | "n" | "-" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: [u32; 5] = [17, 20, 22, 25, 30];

    #[test]
    fn test_format_full_name_two_and_three_words() {
        assert_eq!(format_full_name("ivan petrov").unwrap(), "Ivan Petrov");
        assert_eq!(
            format_full_name("  иванов   иван  иванович  ").unwrap(),
            "Иванов Иван Иванович"
        );
    }

    #[test]
    fn test_format_full_name_drops_extra_words() {
        assert_eq!(format_full_name("a b c d").unwrap(), "A B C");
    }

    #[test]
    fn test_format_full_name_rejects_short_input() {
        assert_eq!(format_full_name("   "), Err(ValidationError::Empty));
        assert_eq!(
            format_full_name("Petrov"),
            Err(ValidationError::IncompleteName)
        );
    }

    #[test]
    fn test_normalize_key_folds_yo() {
        assert_eq!(normalize_key("Семёнов  Пётр"), "семенов петр");
        assert_eq!(surname_key("Семёнов Пётр"), "семенов");
        assert_eq!(surname_key(""), "");
    }

    #[test]
    fn test_parse_ticket_id() {
        assert_eq!(parse_ticket_id("42"), Some(42));
        assert_eq!(parse_ticket_id(" #7 "), Some(7));
        assert_eq!(parse_ticket_id("Smi"), None);
        assert_eq!(parse_ticket_id("12a"), None);
        assert_eq!(parse_ticket_id(""), None);
    }

    #[test]
    fn test_parse_price_accepts_exactly_the_price_set() {
        for price in PRICES {
            assert_eq!(
                parse_price(&price.to_string(), &PRICES, Some(15), false),
                Ok(price)
            );
        }
        for rejected in [0, 1, 15, 16, 18, 21, 26, 29, 31, 100] {
            assert_eq!(
                parse_price(&rejected.to_string(), &PRICES, Some(15), false),
                Err(ValidationError::PriceNotAllowed(rejected))
            );
        }
    }

    #[test]
    fn test_parse_price_special_only_for_privileged() {
        assert_eq!(parse_price("15", &PRICES, Some(15), true), Ok(15));
        assert!(parse_price("15", &PRICES, Some(15), false).is_err());
        assert!(parse_price("15", &PRICES, None, true).is_err());
    }

    #[test]
    fn test_parse_price_takes_first_number() {
        assert_eq!(parse_price("20 руб", &PRICES, None, false), Ok(20));
        assert_eq!(parse_price("BYN 25", &PRICES, None, false), Ok(25));
        assert!(matches!(
            parse_price("twenty", &PRICES, None, false),
            Err(ValidationError::NoNumber(_))
        ));
        assert_eq!(
            parse_price("", &PRICES, None, false),
            Err(ValidationError::Empty)
        );
    }

    #[test]
    fn test_parse_vip_table_bounds() {
        assert_eq!(parse_vip_table("1", 5), Ok(1));
        assert_eq!(parse_vip_table("стол 5", 5), Ok(5));
        assert_eq!(
            parse_vip_table("6", 5),
            Err(ValidationError::TableOutOfRange(6, 5))
        );
        assert_eq!(
            parse_vip_table("0", 5),
            Err(ValidationError::TableOutOfRange(0, 5))
        );
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Да"), Some(true));
        assert_eq!(parse_yes_no("no"), Some(false));
        assert_eq!(parse_yes_no("нет "), Some(false));
        assert_eq!(parse_yes_no("maybe"), None);
    }
}
