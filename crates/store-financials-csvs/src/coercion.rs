//! Cell-level type coercion used by the validator.
//!
//! Every function maps a raw [`Cell`] to a [`Coerced`] value. A blank cell is
//! always `Null`; a value that cannot be interpreted is `Invalid`, which callers
//! count and report instead of failing.

use crate::dataset::Cell;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    Null,
    Value(T),
    Invalid,
}

impl<T> Coerced<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Coerced::Invalid)
    }
}

/// Whole number from a numeric cell or numeric text ("2024", "2024.0")
pub fn coerce_integer(cell: &Cell) -> Coerced<i64> {
    match cell {
        Cell::Empty => Coerced::Null,
        Cell::Int(i) => Coerced::Value(*i),
        Cell::Float(f) => integral_float(*f),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Coerced::Null;
            }
            if let Ok(i) = s.parse::<i64>() {
                return Coerced::Value(i);
            }
            match s.parse::<f64>() {
                Ok(f) => integral_float(f),
                Err(_) => Coerced::Invalid,
            }
        }
        Cell::Bool(_) | Cell::DateTime(_) => Coerced::Invalid,
    }
}

/// Period number; labelled text uses its first run of digits ("P01", "Period 1")
///
/// Text that is a plain number follows the integer rule, so "1.5" is rejected the
/// same way a numeric 1.5 cell is.
pub fn coerce_period(cell: &Cell) -> Coerced<i64> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Coerced::Null;
            }
            if s.parse::<f64>().is_ok() {
                return coerce_integer(cell);
            }
            match first_digit_run(s) {
                Some(digits) => digits
                    .parse::<i64>()
                    .map(Coerced::Value)
                    .unwrap_or(Coerced::Invalid),
                None => Coerced::Invalid,
            }
        }
        other => coerce_integer(other),
    }
}

fn first_digit_run(s: &str) -> Option<&str> {
    s.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
}

fn integral_float(f: f64) -> Coerced<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Coerced::Value(f as i64)
    } else {
        Coerced::Invalid
    }
}

/// Decimal amount; accepts "$1,234.50" and scientific notation
pub fn coerce_decimal(cell: &Cell) -> Coerced<Decimal> {
    let value = match cell {
        Cell::Empty => return Coerced::Null,
        Cell::Int(i) => Some(Decimal::from(*i)),
        Cell::Float(f) => Decimal::from_f64(*f),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Coerced::Null;
            }
            parse_amount(s)
        }
        Cell::Bool(_) | Cell::DateTime(_) => None,
    };

    match value {
        Some(d) => Coerced::Value(d.normalize()),
        None => Coerced::Invalid,
    }
}

fn parse_amount(s: &str) -> Option<Decimal> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let cleaned: String = body
        .strip_prefix('$')
        .unwrap_or(body)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let parsed = Decimal::from_str(&cleaned)
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())?;

    Some(if negative { -parsed } else { parsed })
}

/// Boolean-like OPENED flag; a date means the store was open
pub fn coerce_flag(cell: &Cell) -> Coerced<bool> {
    match cell {
        Cell::Empty => Coerced::Null,
        Cell::Bool(b) => Coerced::Value(*b),
        Cell::Int(1) => Coerced::Value(true),
        Cell::Int(0) => Coerced::Value(false),
        Cell::Int(_) => Coerced::Invalid,
        Cell::Float(f) if *f == 1.0 => Coerced::Value(true),
        Cell::Float(f) if *f == 0.0 => Coerced::Value(false),
        Cell::Float(_) => Coerced::Invalid,
        Cell::DateTime(_) => Coerced::Value(true),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Coerced::Null;
            }
            match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "x" | "open" | "opened" => Coerced::Value(true),
                "false" | "f" | "no" | "n" | "0" | "closed" => Coerced::Value(false),
                _ if looks_like_date(s) => Coerced::Value(true),
                _ => Coerced::Invalid,
            }
        }
    }
}

fn looks_like_date(s: &str) -> bool {
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    let separators = s.chars().filter(|c| matches!(c, '-' | '/' | '.')).count();
    digits >= 4
        && separators >= 2
        && s.chars().all(|c| c.is_ascii_digit() || "-/. :T".contains(c))
}

/// Store location text, trimmed; numeric store codes are kept as text
pub fn coerce_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) | Cell::DateTime(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Int(i) => Some(i.to_string()),
        Cell::Float(f) => match integral_float(*f) {
            Coerced::Value(i) => Some(i.to_string()),
            _ => Some(f.to_string()),
        },
        Cell::Bool(b) => Some(b.to_string()),
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_period_forms_normalize_to_one() {
        for form in ["P1", "P01", "Period 1", "1", " p1 "] {
            assert_eq!(coerce_period(&text(form)), Coerced::Value(1), "form {:?}", form);
        }
        assert_eq!(coerce_period(&Cell::Int(1)), Coerced::Value(1));
        assert_eq!(coerce_period(&Cell::Float(1.0)), Coerced::Value(1));
    }

    #[test]
    fn test_non_integral_period_rejected_for_every_cell_kind() {
        assert_eq!(coerce_period(&text("1.5")), Coerced::Invalid);
        assert_eq!(coerce_period(&Cell::Float(1.5)), Coerced::Invalid);
        assert_eq!(coerce_period(&text("1.0")), Coerced::Value(1));
        assert_eq!(coerce_period(&text("01")), Coerced::Value(1));
    }

    #[test]
    fn test_period_without_digits_is_invalid() {
        assert_eq!(coerce_period(&text("Period")), Coerced::Invalid);
        assert_eq!(coerce_period(&Cell::Empty), Coerced::Null);
        assert_eq!(coerce_period(&Cell::Float(1.5)), Coerced::Invalid);
    }

    #[test]
    fn test_year_coercion() {
        assert_eq!(coerce_integer(&text("2024")), Coerced::Value(2024));
        assert_eq!(coerce_integer(&text("2024.0")), Coerced::Value(2024));
        assert_eq!(coerce_integer(&Cell::Float(2024.0)), Coerced::Value(2024));
        assert_eq!(coerce_integer(&text("FY24")), Coerced::Invalid);
        assert_eq!(coerce_integer(&text("  ")), Coerced::Null);
    }

    #[test]
    fn test_decimal_coercion() {
        assert_eq!(
            coerce_decimal(&text("$1,234.50")),
            Coerced::Value(Decimal::from_str("1234.5").unwrap())
        );
        assert_eq!(
            coerce_decimal(&text("-12.00")),
            Coerced::Value(Decimal::from(-12))
        );
        assert_eq!(
            coerce_decimal(&text("1e3")),
            Coerced::Value(Decimal::from(1000))
        );
        assert_eq!(
            coerce_decimal(&Cell::Float(0.1)),
            Coerced::Value(Decimal::from_str("0.1").unwrap())
        );
        assert_eq!(coerce_decimal(&text("n/a")), Coerced::Invalid);
        assert_eq!(coerce_decimal(&Cell::Empty), Coerced::Null);
    }

    #[test]
    fn test_decimal_is_normalized() {
        let a = coerce_decimal(&text("100.00")).value().unwrap();
        let b = coerce_decimal(&Cell::Int(100)).value().unwrap();
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_flag_coercion() {
        assert_eq!(coerce_flag(&text("Yes")), Coerced::Value(true));
        assert_eq!(coerce_flag(&text("N")), Coerced::Value(false));
        assert_eq!(coerce_flag(&Cell::Int(1)), Coerced::Value(true));
        assert_eq!(coerce_flag(&text("2021-03-15")), Coerced::Value(true));
        assert_eq!(coerce_flag(&Cell::DateTime("2021-03-15".into())), Coerced::Value(true));
        assert_eq!(coerce_flag(&text("maybe")), Coerced::Invalid);
        assert_eq!(coerce_flag(&Cell::Empty), Coerced::Null);
    }

    #[test]
    fn test_store_location_text() {
        assert_eq!(coerce_text(&text("  NYC-01 ")), Some("NYC-01".to_string()));
        assert_eq!(coerce_text(&Cell::Float(101.0)), Some("101".to_string()));
        assert_eq!(coerce_text(&text("   ")), None);
    }
}
