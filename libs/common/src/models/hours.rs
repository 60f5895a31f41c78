//! Decimal hour amounts
//!
//! The backend serializes decimal fields (`duracion_horas`,
//! `horas_reportadas`, hour goals) as strings such as `"2.50"`, but accepts
//! plain numbers on input. `HoursAmount` reads either shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

/// Non-negative amount of hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct HoursAmount(f64);

impl HoursAmount {
    pub fn new(value: f64) -> Self {
        HoursAmount(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Parse a user or backend supplied amount, accepting a decimal comma
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().replace(',', ".");
        if normalized.is_empty() {
            return None;
        }
        normalized
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(HoursAmount)
    }
}

impl fmt::Display for HoursAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Trim only after rounding
        let text = format!("{:.2}", self.0);
        let text = text.trim_end_matches('0').trim_end_matches('.');
        f.write_str(if text == "-0" { "0" } else { text })
    }
}

impl std::ops::Add for HoursAmount {
    type Output = HoursAmount;

    fn add(self, rhs: HoursAmount) -> HoursAmount {
        HoursAmount(self.0 + rhs.0)
    }
}

impl std::iter::Sum for HoursAmount {
    fn sum<I: Iterator<Item = HoursAmount>>(iter: I) -> Self {
        iter.fold(HoursAmount::default(), |acc, h| acc + h)
    }
}

impl Serialize for HoursAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for HoursAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HoursVisitor;

        impl de::Visitor<'_> for HoursVisitor {
            type Value = HoursAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal number or numeric string")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<HoursAmount, E> {
                Ok(HoursAmount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<HoursAmount, E> {
                Ok(HoursAmount(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<HoursAmount, E> {
                Ok(HoursAmount(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HoursAmount, E> {
                HoursAmount::parse(v).ok_or_else(|| E::custom(format!("invalid hours amount: {v}")))
            }
        }

        deserializer.deserialize_any(HoursVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_string_and_number() {
        let from_str: HoursAmount = serde_json::from_str("\"2.50\"").unwrap();
        let from_num: HoursAmount = serde_json::from_str("3").unwrap();
        assert_eq!(from_str.value(), 2.5);
        assert_eq!(from_num.value(), 3.0);
    }

    #[test]
    fn test_decimal_comma_and_garbage() {
        assert_eq!(HoursAmount::parse("1,75"), Some(HoursAmount::new(1.75)));
        assert_eq!(HoursAmount::parse("abc"), None);
        assert_eq!(HoursAmount::parse(""), None);
    }

    #[test]
    fn test_display_and_serialize() {
        assert_eq!(HoursAmount::new(4.0).to_string(), "4");
        assert_eq!(HoursAmount::new(2.5).to_string(), "2.5");
        assert_eq!(serde_json::to_string(&HoursAmount::new(2.5)).unwrap(), "\"2.50\"");
    }

    #[test]
    fn test_display_rounds_to_whole_hours() {
        assert_eq!(HoursAmount::new(2.999).to_string(), "3");
        assert_eq!(HoursAmount::new(10.0).to_string(), "10");
        assert_eq!(HoursAmount::new(0.0).to_string(), "0");
        assert_eq!(HoursAmount::new(1.25).to_string(), "1.25");

        let total: HoursAmount = [0.1, 0.2, 0.3, 0.4, 2.999]
            .into_iter()
            .map(HoursAmount::new)
            .sum();
        assert_eq!(total.to_string(), "4");
    }
}
