use crate::error::Error;
use serde::{Deserialize, Serialize};

/// A capability to turn numbers into display text and back.
///
/// Any `Fn(f64) -> String` is a `NumberFormat`, parsing with the standard
/// `f64` syntax:
///
/// ```
/// use keycalc::Engine;
///
/// let mut engine = Engine::with_formatter(|x: f64| format!("{:.1}", x));
/// engine.set_operand(2.0);
/// assert_eq!(engine.evaluate().description, "2.0");
/// ```
pub trait NumberFormat {
    /// Render `value` for a description or a display
    fn format(&self, value: f64) -> String;

    /// Read back a number typed on the keypad
    fn parse(&self, text: &str) -> Option<f64> {
        text.trim().parse().ok()
    }
}

impl<F> NumberFormat for F
where
    F: Fn(f64) -> String,
{
    fn format(&self, value: f64) -> String {
        self(value)
    }
}

/// Fixed-point number formatter, without grouping separators.
///
/// # Examples
///
/// ```
/// use keycalc::{NumberFormat, NumberFormatter};
///
/// let formatter = NumberFormatter::default();
/// assert_eq!(formatter.format(2.0), "2");
/// assert_eq!(formatter.format(1.0 / 3.0), "0.333333");
/// assert_eq!(formatter.parse("0.5"), Some(0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormatter {
    /// Digits after the separator are rounded to this count
    pub maximum_fraction_digits: usize,
    /// Trailing zeros are kept up to this count
    pub minimum_fraction_digits: usize,
    /// Integer part is padded with leading zeros up to this count
    pub minimum_integer_digits: usize,
    /// Character between the integer and the fraction parts
    pub decimal_separator: char,
}

impl Default for NumberFormatter {
    fn default() -> Self {
        Self {
            maximum_fraction_digits: 6,
            minimum_fraction_digits: 0,
            minimum_integer_digits: 1,
            decimal_separator: '.',
        }
    }
}

impl NumberFormatter {
    /// Load a formatter from TOML text. Missing keys keep their default.
    ///
    /// ```
    /// use keycalc::{NumberFormat, NumberFormatter};
    ///
    /// let formatter = NumberFormatter::from_toml("decimal_separator = ','").unwrap();
    /// assert_eq!(formatter.format(2.5), "2,5");
    /// assert!(NumberFormatter::from_toml("maximum_fraction_digits = 'six'").is_err());
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let formatter: Self = toml::from_str(text)?;
        if formatter.minimum_fraction_digits > formatter.maximum_fraction_digits {
            return Err(Error::Config(format!(
                "minimum_fraction_digits ({}) exceeds maximum_fraction_digits ({})",
                formatter.minimum_fraction_digits, formatter.maximum_fraction_digits
            )));
        }
        Ok(formatter)
    }
}

impl NumberFormat for NumberFormatter {
    fn format(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".into();
        }
        if value.is_infinite() {
            return if value > 0.0 { "∞".into() } else { "-∞".into() };
        }

        let fixed = format!("{:.*}", self.maximum_fraction_digits, value.abs());
        let (integer, fraction) = match fixed.find('.') {
            Some(dot) => (&fixed[..dot], &fixed[dot + 1..]),
            None => (&fixed[..], ""),
        };

        let mut keep = fraction.trim_end_matches('0').len();
        keep = keep.max(self.minimum_fraction_digits.min(fraction.len()));
        let fraction = &fraction[..keep];

        let is_zero = integer.bytes().all(|b| b == b'0') && fraction.bytes().all(|b| b == b'0');
        let mut output = String::with_capacity(fixed.len() + 2);
        if value.is_sign_negative() && !is_zero {
            output.push('-');
        }
        for _ in integer.len()..self.minimum_integer_digits {
            output.push('0');
        }
        // "0" alone is dropped when no integer digit is required
        if !(self.minimum_integer_digits == 0 && integer == "0" && !fraction.is_empty()) {
            output.push_str(integer);
        }
        if !fraction.is_empty() {
            output.push(self.decimal_separator);
            output.push_str(fraction);
        }
        output
    }

    fn parse(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let normalized: String = text
            .chars()
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect();
        normalized.parse().ok()
    }
}
