//! Display formatting for variable values.
//!
//! Widgets render numbers through a small format language compatible with
//! the common d3-format specifiers:
//!
//! ```text
//! [,][.precision][type]
//! ```
//!
//! | type | meaning                              | default precision |
//! |------|--------------------------------------|-------------------|
//! | `f`  | fixed point                          | 6                 |
//! | `d`  | rounded integer (precision ignored)  | -                 |
//! | `%`  | multiply by 100, fixed, append `%`   | 6                 |
//! | `e`  | exponent notation                    | 6                 |
//! | `s` or none | plain number (precision ignored) | -             |
//!
//! A leading `,` groups thousands. Strings render as-is, booleans as
//! `true`/`false`, and null as an empty string.

use std::str::FromStr;

use thiserror::Error;

use crate::variables::Value;
use crate::variables::types::display_number;

/// Specifier used when neither the widget nor the variable names one.
pub const DEFAULT_FORMAT: &str = ".1f";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid format specifier '{0}'")]
    InvalidSpec(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Fixed,
    Integer,
    Percent,
    Exponent,
    Plain,
}

/// A parsed format specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    pub grouping: bool,
    pub precision: Option<usize>,
    pub kind: FormatKind,
}

impl FromStr for FormatSpec {
    type Err = FormatError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatError::InvalidSpec(spec.to_string());

        let (grouping, rest) = match spec.strip_prefix(',') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };

        let (precision, rest) = match rest.strip_prefix('.') {
            Some(after_dot) => {
                let digits = after_dot.chars().take_while(char::is_ascii_digit).count();
                if digits == 0 {
                    return Err(invalid());
                }
                let precision = after_dot[..digits].parse().map_err(|_| invalid())?;
                (Some(precision), &after_dot[digits..])
            }
            None => (None, rest),
        };

        let kind = match rest {
            "f" => FormatKind::Fixed,
            "d" => FormatKind::Integer,
            "%" => FormatKind::Percent,
            "e" => FormatKind::Exponent,
            "s" | "" => FormatKind::Plain,
            _ => return Err(invalid()),
        };

        Ok(Self { grouping, precision, kind })
    }
}

impl FormatSpec {
    /// Render a number according to this specifier.
    #[must_use]
    pub fn format_number(&self, n: f64) -> String {
        if !n.is_finite() {
            return n.to_string();
        }
        let precision = self.precision.unwrap_or(6);
        let body = match self.kind {
            FormatKind::Fixed => format!("{n:.precision$}"),
            FormatKind::Integer => format!("{:.0}", n.round()),
            FormatKind::Percent => format!("{:.precision$}%", n * 100.0),
            FormatKind::Exponent => exponent(n, precision),
            FormatKind::Plain => display_number(n),
        };
        if self.grouping { group_thousands(&body) } else { body }
    }
}

fn exponent(n: f64, precision: usize) -> String {
    let raw = format!("{n:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => raw,
    }
}

/// Insert `,` separators into the integer digits of a rendered number.
fn group_thousands(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let int_len = unsigned.chars().take_while(char::is_ascii_digit).count();
    let (int_part, tail) = unsigned.split_at(int_len);

    let mut grouped = String::with_capacity(rendered.len() + int_len / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}{tail}")
}

/// Format `value` with the specifier `spec`.
pub fn format_value(value: &Value, spec: &str) -> Result<String, FormatError> {
    match value {
        Value::Number(n) => Ok(spec.parse::<FormatSpec>()?.format_number(*n)),
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
    }
}

/// Pick the specifier a widget should use: its own, else the variable's,
/// else `fallback`.
#[must_use]
pub fn resolve_spec<'a>(
    widget: Option<&'a str>,
    variable: Option<&'a str>,
    fallback: &'a str,
) -> &'a str {
    widget.filter(|s| !s.is_empty()).or(variable.filter(|s| !s.is_empty())).unwrap_or(fallback)
}
