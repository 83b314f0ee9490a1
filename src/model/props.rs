//! Typed property values attached to a molecule.
//!
//! Native tag stores only hold strings. [`PropValue`] keeps the typed value a caller set so
//! it can be read back unchanged, while its `Display` form is what reaches the native
//! store and the SD data items.

use std::fmt;

/// Typed value of a molecule property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Integer(i64),
    Float(f64),
    /// Numeric array; rendered comma-joined.
    Array(Vec<f64>),
}

impl PropValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric view of the value; text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Text(text) => text.trim().parse().ok(),
            PropValue::Integer(value) => Some(*value as f64),
            PropValue::Float(value) => Some(*value),
            PropValue::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            PropValue::Array(values) => Some(values),
            _ => None,
        }
    }
}

/// Renders a float the way property values are written: integral values keep a trailing
/// `.0`, everything else uses the shortest round-trip form.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Text(text) => f.write_str(text),
            PropValue::Integer(value) => write!(f, "{value}"),
            PropValue::Float(value) => f.write_str(&format_float(*value)),
            PropValue::Array(values) => {
                let joined: Vec<String> = values.iter().map(|v| format_float(*v)).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Integer(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Integer(i64::from(value))
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Integer(value as i64)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<Vec<f64>> for PropValue {
    fn from(value: Vec<f64>) -> Self {
        PropValue::Array(value)
    }
}

impl From<&[f64]> for PropValue {
    fn from(value: &[f64]) -> Self {
        PropValue::Array(value.to_vec())
    }
}
