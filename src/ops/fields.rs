use crate::error::Error;
use crate::model::mol::Mol;
use crate::model::props::PropValue;
use crate::stream::Compute;
use std::collections::HashMap;

/// Renders numeric array properties as compact comma-joined text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatArrays {
    pub default_precision: usize,
    /// Precision overrides keyed by property name.
    pub field_precision: HashMap<String, usize>,
}

impl FormatArrays {
    pub fn new(default_precision: usize) -> Self {
        Self {
            default_precision,
            field_precision: HashMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, precision: usize) -> Self {
        self.field_precision.insert(field.into(), precision);
        self
    }

    fn precision_for(&self, field: &str) -> usize {
        self.field_precision
            .get(field)
            .copied()
            .unwrap_or(self.default_precision)
    }
}

/// Rewrites every `Array` property of `mol` as text with at most the configured number of
/// decimals, trailing zeros trimmed.
pub fn format_arrays(mol: &mut Mol, options: &FormatArrays) {
    let arrays: Vec<(String, Vec<f64>)> = mol
        .items()
        .into_iter()
        .filter_map(|(key, value)| match value {
            PropValue::Array(values) => Some((key, values)),
            _ => None,
        })
        .collect();
    for (key, values) in arrays {
        let precision = options.precision_for(&key);
        let text: Vec<String> = values
            .iter()
            .map(|v| format_fixed(*v, precision))
            .collect();
        mol.set(&key, text.join(","));
    }
}

/// Rounds to `precision` places and drops trailing zeros, so `2.0` prints as `2` (no
/// trailing decimal point) and `-0` as `0`.
fn format_fixed(value: f64, precision: usize) -> String {
    let text = format!("{value:.precision$}");
    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

impl Compute<Mol> for FormatArrays {
    type Output = Mol;

    fn compute(&mut self, mut mol: Mol) -> Result<Option<Mol>, Error> {
        format_arrays(&mut mol, self);
        Ok(Some(mol))
    }
}

/// Turns comma-separated numeric text properties into `Array` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseArrays {
    pub fields: Vec<String>,
}

impl ParseArrays {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parses each named field that is present and not already an array.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] when a field holds text that is not a comma-separated
/// list of numbers.
pub fn parse_arrays(mol: &mut Mol, fields: &[String]) -> Result<(), Error> {
    for field in fields {
        let Ok(value) = mol.get(field) else {
            continue;
        };
        if value.as_array().is_some() {
            continue;
        }
        let text = value.to_string();
        let values = if text.trim().is_empty() {
            Vec::new()
        } else {
            text.split(',')
                .map(|part| part.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Error::invalid_value(field.as_str(), text.as_str(), e.to_string()))?
        };
        mol.set(field, values);
    }
    Ok(())
}

impl Compute<Mol> for ParseArrays {
    type Output = Mol;

    fn compute(&mut self, mut mol: Mol) -> Result<Option<Mol>, Error> {
        parse_arrays(&mut mol, &self.fields)?;
        Ok(Some(mol))
    }
}

/// Stores the atom count of each molecule under a property tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountAtoms {
    pub tag: String,
}

impl CountAtoms {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl Compute<Mol> for CountAtoms {
    type Output = Mol;

    fn compute(&mut self, mut mol: Mol) -> Result<Option<Mol>, Error> {
        let count = mol.num_atoms();
        mol.set(&self.tag, count);
        Ok(Some(mol))
    }
}
