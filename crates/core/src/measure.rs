use serde::{Deserialize, Serialize};

use crate::error::{Result, TreemapError, ValueFault};
use crate::model::Record;
use crate::search;

/// The measures a user may select. Declared up front so an unknown name is
/// rejected before any record is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasureSet(Vec<String>);

impl MeasureSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Self(out)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|m| m == name)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Ok(());
        }
        Err(TreemapError::InvalidMeasure {
            measure: name.to_string(),
            suggestion: search::suggest(name, self.0.iter().map(String::as_str)).map(str::to_owned),
        })
    }
}

impl Default for MeasureSet {
    fn default() -> Self {
        Self::new(["fertility_rate", "life_expectancy", "population"])
    }
}

/// A measure-selector event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureSelected(pub String);

impl MeasureSelected {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What to do with a leaf value that is missing, non-numeric or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePolicy {
    /// Fail the recompute with `InvalidValue`.
    #[default]
    Strict,
    /// Coerce to zero and log a warning.
    Lenient,
}

/// Typed replacement for `record[measure]`.
pub trait ValueAccessor {
    fn value(&self, record: &Record, measure: &str) -> std::result::Result<f64, ValueFault>;
}

impl<F> ValueAccessor for F
where
    F: Fn(&Record, &str) -> std::result::Result<f64, ValueFault>,
{
    fn value(&self, record: &Record, measure: &str) -> std::result::Result<f64, ValueFault> {
        self(record, measure)
    }
}

/// Parses the raw cell text of the named column.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccessor;

impl ValueAccessor for FieldAccessor {
    fn value(&self, record: &Record, measure: &str) -> std::result::Result<f64, ValueFault> {
        let raw = record.raw(measure).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Err(ValueFault::Missing);
        }
        let v: f64 = raw
            .parse()
            .map_err(|_| ValueFault::NonNumeric(raw.to_string()))?;
        if !v.is_finite() {
            return Err(ValueFault::NotFinite(v));
        }
        if v < 0.0 {
            return Err(ValueFault::Negative(v));
        }
        Ok(v)
    }
}
