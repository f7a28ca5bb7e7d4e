use thiserror::Error;

pub type Result<T, E = TreemapError> = std::result::Result<T, E>;

/// Errors raised by the aggregation, hierarchy and layout stages.
///
/// None of these are retried internally. A caller that gets one keeps
/// whatever snapshot it already had.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreemapError {
    #[error("no records to lay out")]
    EmptyInput,

    #[error("unknown measure '{measure}'{}", suggestion_suffix(.suggestion))]
    InvalidMeasure {
        measure: String,
        suggestion: Option<String>,
    },

    #[error("invalid value for '{measure}' on {country_code}: {fault}")]
    InvalidValue {
        country_code: String,
        measure: String,
        fault: ValueFault,
    },

    #[error("total value under '{owner}' is {total}, refusing equal-area fallback")]
    DegenerateArea { owner: String, total: f64 },

    #[error("total of '{measure}' under '{owner}' is not finite")]
    ValueOverflow { owner: String, measure: String },
}

/// Why a single measure cell could not be used as a leaf value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueFault {
    #[error("missing")]
    Missing,
    #[error("'{0}' is not numeric")]
    NonNumeric(String),
    #[error("{0} is not finite")]
    NotFinite(f64),
    #[error("{0} is negative")]
    Negative(f64),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

/// Errors from reading a dataset off disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("line {line}: empty {field}")]
    EmptyField { line: u64, field: &'static str },

    #[error("line {line}: duplicate country_code '{country_code}'")]
    DuplicateId { line: u64, country_code: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {key} - {reason}")]
    Invalid { key: &'static str, reason: String },
}
