use thiserror::Error;

/// Client-attributable input problems. Always detected before the model runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No data provided")]
    EmptyInput,

    #[error("Invalid JSON payload")]
    InvalidJson,

    #[error("Expected {expected}, got {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Expected a list of transactions, but record {index} is {found}")]
    RecordNotObject { index: usize, found: &'static str },

    #[error("Empty transaction list provided")]
    EmptyBatch,

    #[error("Missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("Missing columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<&'static str> },

    #[error("Invalid numeric value {}", location(.field, .row))]
    InvalidNumeric {
        field: &'static str,
        row: Option<usize>,
    },

    #[error("Invalid category value {}", location(.field, .row))]
    InvalidCategorical {
        field: &'static str,
        row: Option<usize>,
    },
}

impl ValidationError {
    /// The field or column the error is about, when there is exactly one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::InvalidNumeric { field, .. }
            | ValidationError::InvalidCategorical { field, .. } => Some(*field),
            _ => None,
        }
    }
}

fn location(field: &str, row: &Option<usize>) -> String {
    match row {
        Some(row) => format!("in column: {field} (row {row})"),
        None => format!("for field: {field}"),
    }
}

pub(crate) fn json_type(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
