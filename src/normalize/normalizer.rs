//! Raw request payloads → canonical records.
//!
//! Single mode is lenient: optional fields fall back to documented defaults.
//! Batch mode is strict: every required column must be present verbatim and
//! values are checked column by column before any record is assembled.

use super::coerce;
use super::error::{json_type, ValidationError};
use super::record::{FieldReader, TransactionRecord};
use super::schema::{FieldSpec, Presence, SCHEMA, SYNTHETIC_USER_ID_BASE};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Validate, default and coerce one transaction object.
pub fn normalize_single(raw: &Value) -> Result<TransactionRecord, ValidationError> {
    let record = match raw {
        Value::Null => return Err(ValidationError::EmptyInput),
        Value::Object(map) if map.is_empty() => return Err(ValidationError::EmptyInput),
        Value::Object(map) => map,
        other => {
            return Err(ValidationError::WrongShape {
                expected: "a transaction object",
                found: json_type(other),
            })
        }
    };

    let missing = SCHEMA.missing_single(record);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields { fields: missing });
    }

    TransactionRecord::read(&SingleReader { record })
}

/// Validate and coerce a list of transaction objects. Output order matches input order.
pub fn normalize_batch(raw: &Value) -> Result<Vec<TransactionRecord>, ValidationError> {
    let rows = batch_rows(raw)?;

    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();
    let missing = SCHEMA.missing_batch(&columns);
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns { columns: missing });
    }

    let readers: Vec<BatchRowReader<'_>> = rows
        .iter()
        .enumerate()
        .map(|(index, row)| BatchRowReader {
            row,
            index,
            columns: &columns,
        })
        .collect();

    for spec in SCHEMA.fields() {
        for reader in &readers {
            if !coerce::accepts(spec.kind, &*reader.raw(spec)?) {
                return Err(reader.invalid(spec));
            }
        }
    }

    readers.iter().map(TransactionRecord::read).collect()
}

/// Structural checks that precede any column work.
pub(crate) fn batch_rows(raw: &Value) -> Result<Vec<&Map<String, Value>>, ValidationError> {
    let items = match raw {
        Value::Null => return Err(ValidationError::EmptyInput),
        Value::Object(map) if map.is_empty() => return Err(ValidationError::EmptyInput),
        Value::Array(items) => items,
        other => {
            return Err(ValidationError::WrongShape {
                expected: "a list of transactions",
                found: json_type(other),
            })
        }
    };
    if items.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(ValidationError::RecordNotObject {
                index,
                found: json_type(other),
            }),
        })
        .collect()
}

struct SingleReader<'a> {
    record: &'a Map<String, Value>,
}

impl FieldReader for SingleReader<'_> {
    fn raw(&self, spec: &'static FieldSpec) -> Result<Cow<'_, Value>, ValidationError> {
        let value = self.record.get(spec.name);
        match (value, spec.single) {
            // An explicit null on a required field is a coercion failure, not a missing field.
            (Some(v), Presence::Required) => Ok(Cow::Borrowed(v)),
            (Some(v), _) if !v.is_null() => Ok(Cow::Borrowed(v)),
            (_, Presence::Default(literal)) => Ok(Cow::Owned(literal.to_value())),
            (_, _) => Err(ValidationError::MissingFields {
                fields: vec![spec.name],
            }),
        }
    }

    fn invalid(&self, spec: &'static FieldSpec) -> ValidationError {
        invalid(spec, None)
    }
}

struct BatchRowReader<'a> {
    row: &'a Map<String, Value>,
    index: usize,
    columns: &'a BTreeSet<&'a str>,
}

impl FieldReader for BatchRowReader<'_> {
    fn raw(&self, spec: &'static FieldSpec) -> Result<Cow<'_, Value>, ValidationError> {
        if let Some(v) = self.row.get(spec.name) {
            return Ok(Cow::Borrowed(v));
        }
        let column_absent = !self.columns.contains(spec.name);
        let value = match spec.batch {
            Presence::Synthesized if column_absent => {
                Value::from(SYNTHETIC_USER_ID_BASE + self.index as i64)
            }
            Presence::Default(literal) if column_absent => literal.to_value(),
            // The column exists in other rows; a hole in it is not defaulted.
            _ => Value::Null,
        };
        Ok(Cow::Owned(value))
    }

    fn invalid(&self, spec: &'static FieldSpec) -> ValidationError {
        invalid(spec, Some(self.index))
    }
}

fn invalid(spec: &'static FieldSpec, row: Option<usize>) -> ValidationError {
    if spec.kind.is_numeric() {
        ValidationError::InvalidNumeric {
            field: spec.name,
            row,
        }
    } else {
        ValidationError::InvalidCategorical {
            field: spec.name,
            row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_rows_rejects_map_of_columns() {
        let err = batch_rows(&json!({"amount": [5, 6]})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongShape {
                expected: "a list of transactions",
                found: "an object"
            }
        );
    }

    #[test]
    fn batch_rows_distinguishes_empty_inputs() {
        assert_eq!(batch_rows(&json!(null)).unwrap_err(), ValidationError::EmptyInput);
        assert_eq!(batch_rows(&json!({})).unwrap_err(), ValidationError::EmptyInput);
        assert_eq!(batch_rows(&json!([])).unwrap_err(), ValidationError::EmptyBatch);
    }

    #[test]
    fn batch_rows_rejects_scalar_items() {
        let err = batch_rows(&json!([{"amount": 1}, 7])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RecordNotObject {
                index: 1,
                found: "a number"
            }
        );
    }
}
