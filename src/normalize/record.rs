//! The canonical, fully typed transaction handed to the scoring engine.

use super::coerce;
use super::error::ValidationError;
use super::schema::{
    FieldKind, FieldSpec, AMOUNT, DAY_OF_WEEK, DEVICE_TYPE, DISTANCE_FROM_HOME_KM, HAS_HISTORY_OF_CHARGEBACK,
    HOUR, IS_FOREIGN, IS_HIGH_RISK_MERCHANT, MERCHANT_CATEGORY, USER_ID,
};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

/// All ten fields, always present and typed. Only the normalizer builds one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    user_id: i64,
    amount: f64,
    hour: i64,
    day_of_week: i64,
    merchant_category: String,
    device_type: String,
    distance_from_home_km: f64,
    is_foreign: u8,
    is_high_risk_merchant: u8,
    has_history_of_chargeback: u8,
}

/// Source of raw field values for one record (a single request body or one batch row).
pub(crate) trait FieldReader {
    /// Raw value after presence/default resolution. `Value::Null` when absent without default.
    fn raw(&self, spec: &'static FieldSpec) -> Result<Cow<'_, Value>, ValidationError>;

    fn invalid(&self, spec: &'static FieldSpec) -> ValidationError;
}

impl TransactionRecord {
    /// Reads fields in schema order; the first failure wins.
    pub(crate) fn read(reader: &impl FieldReader) -> Result<Self, ValidationError> {
        Ok(Self {
            user_id: read_integer(reader, &USER_ID)?,
            amount: read_float(reader, &AMOUNT)?,
            hour: read_integer(reader, &HOUR)?,
            day_of_week: read_integer(reader, &DAY_OF_WEEK)?,
            merchant_category: read_text(reader, &MERCHANT_CATEGORY)?,
            device_type: read_text(reader, &DEVICE_TYPE)?,
            distance_from_home_km: read_float(reader, &DISTANCE_FROM_HOME_KM)?,
            is_foreign: read_flag(reader, &IS_FOREIGN)?,
            is_high_risk_merchant: read_flag(reader, &IS_HIGH_RISK_MERCHANT)?,
            has_history_of_chargeback: read_flag(reader, &HAS_HISTORY_OF_CHARGEBACK)?,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn hour(&self) -> i64 {
        self.hour
    }

    pub fn day_of_week(&self) -> i64 {
        self.day_of_week
    }

    pub fn merchant_category(&self) -> &str {
        &self.merchant_category
    }

    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn distance_from_home_km(&self) -> f64 {
        self.distance_from_home_km
    }

    pub fn is_foreign(&self) -> u8 {
        self.is_foreign
    }

    pub fn is_high_risk_merchant(&self) -> u8 {
        self.is_high_risk_merchant
    }

    pub fn has_history_of_chargeback(&self) -> u8 {
        self.has_history_of_chargeback
    }

    /// Accessor for a numeric field by name, resolved once by the feature encoder.
    pub fn numeric_accessor(field: &str) -> Option<fn(&TransactionRecord) -> f64> {
        let accessor: fn(&TransactionRecord) -> f64 = match field {
            "user_id" => |r| r.user_id as f64,
            "amount" => TransactionRecord::amount,
            "hour" => |r| r.hour as f64,
            "day_of_week" => |r| r.day_of_week as f64,
            "distance_from_home_km" => TransactionRecord::distance_from_home_km,
            "is_foreign" => |r| f64::from(r.is_foreign),
            "is_high_risk_merchant" => |r| f64::from(r.is_high_risk_merchant),
            "has_history_of_chargeback" => |r| f64::from(r.has_history_of_chargeback),
            _ => return None,
        };
        Some(accessor)
    }

    /// Accessor for a categorical field by name.
    pub fn categorical_accessor(field: &str) -> Option<fn(&TransactionRecord) -> &str> {
        match field {
            "merchant_category" => Some(TransactionRecord::merchant_category),
            "device_type" => Some(TransactionRecord::device_type),
            _ => None,
        }
    }
}

fn read_integer(reader: &impl FieldReader, spec: &'static FieldSpec) -> Result<i64, ValidationError> {
    coerce::integer(&*reader.raw(spec)?).ok_or_else(|| reader.invalid(spec))
}

fn read_float(reader: &impl FieldReader, spec: &'static FieldSpec) -> Result<f64, ValidationError> {
    let non_negative = matches!(spec.kind, FieldKind::Float { non_negative: true });
    coerce::bounded_float(&*reader.raw(spec)?, non_negative).ok_or_else(|| reader.invalid(spec))
}

fn read_flag(reader: &impl FieldReader, spec: &'static FieldSpec) -> Result<u8, ValidationError> {
    coerce::flag(&*reader.raw(spec)?).ok_or_else(|| reader.invalid(spec))
}

fn read_text(reader: &impl FieldReader, spec: &'static FieldSpec) -> Result<String, ValidationError> {
    let non_empty = matches!(spec.kind, FieldKind::Category { non_empty: true });
    coerce::text(&*reader.raw(spec)?, non_empty).ok_or_else(|| reader.invalid(spec))
}
