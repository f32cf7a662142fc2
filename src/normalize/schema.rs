//! Declared transaction schema: every field, its type, and how it is sourced
//! in single-record and batch mode.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// `user_id` assigned to a single transaction that does not carry one.
pub const DEFAULT_USER_ID: i64 = 1234;

/// First synthesized `user_id` for a batch without a `user_id` column.
pub const SYNTHETIC_USER_ID_BASE: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    /// Finite real; `non_negative` rejects values below zero.
    Float { non_negative: bool },
    /// Boolean carried as 0/1.
    Flag,
    Category { non_empty: bool },
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, FieldKind::Category { .. })
    }
}

/// Literal default, run through the same coercion as submitted values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn to_value(self) -> Value {
        match self {
            Literal::Int(v) => Value::from(v),
            Literal::Float(v) => Value::from(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Presence {
    Required,
    Default(Literal),
    /// Generated per row from [`SYNTHETIC_USER_ID_BASE`] when the whole batch lacks it.
    Synthesized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub single: Presence,
    pub batch: Presence,
}

pub const USER_ID: FieldSpec = FieldSpec {
    name: "user_id",
    kind: FieldKind::Integer,
    single: Presence::Default(Literal::Int(DEFAULT_USER_ID)),
    batch: Presence::Synthesized,
};
pub const AMOUNT: FieldSpec = FieldSpec {
    name: "amount",
    kind: FieldKind::Float { non_negative: true },
    single: Presence::Required,
    batch: Presence::Required,
};
pub const HOUR: FieldSpec = FieldSpec {
    name: "hour",
    kind: FieldKind::Integer,
    single: Presence::Default(Literal::Int(0)),
    batch: Presence::Default(Literal::Int(0)),
};
pub const DAY_OF_WEEK: FieldSpec = FieldSpec {
    name: "day_of_week",
    kind: FieldKind::Integer,
    single: Presence::Default(Literal::Int(0)),
    batch: Presence::Default(Literal::Int(0)),
};
pub const MERCHANT_CATEGORY: FieldSpec = FieldSpec {
    name: "merchant_category",
    kind: FieldKind::Category { non_empty: true },
    single: Presence::Required,
    batch: Presence::Required,
};
pub const DEVICE_TYPE: FieldSpec = FieldSpec {
    name: "device_type",
    kind: FieldKind::Category { non_empty: false },
    single: Presence::Required,
    batch: Presence::Required,
};
pub const DISTANCE_FROM_HOME_KM: FieldSpec = FieldSpec {
    name: "distance_from_home_km",
    kind: FieldKind::Float { non_negative: true },
    single: Presence::Default(Literal::Float(0.0)),
    batch: Presence::Required,
};
pub const IS_FOREIGN: FieldSpec = FieldSpec {
    name: "is_foreign",
    kind: FieldKind::Flag,
    single: Presence::Default(Literal::Int(0)),
    batch: Presence::Required,
};
pub const IS_HIGH_RISK_MERCHANT: FieldSpec = FieldSpec {
    name: "is_high_risk_merchant",
    kind: FieldKind::Flag,
    single: Presence::Default(Literal::Int(0)),
    batch: Presence::Required,
};
pub const HAS_HISTORY_OF_CHARGEBACK: FieldSpec = FieldSpec {
    name: "has_history_of_chargeback",
    kind: FieldKind::Flag,
    single: Presence::Default(Literal::Int(0)),
    batch: Presence::Required,
};

const FIELDS: [FieldSpec; 10] = [
    USER_ID,
    AMOUNT,
    HOUR,
    DAY_OF_WEEK,
    MERCHANT_CATEGORY,
    DEVICE_TYPE,
    DISTANCE_FROM_HOME_KM,
    IS_FOREIGN,
    IS_HIGH_RISK_MERCHANT,
    HAS_HISTORY_OF_CHARGEBACK,
];

/// The canonical field set, in the order fields are validated and reported.
pub struct TransactionSchema {
    fields: &'static [FieldSpec],
}

pub static SCHEMA: TransactionSchema = TransactionSchema { fields: &FIELDS };

impl TransactionSchema {
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn required_single(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields
            .iter()
            .filter(|f| f.single == Presence::Required)
    }

    pub fn required_batch(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.batch == Presence::Required)
    }

    /// Required single-mode fields whose key is absent from `record`.
    pub fn missing_single(&self, record: &Map<String, Value>) -> Vec<&'static str> {
        self.required_single()
            .filter(|f| !record.contains_key(f.name))
            .map(|f| f.name)
            .collect()
    }

    /// Required batch columns absent from every row.
    pub fn missing_batch(&self, columns: &BTreeSet<&str>) -> Vec<&'static str> {
        self.required_batch()
            .filter(|f| !columns.contains(f.name))
            .map(|f| f.name)
            .collect()
    }
}
