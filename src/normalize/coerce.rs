//! Lenient conversions from untyped JSON values to typed record fields.

use super::schema::FieldKind;
use serde_json::Value;

/// Numbers, numeric strings (`"50.0"`, `" 1e3 "`) and booleans. Non-finite values are rejected.
pub(crate) fn float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// [`float`], additionally rejecting negatives when `non_negative`.
pub(crate) fn bounded_float(value: &Value, non_negative: bool) -> Option<f64> {
    float(value).filter(|f| !non_negative || *f >= 0.0)
}

/// Integral numbers, integral numeric strings and booleans.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            if n.is_u64() {
                None
            } else {
                n.as_f64().and_then(integral)
            }
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Booleans and the values 0/1 in any accepted integer form.
pub(crate) fn flag(value: &Value) -> Option<u8> {
    match integer(value)? {
        0 => Some(0),
        1 => Some(1),
        _ => None,
    }
}

pub(crate) fn text(value: &Value, non_empty: bool) -> Option<String> {
    match value {
        Value::String(s) if non_empty && s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Whether `value` coerces under `kind`.
pub(crate) fn accepts(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Integer => integer(value).is_some(),
        FieldKind::Float { non_negative } => bounded_float(value, non_negative).is_some(),
        FieldKind::Flag => flag(value).is_some(),
        FieldKind::Category { non_empty } => text(value, non_empty).is_some(),
    }
}

fn integral(f: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    if f.is_finite() && f.fract() == 0.0 && f >= -LIMIT && f < LIMIT {
        Some(f as i64)
    } else {
        None
    }
}
