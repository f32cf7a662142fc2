//! Feature encoding: record → fixed-width f32 vector (one-hot categoricals, then scaled numerics).

use super::artifact::EncoderSpec;
use crate::normalize::TransactionRecord;
use ndarray::Array2;
use std::collections::HashMap;

struct OneHot {
    column: String,
    value: fn(&TransactionRecord) -> &str,
    offsets: HashMap<String, usize>,
}

struct Scaled {
    column: String,
    value: fn(&TransactionRecord) -> f64,
    mean: f64,
    scale: f64,
    offset: usize,
}

pub struct FeatureEncoder {
    categorical: Vec<OneHot>,
    numeric: Vec<Scaled>,
    width: usize,
}

impl FeatureEncoder {
    /// Resolves column names against the record schema. Errors describe the bad column.
    pub fn from_spec(spec: &EncoderSpec) -> Result<Self, String> {
        let mut width = 0;

        let mut categorical = Vec::with_capacity(spec.categorical.len());
        for col in &spec.categorical {
            let value = TransactionRecord::categorical_accessor(&col.column)
                .ok_or_else(|| format!("'{}' is not a categorical field", col.column))?;
            if col.categories.is_empty() {
                return Err(format!("categorical column '{}' has no categories", col.column));
            }
            let mut offsets = HashMap::with_capacity(col.categories.len());
            for category in &col.categories {
                if offsets.insert(category.clone(), width).is_some() {
                    return Err(format!(
                        "duplicate category '{}' in column '{}'",
                        category, col.column
                    ));
                }
                width += 1;
            }
            categorical.push(OneHot {
                column: col.column.clone(),
                value,
                offsets,
            });
        }

        let mut numeric = Vec::with_capacity(spec.numeric.len());
        for col in &spec.numeric {
            let value = TransactionRecord::numeric_accessor(&col.column)
                .ok_or_else(|| format!("'{}' is not a numeric field", col.column))?;
            if !col.mean.is_finite() || !col.scale.is_finite() {
                return Err(format!("non-finite scaling for column '{}'", col.column));
            }
            // zero-variance columns keep their centered value
            let scale = if col.scale == 0.0 { 1.0 } else { col.scale };
            numeric.push(Scaled {
                column: col.column.clone(),
                value,
                mean: col.mean,
                scale,
                offset: width,
            });
            width += 1;
        }

        if width == 0 {
            return Err("encoder produces no features".to_string());
        }

        Ok(Self {
            categorical,
            numeric,
            width,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Encoded column names, e.g. `merchant_category=fuel`, `amount`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.width];
        for col in &self.categorical {
            for (category, &offset) in &col.offsets {
                names[offset] = format!("{}={}", col.column, category);
            }
        }
        for col in &self.numeric {
            names[col.offset] = col.column.clone();
        }
        names
    }

    /// One row per record, in record order.
    pub fn encode_batch(&self, records: &[TransactionRecord]) -> Array2<f32> {
        let mut matrix = Array2::<f32>::zeros((records.len(), self.width));
        for (mut row, record) in matrix.rows_mut().into_iter().zip(records) {
            for col in &self.categorical {
                // unknown categories encode as all zeros
                if let Some(&offset) = col.offsets.get((col.value)(record)) {
                    row[offset] = 1.0;
                }
            }
            for col in &self.numeric {
                let scaled = ((col.value)(record) - col.mean) / col.scale;
                // saturate rather than overflow to infinity in f32
                row[col.offset] = scaled.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32;
            }
        }
        matrix
    }
}
