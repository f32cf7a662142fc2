//! Record normalization: raw JSON input → validated [`TransactionRecord`].

mod coerce;
mod error;
mod normalizer;
mod record;
pub mod schema;

pub use error::ValidationError;
pub(crate) use normalizer::batch_rows;
pub use normalizer::{normalize_batch, normalize_single};
pub use record::TransactionRecord;
pub use schema::{FieldKind, FieldSpec, Presence, TransactionSchema, SCHEMA};
