//! Core value types for modelforge.
//!
//! This crate defines the schema-agnostic building blocks every other
//! modelforge crate depends on:
//! - [`Value`] — a dynamically typed scalar slot value
//! - [`PrimitiveKind`] / [`ValueType`] — the shapes a scalar value can take
//! - [`Timestamp`] — microsecond-precision instant with a fixed 8-byte wire form
//! - [`TrackingId`] — process-unique identifier for tracked edits (UUID v7)
//! - [`TypeConverter`] — the pluggable conversion service used for coercion
//!
//! Model-valued properties (nested instances and collections) are not
//! represented here; they live alongside the instance type in `modelforge-model`.

pub mod convert;
mod ids;
mod timestamp;
mod value;

pub use convert::{DefaultConverter, TypeConverter, coerce, try_cast};
pub use ids::TrackingId;
pub use timestamp::Timestamp;
pub use value::{PrimitiveKind, Value, ValueType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in value operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot convert {from} to {to}")]
    Conversion { from: String, to: String },

    #[error("invalid {target} literal: {input:?}")]
    Parse { target: String, input: String },

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn conversion(value: &Value, target: ValueType) -> Self {
        Self::Conversion {
            from: value.type_name().to_string(),
            to: target.to_string(),
        }
    }

    pub(crate) fn parse(target: ValueType, input: &str) -> Self {
        Self::Parse {
            target: target.to_string(),
            input: input.to_string(),
        }
    }
}
