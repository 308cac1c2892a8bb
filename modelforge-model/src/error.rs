//! Error types for model operations.

use modelforge_schema::SchemaError;
use thiserror::Error;

use crate::codec::CodecError;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building, mutating or encoding models.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A contract failed to compile.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A payload failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A value could not be converted to a property's type.
    #[error("conversion error: {0}")]
    Conversion(#[from] modelforge_types::Error),

    /// The contract declares no property with this name.
    #[error("contract {contract} has no property {property}")]
    UnknownProperty { contract: String, property: String },

    /// The value's shape does not match the property's category.
    #[error("{contract}.{property} expects {expected}, got {actual}")]
    TypeMismatch {
        contract: String,
        property: String,
        expected: String,
        actual: String,
    },

    /// The public setter was used on an init-only property.
    #[error("{contract}.{property} is init-only")]
    ReadOnly { contract: String, property: String },

    /// The public getter was used on a write-only property.
    #[error("{contract}.{property} is write-only")]
    WriteOnly { contract: String, property: String },

    /// No definition is registered for a contract identity.
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// A nested model's contract cannot be stored in this property.
    #[error("{property} accepts {expected}, got an instance of {actual}")]
    IncompatibleContract {
        property: String,
        expected: String,
        actual: String,
    },

    /// A collection index was out of bounds.
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The registry that built this factory no longer exists.
    #[error("the registry owning contract {0} has been dropped")]
    RegistryDropped(String),

    /// A JSON document had the wrong shape.
    #[error("invalid JSON input: {0}")]
    InvalidJson(String),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}
