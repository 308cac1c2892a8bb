//! Error types for contract compilation.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Reasons a contract cannot be compiled into a descriptor.
///
/// Schema errors are never cached: a corrected contract with the same
/// identity can be submitted again.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The contract has no identity.
    #[error("contract identity must not be empty")]
    EmptyIdentity,

    /// A property name is empty or contains path separators.
    #[error("contract {contract}: invalid property name {name:?}")]
    InvalidPropertyName { contract: String, name: String },

    /// Two properties share a name.
    #[error("contract {contract}: duplicate property {property}")]
    DuplicateProperty { contract: String, property: String },

    /// Two properties share a serialization order index.
    #[error("contract {contract}: properties {first} and {second} share serialization order {order}")]
    DuplicateOrder {
        contract: String,
        order: u32,
        first: String,
        second: String,
    },

    /// A property's declared type is not a supported category.
    #[error("contract {contract}: property {property} has unsupported type {ty:?}")]
    UnsupportedType {
        contract: String,
        property: String,
        ty: String,
    },

    /// The designated key names no property.
    #[error("contract {contract}: key property {property} is not declared")]
    UnknownKey { contract: String, property: String },

    /// The designated key cannot round-trip through a string.
    #[error("contract {contract}: key property {property} of type {ty} is not string-convertible")]
    KeyNotConvertible {
        contract: String,
        property: String,
        ty: String,
    },

    /// The designated owner names no property.
    #[error("contract {contract}: owner property {property} is not declared")]
    UnknownOwner { contract: String, property: String },

    /// The owner property is neither a string nor a model reference.
    #[error("contract {contract}: owner property {property} of type {ty} cannot hold an owner")]
    InvalidOwner {
        contract: String,
        property: String,
        ty: String,
    },

    /// A contract document could not be parsed.
    #[error("contract document error: {0}")]
    Json(#[from] serde_json::Error),
}
