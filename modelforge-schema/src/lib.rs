//! Contract definitions and compiled schema descriptors.
//!
//! Defines the schema layer every model instance is built from:
//! - [`ContractDef`] / [`PropertyDef`] — the declared shape of a model, loadable from JSON
//! - [`PropertyCategory`] — the wire/diff category of a property, parsed from its type name
//! - [`SchemaDescriptor`] / [`PropertyDescriptor`] — the validated, immutable compiled form
//! - [`SchemaError`] — why a contract was rejected
//!
//! Descriptors are pure data. Caching and instance construction live in
//! `modelforge-model`.

mod category;
mod contract;
mod descriptor;
mod error;

pub use category::PropertyCategory;
pub use contract::{ContractDef, PropertyDef};
pub use descriptor::{OWNER_PROPERTY, OWNER_WIRE_ORDER, PropertyDescriptor, SchemaDescriptor};
pub use error::{SchemaError, SchemaResult};
