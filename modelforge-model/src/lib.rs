//! Schema-driven model instances.
//!
//! Turns a compiled [`SchemaDescriptor`](modelforge_schema::SchemaDescriptor)
//! into live models:
//! - [`ModelRegistry`] — builds each contract once and caches its factory
//! - [`ModelFactory`] — creates instances, zero-valued or from raw maps
//! - [`Instance`] — typed property slots with before/after change events
//! - [`ModelCollection`] — observable model sequences with structured events
//! - the binary codec ([`Instance::to_bytes`], [`Instance::from_bytes`])
//! - the structural differencer ([`Instance::compare`])
//! - [`TrackedModel`] — original/current pairs for "changed since load"
//!
//! ```
//! use modelforge_model::ModelRegistry;
//! use modelforge_schema::{ContractDef, PropertyDef};
//! use modelforge_types::PrimitiveKind;
//!
//! let registry = ModelRegistry::default();
//! let person = ContractDef::new("Person")
//!     .property(PropertyDef::string("Name", 1))
//!     .property(PropertyDef::primitive("Age", PrimitiveKind::I32, 2));
//! let (_, factory) = registry.get_or_build(&person).unwrap();
//!
//! let mut ann = factory.new_instance();
//! ann.set("Name", "Ann").unwrap();
//! ann.set("Age", 30).unwrap();
//!
//! let copy = factory.from_bytes(&ann.to_bytes().unwrap()).unwrap();
//! assert!(copy.compare(Some(&ann), "").is_empty());
//! ```

pub mod codec;
mod collection;
mod config;
mod diff;
mod error;
mod factory;
mod instance;
mod key;
mod notify;
mod property;
mod registry;
mod tracked;

pub use codec::{CodecError, CodecResult};
pub use collection::{CollectionChange, CollectionOp, ModelCollection};
pub use config::{CodecLimits, ModelConfig};
pub use diff::{AuditedChange, ChangeKind};
pub use error::{ModelError, ModelResult};
pub use factory::{ModelFactory, TYPE_TAG_KEY};
pub use instance::Instance;
pub use notify::{ChangeHandler, ChangePhase, PropertyChange, SubscriptionId};
pub use property::{PropertyRef, PropertyValue, RawValue, ValueMap};
pub use registry::ModelRegistry;
pub use tracked::TrackedModel;
