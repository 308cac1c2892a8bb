use modelforge_types::PrimitiveKind;
use serde::{Deserialize, Serialize};

use crate::{PropertyCategory, SchemaResult};

/// Declares a model's shape: its identity, properties, and designated key
/// and owner properties.
///
/// Contracts are plain data and are usually loaded from JSON:
///
/// ```json
/// {
///   "name": "Person",
///   "key": "Id",
///   "properties": [
///     { "name": "Id", "type": "uuid", "order": 1 },
///     { "name": "Name", "type": "string", "order": 2 },
///     { "name": "Address", "type": "model<Address>", "order": 3 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDef {
    /// Contract identity. Registry cache key and polymorphic type tag.
    pub name: String,
    /// Base contracts this contract can stand in for in `ref<...>` properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extends: Vec<String>,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    /// Name of the identity property exposed through the key accessor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Name of the owner property. Synthesized when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl ContractDef {
    /// Creates an empty contract.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            properties: Vec::new(),
            key: None,
            owner: None,
        }
    }

    /// Parses a contract document.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Appends a property.
    #[must_use]
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Declares a base contract.
    #[must_use]
    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends.push(base.into());
        self
    }

    /// Designates the key property.
    #[must_use]
    pub fn key(mut self, property: impl Into<String>) -> Self {
        self.key = Some(property.into());
        self
    }

    /// Designates the owner property.
    #[must_use]
    pub fn owner(mut self, property: impl Into<String>) -> Self {
        self.owner = Some(property.into());
        self
    }
}

/// One declared property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    /// Type name, see [`PropertyCategory`] for the grammar.
    #[serde(rename = "type")]
    pub ty: String,
    /// Serialization order index. Unique within a contract and stable across
    /// contract versions.
    pub order: u32,
    #[serde(default = "default_true")]
    pub readable: bool,
    /// `false` makes the property init-only: the factory and codec populate
    /// it but the public setter rejects it.
    #[serde(default = "default_true")]
    pub writable: bool,
}

fn default_true() -> bool {
    true
}

impl PropertyDef {
    /// A property with an arbitrary type name.
    pub fn new(name: impl Into<String>, ty: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            order,
            readable: true,
            writable: true,
        }
    }

    fn of(name: impl Into<String>, category: &PropertyCategory, order: u32) -> Self {
        Self::new(name, category.to_string(), order)
    }

    /// Shorthand for a fixed-width value property.
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Primitive(kind), order)
    }

    /// Shorthand for a nullable value property.
    pub fn nullable(name: impl Into<String>, kind: PrimitiveKind, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Nullable(kind), order)
    }

    /// Shorthand for a string property.
    pub fn string(name: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::String, order)
    }

    /// Shorthand for a byte array property.
    pub fn bytes(name: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Bytes, order)
    }

    /// Shorthand for a char array property.
    pub fn chars(name: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Chars, order)
    }

    /// Shorthand for a timestamp property.
    pub fn timestamp(name: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Timestamp, order)
    }

    /// Shorthand for a nested model of a concrete contract.
    pub fn model(name: impl Into<String>, contract: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Model(contract.into()), order)
    }

    /// Shorthand for a polymorphic model reference.
    pub fn polymorphic(name: impl Into<String>, base: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Polymorphic(base.into()), order)
    }

    /// Shorthand for an array of models.
    pub fn model_array(name: impl Into<String>, contract: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::ModelArray(contract.into()), order)
    }

    /// Shorthand for an observable collection of models.
    pub fn model_collection(name: impl Into<String>, contract: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::ModelCollection(contract.into()), order)
    }

    /// Shorthand for an opaque JSON object.
    pub fn object(name: impl Into<String>, order: u32) -> Self {
        Self::of(name, &PropertyCategory::Object, order)
    }

    /// Marks the property init-only.
    #[must_use]
    pub fn init_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Marks the property write-only.
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}
