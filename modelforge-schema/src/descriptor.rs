//! Compiled, immutable contract descriptors.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::{ContractDef, PropertyCategory, SchemaError, SchemaResult};

/// Name of the owner property synthesized into contracts that declare none.
pub const OWNER_PROPERTY: &str = "Owner";

/// Serialization order of the synthesized owner property. It sorts after
/// every declared property so older payloads simply end before it.
pub const OWNER_WIRE_ORDER: u32 = u32::MAX;

/// One compiled property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    name: String,
    category: PropertyCategory,
    order: u32,
    index: usize,
    readable: bool,
    writable: bool,
    synthesized: bool,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &PropertyCategory {
        &self.category
    }

    /// Serialization order index.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Declaration index; also the slot index inside an instance.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    /// True for properties added by the compiler rather than declared.
    pub fn synthesized(&self) -> bool {
        self.synthesized
    }
}

/// The compiled form of a [`ContractDef`].
///
/// Properties are kept in declaration order (which drives diffing and slot
/// layout); [`wire_order`](Self::wire_order) lists them by ascending
/// serialization order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    identity: String,
    extends: Vec<String>,
    properties: Vec<PropertyDescriptor>,
    by_name: HashMap<String, usize>,
    wire_order: Vec<usize>,
    key: Option<usize>,
    owner: usize,
}

impl SchemaDescriptor {
    /// Validates a contract and compiles it.
    pub fn compile(contract: &ContractDef) -> SchemaResult<Self> {
        let identity = contract.name.trim();
        if identity.is_empty() {
            return Err(SchemaError::EmptyIdentity);
        }
        let identity = identity.to_string();

        let mut properties = Vec::with_capacity(contract.properties.len() + 1);
        let mut by_name = HashMap::with_capacity(contract.properties.len() + 1);
        let mut orders: HashMap<u32, usize> = HashMap::new();

        for def in &contract.properties {
            if !is_valid_name(&def.name) {
                return Err(SchemaError::InvalidPropertyName {
                    contract: identity.clone(),
                    name: def.name.clone(),
                });
            }
            let category = PropertyCategory::parse(&def.ty).ok_or_else(|| SchemaError::UnsupportedType {
                contract: identity.clone(),
                property: def.name.clone(),
                ty: def.ty.clone(),
            })?;
            let index = properties.len();
            match by_name.entry(def.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(SchemaError::DuplicateProperty {
                        contract: identity,
                        property: def.name.clone(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
            }
            if let Some(&first) = orders.get(&def.order) {
                return Err(SchemaError::DuplicateOrder {
                    contract: identity,
                    order: def.order,
                    first: properties_name(&properties, first),
                    second: def.name.clone(),
                });
            }
            orders.insert(def.order, index);
            properties.push(PropertyDescriptor {
                name: def.name.clone(),
                category,
                order: def.order,
                index,
                readable: def.readable,
                writable: def.writable,
                synthesized: false,
            });
        }

        let key = match &contract.key {
            None => None,
            Some(name) => {
                let index = *by_name.get(name).ok_or_else(|| SchemaError::UnknownKey {
                    contract: identity.clone(),
                    property: name.clone(),
                })?;
                let category = &properties[index].category;
                if !category.is_key_convertible() {
                    return Err(SchemaError::KeyNotConvertible {
                        contract: identity,
                        property: name.clone(),
                        ty: category.to_string(),
                    });
                }
                Some(index)
            }
        };

        let owner = match &contract.owner {
            Some(name) => {
                let index = *by_name.get(name).ok_or_else(|| SchemaError::UnknownOwner {
                    contract: identity.clone(),
                    property: name.clone(),
                })?;
                check_owner(&identity, &properties[index])?;
                index
            }
            None => match by_name.get(OWNER_PROPERTY) {
                Some(&index) => {
                    check_owner(&identity, &properties[index])?;
                    index
                }
                None => {
                    if let Some(&taken) = orders.get(&OWNER_WIRE_ORDER) {
                        return Err(SchemaError::DuplicateOrder {
                            contract: identity,
                            order: OWNER_WIRE_ORDER,
                            first: properties_name(&properties, taken),
                            second: OWNER_PROPERTY.to_string(),
                        });
                    }
                    let index = properties.len();
                    by_name.insert(OWNER_PROPERTY.to_string(), index);
                    properties.push(PropertyDescriptor {
                        name: OWNER_PROPERTY.to_string(),
                        category: PropertyCategory::String,
                        order: OWNER_WIRE_ORDER,
                        index,
                        readable: true,
                        writable: true,
                        synthesized: true,
                    });
                    index
                }
            },
        };

        let mut wire_order: Vec<usize> = (0..properties.len()).collect();
        wire_order.sort_by_key(|&i| properties[i].order);

        Ok(Self {
            identity,
            extends: contract.extends.clone(),
            properties,
            by_name,
            wire_order,
            key,
            owner,
        })
    }

    /// Contract identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Declared base contracts.
    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    /// Returns true if this contract is `base` or lists it directly in
    /// `extends`. Ancestors further up the chain need a registry to resolve.
    pub fn is_assignable_to(&self, base: &str) -> bool {
        self.identity == base || self.extends.iter().any(|e| e == base)
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.by_name.get(name).map(|&i| &self.properties[i])
    }

    /// Properties in ascending serialization order.
    pub fn wire_order(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.wire_order.iter().map(|&i| &self.properties[i])
    }

    /// The designated key property.
    pub fn key_property(&self) -> Option<&PropertyDescriptor> {
        self.key.map(|i| &self.properties[i])
    }

    /// The owner property, declared or synthesized.
    pub fn owner_property(&self) -> &PropertyDescriptor {
        &self.properties[self.owner]
    }

    /// Number of properties, including synthesized ones.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Always false: every descriptor carries at least the owner property.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn check_owner(contract: &str, property: &PropertyDescriptor) -> SchemaResult<()> {
    match property.category {
        PropertyCategory::String | PropertyCategory::Model(_) | PropertyCategory::Polymorphic(_) => Ok(()),
        ref other => Err(SchemaError::InvalidOwner {
            contract: contract.to_string(),
            property: property.name.clone(),
            ty: other.to_string(),
        }),
    }
}

fn properties_name(properties: &[PropertyDescriptor], index: usize) -> String {
    properties[index].name.clone()
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['.', '(', ')', '[', ']']) && !name.chars().any(char::is_whitespace)
}
