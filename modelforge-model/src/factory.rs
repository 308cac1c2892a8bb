//! Instance factories.
//!
//! A [`ModelFactory`] is built once per contract by the registry and creates
//! instances either zero-valued or from a raw property map. Raw input is
//! coerced field by field: direct assignment, then a primitive cast, then the
//! registry's conversion service. A field that cannot be converted is left at
//! its default and logged; unrecognized keys are ignored.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};

use modelforge_schema::{PropertyCategory, PropertyDescriptor, SchemaDescriptor};
use modelforge_types::{Value, coerce};
use tracing::{trace, warn};

use crate::instance::{check_model, check_scalar};
use crate::property::{RawValue, ValueMap};
use crate::registry::RegistryInner;
use crate::{Instance, ModelConfig, ModelError, ModelRegistry, ModelResult};

/// Key naming the concrete contract of a nested map bound for a polymorphic
/// property.
pub const TYPE_TAG_KEY: &str = "$type";

/// Produces instances of one compiled contract. Cheap to clone.
#[derive(Clone)]
pub struct ModelFactory {
    shared: Arc<FactoryShared>,
}

struct FactoryShared {
    descriptor: Arc<SchemaDescriptor>,
    config: ModelConfig,
    registry: Weak<RegistryInner>,
}

impl ModelFactory {
    pub(crate) fn new(descriptor: Arc<SchemaDescriptor>, registry: &Arc<RegistryInner>) -> Self {
        Self {
            shared: Arc::new(FactoryShared {
                descriptor,
                config: registry.config.clone(),
                registry: Arc::downgrade(registry),
            }),
        }
    }

    /// The compiled contract.
    pub fn descriptor(&self) -> &Arc<SchemaDescriptor> {
        &self.shared.descriptor
    }

    /// Configuration of the registry that built this factory.
    pub fn config(&self) -> &ModelConfig {
        &self.shared.config
    }

    /// Creates a zero-valued instance. Collections start empty, nested models
    /// absent.
    pub fn new_instance(&self) -> Instance {
        Instance::new(self.clone())
    }

    /// Creates an instance and copies every recognized key of `values` into
    /// it.
    pub fn new_from(&self, values: &ValueMap) -> Instance {
        let mut instance = self.new_instance();
        for (key, raw) in values {
            let Some(property) = self.descriptor().property(key) else {
                if key != TYPE_TAG_KEY {
                    trace!(contract = %self.descriptor().identity(), key = %key, "ignoring unrecognized key");
                }
                continue;
            };
            if let Err(err) = self.populate(&mut instance, property, raw) {
                warn!(
                    contract = %self.descriptor().identity(),
                    property = %property.name(),
                    input = raw.kind(),
                    error = %err,
                    "skipping field that could not be converted"
                );
            }
        }
        instance
    }

    /// Creates an instance from a JSON object through the same pipeline as
    /// [`new_from`](Self::new_from).
    pub fn new_from_json(&self, json: &serde_json::Value) -> ModelResult<Instance> {
        match json {
            serde_json::Value::Object(object) => Ok(self.new_from(&object_to_map(object))),
            other => Err(ModelError::InvalidJson(format!(
                "expected an object for contract {}, got {}",
                self.descriptor().identity(),
                json_kind(other)
            ))),
        }
    }

    /// Decodes an instance from its binary form.
    pub fn from_bytes(&self, bytes: &[u8]) -> ModelResult<Instance> {
        let mut instance = self.new_instance();
        instance.from_bytes(bytes)?;
        Ok(instance)
    }

    /// Returns the factory for `identity` from the owning registry.
    pub fn resolve(&self, identity: &str) -> ModelResult<ModelFactory> {
        if identity == self.descriptor().identity() {
            return Ok(self.clone());
        }
        self.registry()
            .ok_or_else(|| ModelError::RegistryDropped(self.descriptor().identity().to_string()))?
            .resolve(identity)
    }

    /// Returns true if this contract is `base` or extends it, directly or
    /// through any chain of registered ancestors.
    ///
    /// Ancestors that cannot be resolved end their branch of the walk.
    pub fn is_assignable_to(&self, base: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![self.clone()];
        while let Some(factory) = pending.pop() {
            let descriptor = factory.descriptor();
            if descriptor.is_assignable_to(base) {
                return true;
            }
            if !visited.insert(descriptor.identity().to_string()) {
                continue;
            }
            for parent in descriptor.extends() {
                match factory.resolve(parent) {
                    Ok(parent) => pending.push(parent),
                    Err(err) => {
                        trace!(contract = %descriptor.identity(), parent = %parent, error = %err, "ancestor not resolvable");
                    }
                }
            }
        }
        false
    }

    /// Returns true if both handles refer to the same published factory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn registry(&self) -> Option<ModelRegistry> {
        self.shared.registry.upgrade().map(ModelRegistry::from_inner)
    }

    fn populate(&self, instance: &mut Instance, property: &PropertyDescriptor, raw: &RawValue) -> ModelResult<()> {
        let category = property.category();
        if category.is_single_model() {
            let model = self.build_model(property, raw)?;
            instance.init_model(property, model);
        } else if category.is_model_sequence() {
            let items = self.build_models(property, raw)?;
            instance.init_models(property, items);
        } else {
            let value = self.convert_scalar(property, raw)?;
            instance.init_scalar(property, value);
        }
        Ok(())
    }

    fn convert_scalar(&self, property: &PropertyDescriptor, raw: &RawValue) -> ModelResult<Value> {
        let Some(target) = property.category().value_type() else {
            return Err(self.shape_error(property, raw));
        };
        let value = match raw {
            RawValue::Value(v) => v.clone(),
            RawValue::Json(serde_json::Value::Null) => Value::Null,
            RawValue::Json(json) => Value::Object(json.clone()),
            _ => return Err(self.shape_error(property, raw)),
        };
        let value = match &self.registry() {
            Some(registry) => coerce(&value, target, registry.converter())?,
            None => coerce(&value, target, &modelforge_types::DefaultConverter)?,
        };
        check_scalar(self.descriptor(), property, &value)?;
        Ok(value)
    }

    fn build_model(&self, property: &PropertyDescriptor, raw: &RawValue) -> ModelResult<Option<Instance>> {
        match raw {
            RawValue::Value(Value::Null) | RawValue::Json(serde_json::Value::Null) => Ok(None),
            RawValue::Model(model) => {
                check_model(property, model)?;
                Ok(Some(model.clone()))
            }
            RawValue::Map(map) => {
                let tag = match map.get(TYPE_TAG_KEY) {
                    Some(RawValue::Value(Value::String(tag))) => Some(tag.as_str()),
                    Some(RawValue::Json(serde_json::Value::String(tag))) => Some(tag.as_str()),
                    _ => None,
                };
                Ok(Some(self.child_factory(property, tag)?.new_from(map)))
            }
            RawValue::Json(serde_json::Value::Object(object)) => {
                let tag = object.get(TYPE_TAG_KEY).and_then(serde_json::Value::as_str);
                Ok(Some(self.child_factory(property, tag)?.new_from(&object_to_map(object))))
            }
            _ => Err(self.shape_error(property, raw)),
        }
    }

    fn build_models(&self, property: &PropertyDescriptor, raw: &RawValue) -> ModelResult<Vec<Instance>> {
        let elements: Vec<RawValue> = match raw {
            RawValue::Value(Value::Null) | RawValue::Json(serde_json::Value::Null) => return Ok(Vec::new()),
            RawValue::List(items) => items.clone(),
            RawValue::Json(serde_json::Value::Array(items)) => items.iter().cloned().map(RawValue::Json).collect(),
            _ => return Err(self.shape_error(property, raw)),
        };
        let mut models = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            match self.build_model(property, element) {
                Ok(Some(model)) => models.push(model),
                Ok(None) => {
                    warn!(property = %property.name(), index, "skipping null sequence element");
                }
                Err(err) => {
                    warn!(property = %property.name(), index, error = %err, "skipping sequence element");
                }
            }
        }
        Ok(models)
    }

    fn child_factory(&self, property: &PropertyDescriptor, tag: Option<&str>) -> ModelResult<ModelFactory> {
        let category = property.category();
        let Some(base) = category.contract() else {
            return Err(ModelError::TypeMismatch {
                contract: self.descriptor().identity().to_string(),
                property: property.name().to_string(),
                expected: category.to_string(),
                actual: "model".to_string(),
            });
        };
        let identity = match (category, tag) {
            (PropertyCategory::Polymorphic(_), Some(tag)) => tag,
            _ => base,
        };
        let factory = self.resolve(identity)?;
        if let PropertyCategory::Polymorphic(base) = category
            && !factory.is_assignable_to(base)
        {
            return Err(ModelError::IncompatibleContract {
                property: property.name().to_string(),
                expected: category.to_string(),
                actual: identity.to_string(),
            });
        }
        Ok(factory)
    }

    fn shape_error(&self, property: &PropertyDescriptor, raw: &RawValue) -> ModelError {
        ModelError::TypeMismatch {
            contract: self.descriptor().identity().to_string(),
            property: property.name().to_string(),
            expected: property.category().to_string(),
            actual: raw.kind().to_string(),
        }
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("contract", &self.descriptor().identity())
            .finish_non_exhaustive()
    }
}

fn object_to_map(object: &serde_json::Map<String, serde_json::Value>) -> ValueMap {
    object
        .iter()
        .map(|(key, value)| (key.clone(), RawValue::Json(value.clone())))
        .collect()
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
