//! Key and owner accessors.

use std::sync::Arc;

use modelforge_schema::PropertyCategory;
use modelforge_types::{DefaultConverter, Value, coerce};

use crate::instance::check_scalar;
use crate::property::PropertyRef;
use crate::{Instance, ModelError, ModelResult};

impl Instance {
    /// String form of the designated key property, or `None` when the
    /// contract has no key or the key is null.
    pub fn key(&self) -> Option<String> {
        let property = self.descriptor().key_property()?;
        match self.slot(property.index()).view() {
            PropertyRef::Scalar(value) => value.to_key_string(),
            _ => None,
        }
    }

    /// Parses `key` into the key property's type and assigns it, raising
    /// change notifications. Does nothing when the contract has no key.
    ///
    /// An empty string clears a nullable key. Init-only keys are accepted.
    pub fn set_key(&mut self, key: &str) -> ModelResult<()> {
        let descriptor = Arc::clone(self.descriptor());
        let Some(property) = descriptor.key_property() else {
            return Ok(());
        };
        let category = property.category();
        let Some(target) = category.value_type() else {
            return Ok(());
        };
        let value = if key.is_empty() && category.is_nullable() {
            Value::Null
        } else {
            coerce(&Value::String(key.to_string()), target, &DefaultConverter)?
        };
        check_scalar(&descriptor, property, &value)?;
        self.assign_scalar(property, value);
        Ok(())
    }

    /// Borrowed view of the owner property, declared or synthesized.
    pub fn owner(&self) -> PropertyRef<'_> {
        let property = self.descriptor().owner_property();
        self.slot(property.index()).view()
    }

    /// The owner as a string: the value of a string owner, or the key of a
    /// model owner.
    pub fn owner_key(&self) -> Option<String> {
        match self.owner() {
            PropertyRef::Scalar(value) => value.as_str().map(str::to_string),
            PropertyRef::Model(owner) => owner.and_then(Instance::key),
            PropertyRef::Models(_) => None,
        }
    }

    /// Assigns a string owner, raising change notifications. An empty string
    /// clears it. Model owners are assigned with
    /// [`set_model`](Self::set_model).
    pub fn set_owner(&mut self, owner: &str) -> ModelResult<()> {
        let descriptor = Arc::clone(self.descriptor());
        let property = descriptor.owner_property();
        if *property.category() != PropertyCategory::String {
            return Err(ModelError::TypeMismatch {
                contract: descriptor.identity().to_string(),
                property: property.name().to_string(),
                expected: property.category().to_string(),
                actual: "string".to_string(),
            });
        }
        let value = match owner {
            "" => Value::Null,
            owner => Value::String(owner.to_string()),
        };
        self.assign_scalar(property, value);
        Ok(())
    }
}
