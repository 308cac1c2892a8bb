//! Property value views and raw construction input.

use std::collections::BTreeMap;

use modelforge_types::Value;

use crate::Instance;

/// Borrowed view of one property's slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyRef<'a> {
    Scalar(&'a Value),
    Model(Option<&'a Instance>),
    Models(&'a [Instance]),
}

impl PropertyRef<'_> {
    /// Clones the slot into an owned value.
    #[must_use]
    pub fn to_value(&self) -> PropertyValue {
        match *self {
            Self::Scalar(v) => PropertyValue::Scalar(v.clone()),
            Self::Model(m) => PropertyValue::Model(m.cloned()),
            Self::Models(items) => PropertyValue::Models(items.to_vec()),
        }
    }
}

/// Owned property value, as carried by audit records.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Value),
    Model(Option<Instance>),
    Models(Vec<Instance>),
}

impl PropertyValue {
    /// Returns true for a null scalar or an absent model.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Value::Null) | Self::Model(None))
    }

    /// Borrows the scalar payload, if any.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the model payload, if any.
    #[must_use]
    pub fn as_model(&self) -> Option<&Instance> {
        match self {
            Self::Model(m) => m.as_ref(),
            _ => None,
        }
    }
}

/// Property-name-to-value input for [`ModelFactory::new_from`](crate::ModelFactory::new_from).
pub type ValueMap = BTreeMap<String, RawValue>;

/// One untyped input value.
///
/// Scalars are coerced into the target property's type; maps and JSON
/// objects expand into nested instances; lists expand into model arrays and
/// collections.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Value(Value),
    Json(serde_json::Value),
    Model(Instance),
    Map(ValueMap),
    List(Vec<RawValue>),
}

impl RawValue {
    /// Wraps anything convertible into a scalar value.
    pub fn value(v: impl Into<Value>) -> Self {
        Self::Value(v.into())
    }

    /// Returns true for a null scalar or JSON null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null) | Self::Json(serde_json::Value::Null))
    }

    /// Short description of the input shape, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Json(_) => "json",
            Self::Model(_) => "model",
            Self::Map(_) => "map",
            Self::List(_) => "list",
        }
    }
}

impl From<Value> for RawValue {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl From<Instance> for RawValue {
    fn from(v: Instance) -> Self {
        Self::Model(v)
    }
}

impl From<ValueMap> for RawValue {
    fn from(v: ValueMap) -> Self {
        Self::Map(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        Self::List(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Value(Value::from(v))
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Value(Value::String(v))
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Value(Value::Bool(v))
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        Self::Value(Value::I32(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Value(Value::I64(v))
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Value(Value::F64(v))
    }
}
