//! Dynamically typed scalar values.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Timestamp;

/// A fixed-width value type.
///
/// Primitives always occupy [`PrimitiveKind::width`] bytes on the wire and
/// never carry a null marker unless wrapped in a nullable property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Char,
    Uuid,
}

impl PrimitiveKind {
    /// Encoded size in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 | Self::Char => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
            Self::Uuid => 16,
        }
    }

    /// The zero value of this kind.
    #[must_use]
    pub const fn default_value(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::U8 => Value::U8(0),
            Self::I8 => Value::I8(0),
            Self::U16 => Value::U16(0),
            Self::I16 => Value::I16(0),
            Self::U32 => Value::U32(0),
            Self::I32 => Value::I32(0),
            Self::U64 => Value::U64(0),
            Self::I64 => Value::I64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
            Self::Char => Value::Char('\0'),
            Self::Uuid => Value::Uuid(Uuid::nil()),
        }
    }

    /// Returns true for the integer kinds.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8 | Self::I8 | Self::U16 | Self::I16 | Self::U32 | Self::I32 | Self::U64 | Self::I64
        )
    }

    /// Returns true for the floating point kinds.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Lowercase name used in error messages and contract documents.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::Uuid => "uuid",
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The target shape of a scalar conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Primitive(PrimitiveKind),
    String,
    Bytes,
    Chars,
    Timestamp,
    Object,
}

impl ValueType {
    /// Returns true if `value` already has this shape. `Null` matches nothing.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Primitive(kind), v) => v.primitive_kind() == Some(kind),
            (Self::String, Value::String(_))
            | (Self::Bytes, Value::Bytes(_))
            | (Self::Chars, Value::Chars(_))
            | (Self::Timestamp, Value::Timestamp(_))
            | (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Chars => f.write_str("chars"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// A scalar property value.
///
/// Equality is structural and reflexive: floating point values compare by
/// bit pattern (so `NaN == NaN` and `0.0 != -0.0`), and opaque objects
/// compare as JSON documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Uuid(Uuid),
    String(String),
    Bytes(Vec<u8>),
    Chars(Vec<char>),
    Timestamp(Timestamp),
    Object(serde_json::Value),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The primitive kind of this value, if it is a primitive.
    #[must_use]
    pub const fn primitive_kind(&self) -> Option<PrimitiveKind> {
        Some(match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::U8(_) => PrimitiveKind::U8,
            Self::I8(_) => PrimitiveKind::I8,
            Self::U16(_) => PrimitiveKind::U16,
            Self::I16(_) => PrimitiveKind::I16,
            Self::U32(_) => PrimitiveKind::U32,
            Self::I32(_) => PrimitiveKind::I32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::I64(_) => PrimitiveKind::I64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
            Self::Char(_) => PrimitiveKind::Char,
            Self::Uuid(_) => PrimitiveKind::Uuid,
            _ => return None,
        })
    }

    /// Short name of the runtime type, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Chars(_) => "chars",
            Self::Timestamp(_) => "timestamp",
            Self::Object(_) => "object",
            other => match other.primitive_kind() {
                Some(kind) => kind.name(),
                None => "unknown",
            },
        }
    }

    /// Borrows the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widens any integer value to `i128`.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i128> {
        Some(match *self {
            Self::U8(v) => v as i128,
            Self::I8(v) => v as i128,
            Self::U16(v) => v as i128,
            Self::I16(v) => v as i128,
            Self::U32(v) => v as i128,
            Self::I32(v) => v as i128,
            Self::U64(v) => v as i128,
            Self::I64(v) => v as i128,
            _ => return None,
        })
    }

    /// Reads any numeric value as `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::F32(v) => Some(f64::from(v)),
            Self::F64(v) => Some(v),
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    /// Renders the value as a key string.
    ///
    /// Returns `None` for null and for shapes without a canonical text
    /// form (bytes and opaque objects).
    #[must_use]
    pub fn to_key_string(&self) -> Option<String> {
        Some(match self {
            Self::Null | Self::Bytes(_) | Self::Object(_) => return None,
            Self::Bool(v) => v.to_string(),
            Self::U8(v) => v.to_string(),
            Self::I8(v) => v.to_string(),
            Self::U16(v) => v.to_string(),
            Self::I16(v) => v.to_string(),
            Self::U32(v) => v.to_string(),
            Self::I32(v) => v.to_string(),
            Self::U64(v) => v.to_string(),
            Self::I64(v) => v.to_string(),
            Self::F32(v) => v.to_string(),
            Self::F64(v) => v.to_string(),
            Self::Char(v) => v.to_string(),
            Self::Uuid(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Chars(v) => v.iter().collect(),
            Self::Timestamp(v) => v.to_string(),
        })
    }

    /// Converts the value into its JSON representation.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Null => Json::Null,
            Self::Bool(v) => Json::Bool(*v),
            Self::F32(v) => serde_json::Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
            Self::F64(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Self::U64(v) => Json::from(*v),
            Self::Bytes(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
            Self::Object(v) => v.clone(),
            other => match other.as_integer() {
                Some(i) => i64::try_from(i).map_or(Json::Null, Json::from),
                None => other.to_key_string().map_or(Json::Null, Json::String),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::U8(a), Self::U8(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::U16(a), Self::U16(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a.to_bits() == b.to_bits(),
            (Self::F64(a), Self::F64(b)) => a.to_bits() == b.to_bits(),
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Chars(a), Self::Chars(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Object(v) => write!(f, "{v}"),
            other => f.write_str(&other.to_key_string().unwrap_or_default()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
    Uuid => Uuid,
    String => String,
    Vec<u8> => Bytes,
    Vec<char> => Chars,
    Timestamp => Timestamp,
    serde_json::Value => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
