use modelforge_types::{PrimitiveKind, Value, ValueType};
use std::fmt;

/// The category of a property, which decides its slot shape, wire form and
/// diff rule.
///
/// Categories are written in contract documents as type names:
///
/// | Type name | Category |
/// |---|---|
/// | `bool`, `u8` … `i64`, `f32`, `f64`, `char`, `uuid` | [`Primitive`](Self::Primitive) |
/// | any primitive followed by `?` | [`Nullable`](Self::Nullable) |
/// | `string`, `bytes`, `chars`, `timestamp`, `object` | the scalar reference categories |
/// | `model<Contract>` | [`Model`](Self::Model) |
/// | `ref<BaseContract>` | [`Polymorphic`](Self::Polymorphic) |
/// | `array<Contract>` | [`ModelArray`](Self::ModelArray) |
/// | `collection<Contract>` | [`ModelCollection`](Self::ModelCollection) |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyCategory {
    /// Fixed-width value type; never null.
    Primitive(PrimitiveKind),
    /// Value type that may be null.
    Nullable(PrimitiveKind),
    String,
    Bytes,
    Chars,
    /// Microsecond instant; never null.
    Timestamp,
    /// Single nested model of exactly this contract.
    Model(String),
    /// Nested model of the base contract or any contract extending it.
    Polymorphic(String),
    /// Fixed sequence of models, replaced as a whole.
    ModelArray(String),
    /// Observable sequence of models.
    ModelCollection(String),
    /// Opaque JSON document.
    Object,
}

impl PropertyCategory {
    /// Parses a contract type name. Returns `None` for unsupported types.
    #[must_use]
    pub fn parse(ty: &str) -> Option<Self> {
        let ty = ty.trim();
        if let Some(inner) = ty.strip_suffix('?') {
            return match Self::parse(inner)? {
                Self::Primitive(kind) | Self::Nullable(kind) => Some(Self::Nullable(kind)),
                // Reference categories are already nullable.
                Self::Timestamp => None,
                other => Some(other),
            };
        }
        if let Some((outer, rest)) = ty.split_once('<') {
            let contract = rest.strip_suffix('>')?.trim();
            if contract.is_empty() || contract.contains(['<', '>', ',']) {
                return None;
            }
            let contract = contract.to_string();
            return match outer.trim() {
                "model" => Some(Self::Model(contract)),
                "ref" => Some(Self::Polymorphic(contract)),
                "array" => Some(Self::ModelArray(contract)),
                "collection" => Some(Self::ModelCollection(contract)),
                _ => None,
            };
        }
        Some(match ty {
            "bool" => Self::Primitive(PrimitiveKind::Bool),
            "u8" | "byte" => Self::Primitive(PrimitiveKind::U8),
            "i8" | "sbyte" => Self::Primitive(PrimitiveKind::I8),
            "u16" | "ushort" => Self::Primitive(PrimitiveKind::U16),
            "i16" | "short" => Self::Primitive(PrimitiveKind::I16),
            "u32" | "uint" => Self::Primitive(PrimitiveKind::U32),
            "i32" | "int" => Self::Primitive(PrimitiveKind::I32),
            "u64" | "ulong" => Self::Primitive(PrimitiveKind::U64),
            "i64" | "long" => Self::Primitive(PrimitiveKind::I64),
            "f32" | "float" => Self::Primitive(PrimitiveKind::F32),
            "f64" | "double" => Self::Primitive(PrimitiveKind::F64),
            "char" => Self::Primitive(PrimitiveKind::Char),
            "uuid" | "guid" => Self::Primitive(PrimitiveKind::Uuid),
            "string" => Self::String,
            "bytes" | "byte[]" => Self::Bytes,
            "chars" | "char[]" => Self::Chars,
            "timestamp" | "datetime" => Self::Timestamp,
            "object" => Self::Object,
            _ => return None,
        })
    }

    /// The scalar shape stored in the slot, or `None` for model categories.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Self::Primitive(kind) | Self::Nullable(kind) => ValueType::Primitive(*kind),
            Self::String => ValueType::String,
            Self::Bytes => ValueType::Bytes,
            Self::Chars => ValueType::Chars,
            Self::Timestamp => ValueType::Timestamp,
            Self::Object => ValueType::Object,
            Self::Model(_) | Self::Polymorphic(_) | Self::ModelArray(_) | Self::ModelCollection(_) => {
                return None;
            }
        })
    }

    /// Returns true if the slot may hold null.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        !matches!(
            self,
            Self::Primitive(_) | Self::Timestamp | Self::ModelArray(_) | Self::ModelCollection(_)
        )
    }

    /// Returns true for single-model categories.
    #[must_use]
    pub const fn is_single_model(&self) -> bool {
        matches!(self, Self::Model(_) | Self::Polymorphic(_))
    }

    /// Returns true for sequence-of-model categories.
    #[must_use]
    pub const fn is_model_sequence(&self) -> bool {
        matches!(self, Self::ModelArray(_) | Self::ModelCollection(_))
    }

    /// The referenced contract identity for model categories.
    #[must_use]
    pub fn contract(&self) -> Option<&str> {
        match self {
            Self::Model(c) | Self::Polymorphic(c) | Self::ModelArray(c) | Self::ModelCollection(c) => Some(c),
            _ => None,
        }
    }

    /// Returns true if values of this category round-trip through a string.
    #[must_use]
    pub const fn is_key_convertible(&self) -> bool {
        matches!(
            self,
            Self::Primitive(_) | Self::Nullable(_) | Self::String | Self::Chars | Self::Timestamp
        )
    }

    /// The zero value of a scalar slot. Model categories return `Null`.
    #[must_use]
    pub const fn default_value(&self) -> Value {
        match self {
            Self::Primitive(kind) => kind.default_value(),
            Self::Timestamp => Value::Timestamp(modelforge_types::Timestamp::EPOCH),
            _ => Value::Null,
        }
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "{kind}"),
            Self::Nullable(kind) => write!(f, "{kind}?"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Chars => f.write_str("chars"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Model(c) => write!(f, "model<{c}>"),
            Self::Polymorphic(c) => write!(f, "ref<{c}>"),
            Self::ModelArray(c) => write!(f, "array<{c}>"),
            Self::ModelCollection(c) => write!(f, "collection<{c}>"),
            Self::Object => f.write_str("object"),
        }
    }
}
