//! Value coercion.
//!
//! Coercion runs in three stages, cheapest first:
//! 1. direct assignment when the value already has the target shape,
//! 2. [`try_cast`] between primitive kinds, which never changes a value's
//!    meaning (out-of-range or fractional casts are refused),
//! 3. the [`TypeConverter`] service, which handles parsing, formatting and
//!    JSON input.

use serde_json::Value as Json;
use uuid::Uuid;

use crate::{Error, PrimitiveKind, Result, Timestamp, Value, ValueType};

/// Pluggable conversion service consulted when neither direct assignment
/// nor a primitive cast applies.
///
/// Implementations must be pure: the same input always produces the same
/// output.
pub trait TypeConverter: Send + Sync {
    /// Converts `value` into the `target` shape.
    fn convert(&self, value: &Value, target: ValueType) -> Result<Value>;
}

/// The built-in conversion service.
///
/// Parses strings with each kind's canonical text form, formats values into
/// strings with [`Value::to_key_string`], and unpacks JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl TypeConverter for DefaultConverter {
    fn convert(&self, value: &Value, target: ValueType) -> Result<Value> {
        if value.is_null() || target.matches(value) {
            return Ok(value.clone());
        }
        match (value, target) {
            (Value::Object(json), _) => from_json(json, target, self),
            (_, ValueType::Object) => Ok(Value::Object(value.to_json())),
            (Value::String(s), _) => parse_str(s, target),
            (Value::Chars(chars), _) => parse_str(&chars.iter().collect::<String>(), target),
            (Value::Bytes(bytes), ValueType::String | ValueType::Chars) => {
                let text = String::from_utf8(bytes.clone())
                    .map_err(|_| Error::conversion(value, target))?;
                parse_str(&text, target)
            }
            (Value::Timestamp(ts), ValueType::Primitive(kind)) => {
                try_cast(&Value::I64(ts.as_micros()), kind).ok_or_else(|| Error::conversion(value, target))
            }
            (Value::Bool(b), ValueType::Primitive(kind)) if kind.is_integer() || kind.is_float() => {
                try_cast(&Value::U8(u8::from(*b)), kind).ok_or_else(|| Error::conversion(value, target))
            }
            (_, ValueType::Primitive(PrimitiveKind::Bool)) => match value.as_f64() {
                Some(n) => Ok(Value::Bool(n != 0.0)),
                None => Err(Error::conversion(value, target)),
            },
            (_, ValueType::Timestamp) => value
                .as_integer()
                .and_then(|i| i64::try_from(i).ok())
                .map(|micros| Value::Timestamp(Timestamp::from_micros(micros)))
                .ok_or_else(|| Error::conversion(value, target)),
            (_, ValueType::String | ValueType::Chars) => match value.to_key_string() {
                Some(text) => parse_str(&text, target),
                None => Err(Error::conversion(value, target)),
            },
            _ => Err(Error::conversion(value, target)),
        }
    }
}

/// Runs the full coercion pipeline. `Null` passes through unchanged; the
/// caller decides whether null is acceptable for its slot.
pub fn coerce(value: &Value, target: ValueType, converter: &dyn TypeConverter) -> Result<Value> {
    if value.is_null() || target.matches(value) {
        return Ok(value.clone());
    }
    if let ValueType::Primitive(kind) = target
        && let Some(cast) = try_cast(value, kind)
    {
        return Ok(cast);
    }
    converter.convert(value, target)
}

/// Casts between primitive kinds without changing the value's meaning.
///
/// Integer casts must fit the target range, float-to-integer casts require
/// an integral value, and a one-character string casts to `char`.
#[must_use]
pub fn try_cast(value: &Value, target: PrimitiveKind) -> Option<Value> {
    if value.primitive_kind() == Some(target) {
        return Some(value.clone());
    }
    if let Some(i) = value.as_integer() {
        return integer_to(i, target);
    }
    match value {
        Value::F32(v) => float_to(f64::from(*v), target),
        Value::F64(v) => float_to(*v, target),
        Value::Char(c) if target != PrimitiveKind::Char => integer_to(i128::from(u32::from(*c)), target),
        Value::String(s) if target == PrimitiveKind::Char => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::Char(c)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn integer_to(i: i128, target: PrimitiveKind) -> Option<Value> {
    Some(match target {
        PrimitiveKind::U8 => Value::U8(u8::try_from(i).ok()?),
        PrimitiveKind::I8 => Value::I8(i8::try_from(i).ok()?),
        PrimitiveKind::U16 => Value::U16(u16::try_from(i).ok()?),
        PrimitiveKind::I16 => Value::I16(i16::try_from(i).ok()?),
        PrimitiveKind::U32 => Value::U32(u32::try_from(i).ok()?),
        PrimitiveKind::I32 => Value::I32(i32::try_from(i).ok()?),
        PrimitiveKind::U64 => Value::U64(u64::try_from(i).ok()?),
        PrimitiveKind::I64 => Value::I64(i64::try_from(i).ok()?),
        PrimitiveKind::F32 => Value::F32(i as f32),
        PrimitiveKind::F64 => Value::F64(i as f64),
        PrimitiveKind::Char => Value::Char(char::from_u32(u32::try_from(i).ok()?)?),
        PrimitiveKind::Bool | PrimitiveKind::Uuid => return None,
    })
}

fn float_to(f: f64, target: PrimitiveKind) -> Option<Value> {
    match target {
        PrimitiveKind::F32 => Some(Value::F32(f as f32)),
        PrimitiveKind::F64 => Some(Value::F64(f)),
        kind if kind.is_integer() => {
            if !f.is_finite() || f.fract() != 0.0 {
                return None;
            }
            integer_to(f as i128, kind)
        }
        _ => None,
    }
}

fn parse_str(s: &str, target: ValueType) -> Result<Value> {
    let bad = || Error::parse(target, s);
    Ok(match target {
        ValueType::String => Value::String(s.to_string()),
        ValueType::Chars => Value::Chars(s.chars().collect()),
        ValueType::Bytes => Value::Bytes(s.as_bytes().to_vec()),
        ValueType::Timestamp => Value::Timestamp(Timestamp::parse(s)?),
        ValueType::Object => Value::Object(serde_json::from_str(s).unwrap_or_else(|_| Json::String(s.to_string()))),
        ValueType::Primitive(kind) => {
            let t = s.trim();
            match kind {
                PrimitiveKind::Bool => match t.to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => return Err(bad()),
                },
                PrimitiveKind::U8 => Value::U8(t.parse().map_err(|_| bad())?),
                PrimitiveKind::I8 => Value::I8(t.parse().map_err(|_| bad())?),
                PrimitiveKind::U16 => Value::U16(t.parse().map_err(|_| bad())?),
                PrimitiveKind::I16 => Value::I16(t.parse().map_err(|_| bad())?),
                PrimitiveKind::U32 => Value::U32(t.parse().map_err(|_| bad())?),
                PrimitiveKind::I32 => Value::I32(t.parse().map_err(|_| bad())?),
                PrimitiveKind::U64 => Value::U64(t.parse().map_err(|_| bad())?),
                PrimitiveKind::I64 => Value::I64(t.parse().map_err(|_| bad())?),
                PrimitiveKind::F32 => Value::F32(t.parse().map_err(|_| bad())?),
                PrimitiveKind::F64 => Value::F64(t.parse().map_err(|_| bad())?),
                PrimitiveKind::Char => {
                    let mut chars = s.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Value::Char(c),
                        _ => return Err(bad()),
                    }
                }
                PrimitiveKind::Uuid => Value::Uuid(Uuid::parse_str(t)?),
            }
        }
    })
}

fn from_json(json: &Json, target: ValueType, converter: &dyn TypeConverter) -> Result<Value> {
    let unsupported = || Error::Conversion {
        from: format!("json {}", json_kind(json)),
        to: target.to_string(),
    };
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => coerce(&Value::Bool(*b), target, converter),
        Json::Number(n) => {
            let scalar = if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(u) = n.as_u64() {
                Value::U64(u)
            } else {
                Value::F64(n.as_f64().ok_or_else(unsupported)?)
            };
            coerce(&scalar, target, converter)
        }
        Json::String(s) => parse_str(s, target),
        Json::Array(items) => match target {
            ValueType::Bytes => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()).ok_or_else(unsupported))
                .collect::<Result<Vec<u8>>>()
                .map(Value::Bytes),
            ValueType::Chars => items
                .iter()
                .map(|item| match coerce(&Value::Object(item.clone()), ValueType::Primitive(PrimitiveKind::Char), converter)? {
                    Value::Char(c) => Ok(c),
                    _ => Err(unsupported()),
                })
                .collect::<Result<Vec<char>>>()
                .map(Value::Chars),
            _ => Err(unsupported()),
        },
        Json::Object(_) => Err(unsupported()),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
