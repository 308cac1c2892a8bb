use modelforge_types::{PrimitiveKind, Value};
use uuid::Uuid;

use super::{CodecError, CodecResult};
use crate::CodecLimits;

/// Forward-only cursor over a payload. Every read names the property it is
/// decoding so truncation errors point at the field.
pub(crate) struct WireReader<'a, 'l> {
    bytes: &'a [u8],
    pos: usize,
    limits: &'l CodecLimits,
}

impl<'a, 'l> WireReader<'a, 'l> {
    pub(crate) fn new(bytes: &'a [u8], limits: &'l CodecLimits) -> Self {
        Self { bytes, pos: 0, limits }
    }

    pub(crate) fn limits(&self) -> &'l CodecLimits {
        self.limits
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, needed: usize, property: &str) -> CodecResult<&'a [u8]> {
        if needed > self.remaining() {
            return Err(CodecError::Truncated {
                property: property.to_string(),
                needed,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, property: &str) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, property)?);
        Ok(out)
    }

    pub(crate) fn read_flag(&mut self, property: &str) -> CodecResult<bool> {
        match self.take(1, property)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            flag => Err(CodecError::InvalidPresenceFlag {
                property: property.to_string(),
                flag,
            }),
        }
    }

    pub(crate) fn read_u32(&mut self, property: &str) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.take_array(property)?))
    }

    /// Reads a 4-byte length and that many bytes.
    pub(crate) fn read_prefixed(&mut self, property: &str) -> CodecResult<&'a [u8]> {
        let len = self.read_u32(property)? as usize;
        if len > self.limits.max_payload_len {
            return Err(CodecError::PayloadTooLarge {
                len,
                max: self.limits.max_payload_len,
            });
        }
        self.take(len, property)
    }

    pub(crate) fn read_string(&mut self, property: &str) -> CodecResult<String> {
        let bytes = self.read_prefixed(property)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 {
            property: property.to_string(),
        })
    }

    pub(crate) fn read_primitive(&mut self, kind: PrimitiveKind, property: &str) -> CodecResult<Value> {
        Ok(match kind {
            PrimitiveKind::Bool => match self.take(1, property)?[0] {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                byte => {
                    return Err(CodecError::InvalidBool {
                        property: property.to_string(),
                        byte,
                    });
                }
            },
            PrimitiveKind::U8 => Value::U8(self.take(1, property)?[0]),
            PrimitiveKind::I8 => Value::I8(i8::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::U16 => Value::U16(u16::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::I16 => Value::I16(i16::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::U32 => Value::U32(self.read_u32(property)?),
            PrimitiveKind::I32 => Value::I32(i32::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::U64 => Value::U64(u64::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::I64 => Value::I64(i64::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::F32 => Value::F32(f32::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::F64 => Value::F64(f64::from_le_bytes(self.take_array(property)?)),
            PrimitiveKind::Char => {
                let code = self.read_u32(property)?;
                Value::Char(char::from_u32(code).ok_or_else(|| CodecError::InvalidChar {
                    property: property.to_string(),
                    code,
                })?)
            }
            PrimitiveKind::Uuid => Value::Uuid(Uuid::from_bytes_le(self.take_array(property)?)),
        })
    }

    pub(crate) fn read_i64(&mut self, property: &str) -> CodecResult<i64> {
        Ok(i64::from_le_bytes(self.take_array(property)?))
    }
}
