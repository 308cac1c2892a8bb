use modelforge_types::Value;

use super::{CodecError, CodecResult};
use crate::CodecLimits;

/// Append-only little-endian buffer.
pub(crate) struct WireWriter<'l> {
    buf: Vec<u8>,
    limits: &'l CodecLimits,
}

impl<'l> WireWriter<'l> {
    pub(crate) fn new(limits: &'l CodecLimits) -> Self {
        Self { buf: Vec::new(), limits }
    }

    pub(crate) fn limits(&self) -> &'l CodecLimits {
        self.limits
    }

    pub(crate) fn put_flag(&mut self, present: bool) {
        self.buf.push(u8::from(present));
    }

    pub(crate) fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Writes a 4-byte length followed by `payload`.
    pub(crate) fn put_prefixed(&mut self, payload: &[u8]) -> CodecResult<()> {
        let max = self.limits.max_payload_len;
        let len = u32::try_from(payload.len())
            .ok()
            .filter(|&len| len as usize <= max)
            .ok_or(CodecError::PayloadTooLarge {
                len: payload.len(),
                max,
            })?;
        self.put_u32(len);
        self.buf.extend_from_slice(payload);
        Ok(())
    }

    /// Writes a primitive at its fixed width. Non-primitive values write
    /// nothing; callers dispatch on the property category first.
    pub(crate) fn put_primitive(&mut self, value: &Value) {
        match value {
            Value::Bool(v) => self.buf.push(u8::from(*v)),
            Value::U8(v) => self.buf.push(*v),
            Value::I8(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U16(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::I16(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::I32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::U64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::I64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::F32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::F64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            Value::Char(v) => self.put_u32(u32::from(*v)),
            Value::Uuid(v) => self.buf.extend_from_slice(&v.to_bytes_le()),
            _ => {}
        }
    }

    pub(crate) fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn finish(self) -> CodecResult<Vec<u8>> {
        if self.buf.len() > self.limits.max_payload_len {
            return Err(CodecError::PayloadTooLarge {
                len: self.buf.len(),
                max: self.limits.max_payload_len,
            });
        }
        Ok(self.buf)
    }
}
