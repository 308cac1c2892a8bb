use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding the binary form.
///
/// Running out of input between two fields is not an error; running out in
/// the middle of one is.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("truncated payload reading {property}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        property: String,
        needed: usize,
        remaining: usize,
    },

    #[error("invalid presence flag {flag:#04x} for {property}")]
    InvalidPresenceFlag { property: String, flag: u8 },

    #[error("invalid bool byte {byte:#04x} for {property}")]
    InvalidBool { property: String, byte: u8 },

    #[error("invalid UTF-8 in {property}")]
    InvalidUtf8 { property: String },

    #[error("invalid char scalar {code:#x} for {property}")]
    InvalidChar { property: String, code: u32 },

    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("{property} holds {count} elements, limit is {max}")]
    TooManyElements { property: String, count: usize, max: usize },

    #[error("model nesting exceeds depth {max}")]
    DepthExceeded { max: usize },

    #[error("{property} names unknown contract {contract}")]
    UnknownContract { property: String, contract: String },

    #[error("{property} accepts {expected}, payload names {actual}")]
    IncompatibleContract {
        property: String,
        expected: String,
        actual: String,
    },

    #[error("object payload for {property}: {source}")]
    Object {
        property: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("slot for {property} does not hold a {expected}")]
    SlotMismatch { property: String, expected: &'static str },
}
