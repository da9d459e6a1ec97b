/// Errors that can occur while decoding or encoding headers and payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// A read or write would run past the end of the buffer.
    #[error("out of bounds: need {needed} bytes at offset {offset}, buffer holds {len}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// The header does not start with the magic word.
    #[error("invalid magic word {found:#010x} (expected 0xaffec0c2)")]
    InvalidMagicWord { found: u32 },

    /// A declared record count exceeds the bytes left in the body.
    #[error("truncated payload: {declared} {record} record(s) declared, room for {available}")]
    TruncatedPayload {
        record: &'static str,
        declared: usize,
        available: usize,
    },

    /// The header's message size disagrees with what the payload codec consumed.
    #[error("length mismatch: header declares {declared} body bytes, payload used {consumed}")]
    LengthMismatch { declared: usize, consumed: usize },

    /// A record sequence is too long for its 16-bit count field.
    #[error("too many {record} records ({count}, max 65535)")]
    TooManyRecords { record: &'static str, count: usize },

    /// A raw command or payload carries a tag this crate decodes as a typed
    /// variant, so it would not read back as raw.
    #[error("raw {record} with tag {tag:#06x} has a typed layout")]
    AmbiguousRaw { record: &'static str, tag: u16 },

    /// The encoded body does not fit the 32-bit size field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, WireError>;
