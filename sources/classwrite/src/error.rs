use thiserror::Error;

/// Failures while building or encoding class file structures.
///
/// None of these are expected at runtime; they mean the caller handed over
/// something that cannot be represented, or the writer itself is broken.
/// Either way the container being built should be abandoned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("constant of kind {kind} cannot be used as a field constant value")]
    UnsupportedConstantType { kind: &'static str },

    #[error("wrote {actual} bytes but computed a size of {expected}")]
    EncodingInvariantViolation { expected: u32, actual: u32 },

    #[error("record written before its size was computed")]
    SizeNotComputed,

    #[error("symbol '{value}' was not registered before writing")]
    UnregisteredSymbol { value: String },

    #[error("record cannot change after its size was computed")]
    RecordSealed,

    #[error("class header was never visited")]
    HeaderNotVisited,

    #[error("constant pool exceeds 65535 entries")]
    PoolOverflow,

    #[error("string of {length} encoded bytes does not fit a Utf8 constant")]
    StringTooLong { length: usize },

    #[error("{what} of {length} does not fit its length field")]
    LengthOverflow { what: &'static str, length: usize },
}

pub type EncodeResult<T> = Result<T, EncodeError>;
