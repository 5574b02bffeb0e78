//! Error types for marshaling operations

use thiserror::Error;

/// Error type for marshaling operations
///
/// Failures raised below a struct field are wrapped in [Error::Context] with the qualified
/// name of that field (`Type.Field`, `Type.Field[i]` for array elements), so a failure deep in
/// a nested value reads like `Transaction.Body: TransferTransaction.Inputs[0]: ...`. Use
/// [Error::kind] to match on the underlying failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("marshal length does not match generated content: wrote {written}, expected {expected}")]
    MarshalLength { written: usize, expected: usize },
    #[error("short read during unmarshal")]
    ShortRead,
    #[error("short write during marshal")]
    ShortWrite,
    #[error("too many items during (un)marshal: {0} > {1}")]
    TooMany(u64, u64), // found, max
    #[error("value is too large for type: {0} does not fit in {1} bits")]
    TooLarge(u64, u32), // value, bits
    #[error("bad interface type: {0}")]
    BadInterface(String),
    #[error("lengths do not match: {0} and {1}")]
    LengthMismatch(String, String),
    #[error("leftover bytes during unmarshal: {0} bytes")]
    LeftOverBytes(usize),
    #[error("varint overflows 64 bits")]
    Overflow,
    #[error("fixed length violated: {found} != {expected}")]
    FixedLength { found: u64, expected: u64 },
    #[error("invalid utf-8 in string")]
    InvalidUtf8,
    #[error("nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("unknown type: {0}")]
    UnknownType(String),
    #[error("unexpected value: expected {expected}, found {found}")]
    UnexpectedValue { expected: String, found: String },
    #[error("{0}: {1}")]
    Context(String, Box<Error>),
}

impl Error {
    /// Wraps the error with the name of the field (or type) it was raised in.
    pub fn context(self, path: impl Into<String>) -> Self {
        Error::Context(path.into(), Box::new(self))
    }

    /// Returns the underlying failure, stripped of all context.
    pub fn kind(&self) -> &Error {
        match self {
            Error::Context(_, source) => source.kind(),
            kind => kind,
        }
    }

    /// Returns the context attached to the error, outermost first.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let Error::Context(name, source) = current {
            path.push(name.as_str());
            current = source;
        }
        path
    }
}
