//! Error taxonomy shared by the codec and the interface registry.

use thiserror::Error;

/// Convenience alias used throughout the codec crates.
pub type Result<T, E = AbiError> = std::result::Result<T, E>;

/// Every failure the codec can report.
///
/// None of these are fatal: callers decide whether to retry, log or abort
/// the surrounding transaction or RPC flow. Pack and unpack never return
/// partial output alongside an error.
#[derive(Debug, Error)]
pub enum AbiError {
    /// Bad type declaration (unknown keyword, bad width or length, empty tuple).
    #[error("abi: invalid type: {0}")]
    Type(String),

    /// Schema entry with a `type` keyword the registry does not know.
    #[error("abi: could not recognize type {kind} of field {name}")]
    UnknownFieldType { kind: String, name: String },

    /// A second fallback or receive entry.
    #[error("abi: only single {0} is allowed")]
    DuplicateDefinition(&'static str),

    /// Receive entry whose state mutability is not `payable`.
    #[error("abi: the state mutability of receive can only be payable, got {0:?}")]
    InvalidMutability(String),

    /// Unknown function name, selector or event topic.
    #[error("abi: {0} not found")]
    NotFound(String),

    /// Name present in neither the function nor the event table.
    #[error("abi: could not locate named method or event {0:?}")]
    MissingMethodOrEvent(String),

    /// A value does not fit the type it is being packed as.
    #[error("abi: cannot pack {found} as {expected}")]
    TypeMismatch { expected: String, found: String },

    /// Malformed, truncated or out-of-bounds input while unpacking.
    #[error("abi: cannot unpack: {0}")]
    Decode(String),

    /// Destination cannot hold the decoded values.
    #[error("abi: cannot copy into destination: {0}")]
    Shape(String),

    /// Revert payload is not an `Error(string)` encoding.
    #[error("abi: invalid revert data: {0}")]
    InvalidRevertData(String),

    /// Schema text is not valid JSON for the descriptor format.
    #[error("abi: malformed schema: {0}")]
    Json(#[from] serde_json::Error),
}

impl AbiError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    pub(crate) fn mismatch(expected: impl ToString, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}
