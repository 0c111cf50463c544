//! Error types for header decoding, hashing and validation.

use thiserror::Error;

use crate::network::Epoch;

/// Failures while turning bytes, hex or plain objects into a header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer ended before a field could be read.
    #[error("truncated header: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A hex string could not be decoded.
    #[error("invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    /// A hash field did not decode to exactly 32 bytes.
    #[error("{field} must be 32 bytes, got {len}")]
    InvalidHashLength { field: &'static str, len: usize },

    /// A field required by the layout active at `time` is missing.
    #[error("field {field} is required for headers at time {time}")]
    MissingField { field: &'static str, time: u32 },

    /// A field belonging to the other layout was supplied.
    #[error("field {field} does not belong to the layout active at time {time}")]
    InactiveField { field: &'static str, time: u32 },

    /// A pre-KawPoW nonce must fit in 32 bits.
    #[error("legacy nonce {0} does not fit in 32 bits")]
    NonceOverflow(u64),

    /// The JSON form of a header could not be parsed.
    #[error("invalid header json: {0}")]
    Json(String),
}

/// Error raised by a hash back end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError(message.into())
    }
}

/// Top-level error for header operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The hash carried by a plain object disagrees with the derived one.
    #[error("header hash mismatch: supplied {supplied}, computed {computed}")]
    HashMismatch { supplied: String, computed: String },

    /// The back end for the header's epoch was not provided.
    #[error("{0} hash back end is not available in this runtime")]
    UnsupportedAlgorithm(Epoch),

    /// The back end was present but failed.
    #[error("{epoch} hash back end failed: {source}")]
    Backend {
        epoch: Epoch,
        #[source]
        source: BackendError,
    },

    /// Consensus hashing bytes only exist for the KawPoW layout.
    #[error("header at time {0} predates KawPoW and has no consensus hashing form")]
    NotKawpow(u32),

    /// The compact bits decode to a zero target.
    #[error("compact bits {0:#010x} decode to a zero target")]
    ZeroTarget(u32),

    /// The fixed-point difficulty rendering could not be parsed back.
    #[error("difficulty {0} is not a valid decimal")]
    DifficultyFormat(String),

    /// No proof-of-work rule is configured for KawPoW headers.
    #[error("KawPoW proof-of-work check is unresolved; configure a KawpowCheck on the chain context")]
    UnresolvedKawpowCheck,
}

pub type Result<T> = std::result::Result<T, HeaderError>;
