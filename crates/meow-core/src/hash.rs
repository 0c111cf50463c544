//! SHA256 helpers, byte-order conversion and the proof-of-work hash back ends.
//!
//! X16R, X16Rv2 and KawPoW are provided by the host as implementations of
//! [`HeaderHasher`] and [`KawpowVerifier`], collected in a [`HashBackends`]
//! table. A header whose epoch has no entry fails with
//! [`HeaderError::UnsupportedAlgorithm`]; no other algorithm is substituted.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::{BackendError, DecodeError, HeaderError, Result};
use crate::network::Epoch;

/// Bitcoin's double SHA256: SHA256(SHA256(data)).
///
/// Used for the KawPoW header hash.
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Single SHA256 hash.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

/// Reverse the byte order of a 32-byte array.
///
/// Hashes are stored in wire order and displayed reversed.
#[inline]
pub fn reverse_bytes(bytes: &[u8; 32]) -> [u8; 32] {
    let mut reversed = *bytes;
    reversed.reverse();
    reversed
}

/// Convert a wire-order hash to its display format (reversed hex).
pub fn hash_to_display_hex(hash: &[u8; 32]) -> String {
    hex::encode(reverse_bytes(hash))
}

/// Parse a display-format hash back into wire order.
pub fn display_hex_to_bytes(
    field: &'static str,
    display: &str,
) -> std::result::Result<[u8; 32], DecodeError> {
    let bytes = hex::decode(display).map_err(|e| DecodeError::InvalidHex {
        field,
        reason: e.to_string(),
    })?;
    if bytes.len() != 32 {
        return Err(DecodeError::InvalidHashLength {
            field,
            len: bytes.len(),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(reverse_bytes(&out))
}

/// A chained proof-of-work hash over the full serialized header (X16R, X16Rv2).
pub trait HeaderHasher: Send + Sync {
    /// Hash `data`, returning the digest in wire order.
    fn digest(&self, data: &[u8]) -> std::result::Result<[u8; 32], BackendError>;
}

impl<F> HeaderHasher for F
where
    F: Fn(&[u8]) -> [u8; 32] + Send + Sync,
{
    fn digest(&self, data: &[u8]) -> std::result::Result<[u8; 32], BackendError> {
        Ok(self(data))
    }
}

/// The KawPoW light verifier.
///
/// All arguments are lowercase hex: the reversed SHA256d of the consensus
/// hashing bytes, the reversed mix hash, the 16-character big-endian nonce
/// and the boundary. Returns the final header hash in display form.
pub trait KawpowVerifier: Send + Sync {
    fn light_verify(
        &self,
        header_hash: &str,
        mix_hash: &str,
        nonce: &str,
        boundary: &str,
    ) -> std::result::Result<String, BackendError>;
}

/// Resolved table of the hash back ends available to this runtime.
#[derive(Clone, Default)]
pub struct HashBackends {
    x16r: Option<Arc<dyn HeaderHasher>>,
    x16rv2: Option<Arc<dyn HeaderHasher>>,
    kawpow: Option<Arc<dyn KawpowVerifier>>,
}

impl HashBackends {
    /// An empty table. Every hash request fails until entries are added.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_x16r(mut self, hasher: impl HeaderHasher + 'static) -> Self {
        self.x16r = Some(Arc::new(hasher));
        self
    }

    pub fn with_x16rv2(mut self, hasher: impl HeaderHasher + 'static) -> Self {
        self.x16rv2 = Some(Arc::new(hasher));
        self
    }

    pub fn with_kawpow(mut self, verifier: impl KawpowVerifier + 'static) -> Self {
        self.kawpow = Some(Arc::new(verifier));
        self
    }

    /// Whether the back end for `epoch` is present.
    pub fn supports(&self, epoch: Epoch) -> bool {
        match epoch {
            Epoch::X16r => self.x16r.is_some(),
            Epoch::X16rv2 => self.x16rv2.is_some(),
            Epoch::KawPow => self.kawpow.is_some(),
        }
    }

    /// Run the chained hash for a pre-KawPoW epoch.
    pub(crate) fn chained_digest(&self, epoch: Epoch, data: &[u8]) -> Result<[u8; 32]> {
        let hasher = match epoch {
            Epoch::X16r => self.x16r.as_ref(),
            Epoch::X16rv2 => self.x16rv2.as_ref(),
            Epoch::KawPow => None,
        }
        .ok_or(HeaderError::UnsupportedAlgorithm(epoch))?;

        hasher
            .digest(data)
            .map_err(|source| HeaderError::Backend { epoch, source })
    }

    /// Run the KawPoW light verifier.
    pub(crate) fn kawpow_verify(
        &self,
        header_hash: &str,
        mix_hash: &str,
        nonce: &str,
        boundary: &str,
    ) -> Result<String> {
        let verifier = self
            .kawpow
            .as_ref()
            .ok_or(HeaderError::UnsupportedAlgorithm(Epoch::KawPow))?;

        verifier
            .light_verify(header_hash, mix_hash, nonce, boundary)
            .map_err(|source| HeaderError::Backend {
                epoch: Epoch::KawPow,
                source,
            })
    }
}

impl fmt::Debug for HashBackends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashBackends")
            .field("x16r", &self.x16r.is_some())
            .field("x16rv2", &self.x16rv2.is_some())
            .field("kawpow", &self.kawpow.is_some())
            .finish()
    }
}
