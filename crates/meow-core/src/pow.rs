//! Timestamp and proof-of-work validation.
//!
//! X16R and X16Rv2 headers are valid when their hash, read as a 256-bit
//! little-endian integer, does not exceed the target from `bits`.
//!
//! KawPoW has no numeric rule at this layer. What counts as valid is set
//! per context with [`KawpowCheck`]; the default refuses to answer.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigUint;
use tracing::{debug, warn};

use crate::difficulty::hash_meets_target;
use crate::error::{BackendError, HeaderError, Result};
use crate::header::BlockHeader;
use crate::network::{Epoch, MAX_TIME_OFFSET};

/// Custom KawPoW proof-of-work rule.
pub type KawpowRule = Arc<dyn Fn(&BlockHeader) -> Result<bool> + Send + Sync>;

/// How `valid_proof_of_work` treats KawPoW headers.
#[derive(Clone, Default)]
pub enum KawpowCheck {
    /// Fail with [`HeaderError::UnresolvedKawpowCheck`].
    #[default]
    Unresolved,
    /// Compare the verifier's final hash against the target like earlier epochs.
    VerifierHash,
    /// Delegate to a caller-supplied rule.
    Custom(KawpowRule),
}

impl KawpowCheck {
    pub fn custom<F>(rule: F) -> Self
    where
        F: Fn(&BlockHeader) -> Result<bool> + Send + Sync + 'static,
    {
        KawpowCheck::Custom(Arc::new(rule))
    }
}

impl fmt::Debug for KawpowCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KawpowCheck::Unresolved => f.write_str("Unresolved"),
            KawpowCheck::VerifierHash => f.write_str("VerifierHash"),
            KawpowCheck::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl BlockHeader {
    /// False if the header claims a time more than two hours past `now`.
    pub fn valid_timestamp(&self, now: u32) -> bool {
        u64::from(self.time()) <= u64::from(now) + u64::from(MAX_TIME_OFFSET)
    }

    /// [`valid_timestamp`](Self::valid_timestamp) against the system clock.
    pub fn valid_timestamp_now(&self) -> bool {
        self.valid_timestamp(current_timestamp())
    }

    /// Whether the header's hash satisfies the target encoded in `bits`.
    pub fn valid_proof_of_work(&self) -> Result<bool> {
        let epoch = self.epoch();
        let proof = match epoch {
            Epoch::X16r | Epoch::X16rv2 => proof_value(epoch, self.id()?)?,
            Epoch::KawPow => match &self.context().kawpow_check {
                KawpowCheck::Unresolved => {
                    warn!(time = self.time(), "no KawPoW proof-of-work rule configured");
                    return Err(HeaderError::UnresolvedKawpowCheck);
                }
                KawpowCheck::VerifierHash => proof_value(epoch, self.id()?)?,
                KawpowCheck::Custom(rule) => return rule(self),
            },
        };

        let valid = hash_meets_target(&proof, &self.target());
        debug!(%epoch, bits = self.bits(), valid, "checked proof of work");
        Ok(valid)
    }
}

/// Read a display-order hash as a big-endian integer.
fn proof_value(epoch: Epoch, display_hex: &str) -> Result<BigUint> {
    BigUint::parse_bytes(display_hex.as_bytes(), 16).ok_or_else(|| HeaderError::Backend {
        epoch,
        source: BackendError::new(format!("hash {:?} is not hex", display_hex)),
    })
}

/// Get the current Unix timestamp.
fn current_timestamp() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().min(u64::from(u32::MAX)) as u32)
        .unwrap_or(0)
}
