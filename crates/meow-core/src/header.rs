//! Block header record, binary codec and header hash dispatch.
//!
//! The header layout depends only on the timestamp:
//!
//! ```text
//! before KawPoW (80 bytes):
//!   version(4) | prev_hash(32) | merkle_root(32) | time(4) | bits(4) | nonce(4)
//! KawPoW and later (120 bytes):
//!   version(4) | prev_hash(32) | merkle_root(32) | time(4) | bits(4)
//!   | height(4) | nonce(8) | mix_hash(32)
//! ```
//!
//! All integers are little-endian and hashes are kept in wire order.

use std::sync::Arc;

use num_bigint::BigUint;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::codec::{ByteReader, ByteWriter};
use crate::difficulty::{compact_to_target, difficulty, difficulty_string};
use crate::error::{DecodeError, HeaderError, Result};
use crate::hash::{display_hex_to_bytes, double_sha256, hash_to_display_hex, HashBackends};
use crate::network::{
    ChainParams, Epoch, Network, KAWPOW_BOUNDARY, KAWPOW_HASHING_SIZE, KAWPOW_HEADER_SIZE,
    LEGACY_HEADER_SIZE, START_OF_HEADER,
};
use crate::pow::KawpowCheck;

/// Everything a header needs besides its own fields: consensus parameters,
/// the available hash back ends and the KawPoW proof-of-work rule.
#[derive(Debug, Clone, Default)]
pub struct ChainContext {
    pub params: ChainParams,
    pub hashers: HashBackends,
    pub kawpow_check: KawpowCheck,
}

impl ChainContext {
    /// Context for `network` with no hash back ends.
    pub fn new(network: Network) -> Self {
        Self::with_params(network.params())
    }

    pub fn with_params(params: ChainParams) -> Self {
        ChainContext {
            params,
            hashers: HashBackends::new(),
            kawpow_check: KawpowCheck::default(),
        }
    }

    pub fn with_hashers(mut self, hashers: HashBackends) -> Self {
        self.hashers = hashers;
        self
    }

    pub fn with_kawpow_check(mut self, check: KawpowCheck) -> Self {
        self.kawpow_check = check;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// The proof-of-work fields, one shape per layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowFields {
    /// X16R and X16Rv2 headers.
    Legacy { nonce: u32 },
    /// KawPoW headers carry the height and fold nonce and mix into the hash.
    KawPow {
        height: u32,
        nonce: u64,
        mix_hash: [u8; 32],
    },
}

/// A block header.
///
/// Immutable once built. The identifying hash is computed on first use and
/// cached; concurrent callers wait for a single computation.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    version: i32,
    prev_hash: [u8; 32],
    merkle_root: [u8; 32],
    time: u32,
    bits: u32,
    pow: PowFields,
    context: Arc<ChainContext>,
    id: OnceCell<String>,
}

impl BlockHeader {
    /// Build a header from its fields.
    ///
    /// `pow` must have the shape of the layout `time` selects.
    pub fn new(
        context: &Arc<ChainContext>,
        version: i32,
        prev_hash: [u8; 32],
        merkle_root: [u8; 32],
        time: u32,
        bits: u32,
        pow: PowFields,
    ) -> Result<Self> {
        let kawpow = context.params.epoch_at(time).is_kawpow();
        match (&pow, kawpow) {
            (PowFields::Legacy { .. }, true) => {
                return Err(DecodeError::MissingField { field: "mixHash", time }.into());
            }
            (PowFields::KawPow { .. }, false) => {
                return Err(DecodeError::InactiveField { field: "mixHash", time }.into());
            }
            _ => {}
        }

        Ok(BlockHeader {
            version,
            prev_hash,
            merkle_root,
            time,
            bits,
            pow,
            context: Arc::clone(context),
            id: OnceCell::new(),
        })
    }

    /// Parse a header from the start of `bytes`. Trailing data is ignored.
    pub fn from_bytes(bytes: &[u8], context: &Arc<ChainContext>) -> Result<Self> {
        Self::from_reader(&mut ByteReader::new(bytes), context)
    }

    /// Parse the header out of full-block wire data, skipping its 8-byte prefix.
    pub fn from_full_block_bytes(bytes: &[u8], context: &Arc<ChainContext>) -> Result<Self> {
        Self::from_reader(&mut ByteReader::at(bytes, START_OF_HEADER), context)
    }

    /// Parse a header from hex-encoded wire bytes.
    pub fn from_hex(hex_str: &str, context: &Arc<ChainContext>) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim()).map_err(|e| DecodeError::InvalidHex {
            field: "header",
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes, context)
    }

    /// Parse a header at the reader's position, leaving it after the header.
    pub fn from_reader(reader: &mut ByteReader<'_>, context: &Arc<ChainContext>) -> Result<Self> {
        let start = reader.position();
        let version = reader.read_i32_le()?;
        let prev_hash = reader.read_array::<32>()?;
        let merkle_root = reader.read_array::<32>()?;
        let time = reader.read_u32_le()?;
        let bits = reader.read_u32_le()?;

        let pow = if context.params.epoch_at(time).is_kawpow() {
            PowFields::KawPow {
                height: reader.read_u32_le()?,
                nonce: reader.read_u64_le()?,
                mix_hash: reader.read_array::<32>()?,
            }
        } else {
            PowFields::Legacy {
                nonce: reader.read_u32_le()?,
            }
        };

        trace!(
            offset = start,
            len = reader.position() - start,
            time,
            "decoded block header"
        );

        Self::new(context, version, prev_hash, merkle_root, time, bits, pow)
    }

    /// Build a header from its plain object form.
    ///
    /// If the object carries a `hash`, it must match the derived one.
    pub fn from_fields(fields: &HeaderFields, context: &Arc<ChainContext>) -> Result<Self> {
        let time = fields.time;
        let prev_hash = display_hex_to_bytes("prevHash", &fields.prev_hash)?;
        let merkle_root = display_hex_to_bytes("merkleRoot", &fields.merkle_root)?;

        let pow = if context.params.epoch_at(time).is_kawpow() {
            let height = fields
                .height
                .ok_or(DecodeError::MissingField { field: "height", time })?;
            let mix_hex = fields
                .mix_hash
                .as_deref()
                .ok_or(DecodeError::MissingField { field: "mixHash", time })?;
            PowFields::KawPow {
                height,
                nonce: fields.nonce,
                mix_hash: display_hex_to_bytes("mixHash", mix_hex)?,
            }
        } else {
            if fields.height.is_some() {
                return Err(DecodeError::InactiveField { field: "height", time }.into());
            }
            if fields.mix_hash.is_some() {
                return Err(DecodeError::InactiveField { field: "mixHash", time }.into());
            }
            let nonce =
                u32::try_from(fields.nonce).map_err(|_| DecodeError::NonceOverflow(fields.nonce))?;
            PowFields::Legacy { nonce }
        };

        let header = Self::new(
            context,
            fields.version,
            prev_hash,
            merkle_root,
            time,
            fields.bits,
            pow,
        )?;

        if let Some(supplied) = &fields.hash {
            let computed = header.id()?;
            if !computed.eq_ignore_ascii_case(supplied) {
                warn!(supplied = %supplied, computed = %computed, "header hash mismatch");
                return Err(HeaderError::HashMismatch {
                    supplied: supplied.clone(),
                    computed: computed.to_string(),
                });
            }
        }

        Ok(header)
    }

    /// Build a header from the JSON encoding of [`HeaderFields`].
    pub fn from_json(json: &str, context: &Arc<ChainContext>) -> Result<Self> {
        let fields: HeaderFields =
            serde_json::from_str(json).map_err(|e| DecodeError::Json(e.to_string()))?;
        Self::from_fields(&fields, context)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Previous block hash in wire order.
    pub fn prev_hash(&self) -> &[u8; 32] {
        &self.prev_hash
    }

    /// Merkle root in wire order.
    pub fn merkle_root(&self) -> &[u8; 32] {
        &self.merkle_root
    }

    pub fn time(&self) -> u32 {
        self.time
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn pow(&self) -> &PowFields {
        &self.pow
    }

    /// The nonce, widened to 64 bits for legacy headers.
    pub fn nonce(&self) -> u64 {
        match self.pow {
            PowFields::Legacy { nonce } => nonce as u64,
            PowFields::KawPow { nonce, .. } => nonce,
        }
    }

    /// Block height, present on KawPoW headers only.
    pub fn height(&self) -> Option<u32> {
        match self.pow {
            PowFields::Legacy { .. } => None,
            PowFields::KawPow { height, .. } => Some(height),
        }
    }

    /// Mix hash in wire order, present on KawPoW headers only.
    pub fn mix_hash(&self) -> Option<&[u8; 32]> {
        match &self.pow {
            PowFields::Legacy { .. } => None,
            PowFields::KawPow { mix_hash, .. } => Some(mix_hash),
        }
    }

    pub fn context(&self) -> &Arc<ChainContext> {
        &self.context
    }

    /// The proof-of-work epoch, decided by `time` alone.
    pub fn epoch(&self) -> Epoch {
        self.context.params.epoch_at(self.time)
    }

    /// Serialized size of this header.
    pub fn size(&self) -> usize {
        match self.pow {
            PowFields::Legacy { .. } => LEGACY_HEADER_SIZE,
            PowFields::KawPow { .. } => KAWPOW_HEADER_SIZE,
        }
    }

    /// Serialize the header in its wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.size());
        self.write_common(&mut writer);
        match &self.pow {
            PowFields::Legacy { nonce } => writer.write_u32_le(*nonce),
            PowFields::KawPow {
                height,
                nonce,
                mix_hash,
            } => {
                writer.write_u32_le(*height);
                writer.write_u64_le(*nonce);
                writer.write_bytes(mix_hash);
            }
        }
        let bytes = writer.into_bytes();
        debug_assert_eq!(bytes.len(), self.size());
        bytes
    }

    /// Hex encoding of [`to_bytes`](Self::to_bytes).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// The truncated header KawPoW hashes: everything up to and including
    /// the height, without nonce and mix hash.
    pub fn to_consensus_hashing_bytes(&self) -> Result<Vec<u8>> {
        let PowFields::KawPow { height, .. } = self.pow else {
            return Err(HeaderError::NotKawpow(self.time));
        };
        let mut writer = ByteWriter::with_capacity(KAWPOW_HASHING_SIZE);
        self.write_common(&mut writer);
        writer.write_u32_le(height);
        Ok(writer.into_bytes())
    }

    fn write_common(&self, writer: &mut ByteWriter) {
        writer.write_i32_le(self.version);
        writer.write_bytes(&self.prev_hash);
        writer.write_bytes(&self.merkle_root);
        writer.write_u32_le(self.time);
        writer.write_u32_le(self.bits);
    }

    /// The header identifier in display form, computed once per header.
    pub fn id(&self) -> Result<&str> {
        self.id
            .get_or_try_init(|| self.compute_id())
            .map(String::as_str)
    }

    /// Alias of [`id`](Self::id).
    pub fn hash(&self) -> Result<&str> {
        self.id()
    }

    fn compute_id(&self) -> Result<String> {
        let epoch = self.epoch();
        debug!(%epoch, time = self.time, "computing header hash");

        match epoch {
            Epoch::X16r | Epoch::X16rv2 => {
                let digest = self
                    .context
                    .hashers
                    .chained_digest(epoch, &self.to_bytes())
                    .map_err(|e| {
                        warn!(%epoch, error = %e, "header hash unavailable");
                        e
                    })?;
                Ok(hash_to_display_hex(&digest))
            }
            Epoch::KawPow => self.kawpow_id(),
        }
    }

    fn kawpow_id(&self) -> Result<String> {
        let PowFields::KawPow {
            nonce, mix_hash, ..
        } = self.pow
        else {
            return Err(HeaderError::NotKawpow(self.time));
        };

        let header_hash = hash_to_display_hex(&double_sha256(&self.to_consensus_hashing_bytes()?));
        let mix_hex = hash_to_display_hex(&mix_hash);
        let nonce_hex = format!("{:016x}", nonce);

        self.context
            .hashers
            .kawpow_verify(&header_hash, &mix_hex, &nonce_hex, KAWPOW_BOUNDARY)
            .map_err(|e| {
                warn!(error = %e, "KawPoW verification unavailable");
                e
            })
    }

    /// The target decoded from `bits`.
    pub fn target(&self) -> BigUint {
        compact_to_target(self.bits)
    }

    /// Difficulty relative to the network's genesis bits.
    pub fn difficulty(&self) -> Result<f64> {
        difficulty(self.bits, self.context.params.genesis_bits)
    }

    /// Difficulty rendered with 8 decimal places.
    pub fn difficulty_string(&self) -> Result<String> {
        difficulty_string(self.bits, self.context.params.genesis_bits)
    }

    /// The plain object form, including the derived hash.
    pub fn to_fields(&self) -> Result<HeaderFields> {
        let (height, mix_hash) = match &self.pow {
            PowFields::Legacy { .. } => (None, None),
            PowFields::KawPow {
                height, mix_hash, ..
            } => (Some(*height), Some(hash_to_display_hex(mix_hash))),
        };

        Ok(HeaderFields {
            hash: Some(self.id()?.to_string()),
            version: self.version,
            prev_hash: hash_to_display_hex(&self.prev_hash),
            merkle_root: hash_to_display_hex(&self.merkle_root),
            time: self.time,
            bits: self.bits,
            height,
            nonce: self.nonce(),
            mix_hash,
        })
    }
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.prev_hash == other.prev_hash
            && self.merkle_root == other.merkle_root
            && self.time == other.time
            && self.bits == other.bits
            && self.pow == other.pow
    }
}

impl Eq for BlockHeader {}

/// Plain object form of a header. Hashes are display-order hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub version: i32,
    pub prev_hash: String,
    pub merkle_root: String,
    pub time: u32,
    pub bits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub nonce: u64,
    #[serde(default, alias = "mix_hash", skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<String>,
}
