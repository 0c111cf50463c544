//! Meowcoin network definitions and consensus constants.

use serde::{Deserialize, Serialize};

/// Meowcoin network type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Meowcoin mainnet
    #[default]
    Mainnet,
    /// Meowcoin testnet
    Testnet,
}

impl Network {
    /// Consensus parameters for this network.
    pub fn params(&self) -> ChainParams {
        match self {
            Network::Mainnet => ChainParams {
                genesis_bits: GENESIS_BITS,
                x16rv2_activation: 1_569_945_600,
                kawpow_activation: 1_588_788_000,
            },
            Network::Testnet => ChainParams {
                genesis_bits: GENESIS_BITS,
                x16rv2_activation: 1_567_533_600,
                kawpow_activation: 1_585_159_200,
            },
        }
    }

    /// Parse network from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "meowcoin" => Some(Network::Mainnet),
            "testnet" | "test" => Some(Network::Testnet),
            _ => None,
        }
    }

    /// Get network name as string.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl core::fmt::Display for Network {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Proof-of-work epoch. Ordered by activation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Epoch {
    X16r,
    X16rv2,
    KawPow,
}

impl Epoch {
    pub fn name(&self) -> &'static str {
        match self {
            Epoch::X16r => "X16R",
            Epoch::X16rv2 => "X16Rv2",
            Epoch::KawPow => "KawPoW",
        }
    }

    /// Whether headers in this epoch use the extended 120-byte layout.
    pub fn is_kawpow(&self) -> bool {
        matches!(self, Epoch::KawPow)
    }
}

impl core::fmt::Display for Epoch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-network consensus parameters consumed by the header layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    /// Compact bits of the genesis block, the difficulty-1 reference.
    pub genesis_bits: u32,
    /// First timestamp hashed with X16Rv2.
    pub x16rv2_activation: u32,
    /// First timestamp using the KawPoW layout and hash.
    pub kawpow_activation: u32,
}

impl ChainParams {
    /// The epoch a header with this timestamp belongs to.
    ///
    /// This is the only input to layout and algorithm selection.
    pub fn epoch_at(&self, time: u32) -> Epoch {
        if time >= self.kawpow_activation {
            Epoch::KawPow
        } else if time >= self.x16rv2_activation {
            Epoch::X16rv2
        } else {
            Epoch::X16r
        }
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Network::Mainnet.params()
    }
}

/// Compact bits of the genesis block on every network.
pub const GENESIS_BITS: u32 = 0x1d00ffff;

/// Size of a pre-KawPoW block header in bytes.
pub const LEGACY_HEADER_SIZE: usize = 80;

/// Size of a KawPoW block header in bytes.
pub const KAWPOW_HEADER_SIZE: usize = 120;

/// Size of the truncated header KawPoW hashes before folding in nonce and mix.
pub const KAWPOW_HASHING_SIZE: usize = 80;

/// Offset of the header inside full-block wire data.
pub const START_OF_HEADER: usize = 8;

/// How far a timestamp may be ahead of the local clock, in seconds.
pub const MAX_TIME_OFFSET: u32 = 2 * 60 * 60;

/// Boundary handed to the KawPoW light verifier. Accepts any final hash.
pub const KAWPOW_BOUNDARY: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
