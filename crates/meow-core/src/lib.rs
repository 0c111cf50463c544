//! Block header consensus logic for Meowcoin.
//!
//! This crate provides:
//! - Block header decoding and encoding across the X16R, X16Rv2 and KawPoW layouts
//! - Compact difficulty target conversion and difficulty rendering
//! - Header hash dispatch to host-provided proof-of-work back ends
//! - Timestamp and proof-of-work validation
//!
//! ```no_run
//! use meow_core::{BlockHeader, ChainContext, HashBackends, Network};
//!
//! # fn x16r(data: &[u8]) -> [u8; 32] { unimplemented!() }
//! # let raw = [0u8; 80];
//! let context = ChainContext::new(Network::Mainnet)
//!     .with_hashers(HashBackends::new().with_x16r(x16r))
//!     .shared();
//! let header = BlockHeader::from_bytes(&raw, &context)?;
//! println!("{} valid={}", header.id()?, header.valid_proof_of_work()?);
//! # Ok::<(), meow_core::HeaderError>(())
//! ```

pub mod codec;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod header;
pub mod network;
pub mod pow;

pub use codec::{ByteReader, ByteWriter};
pub use difficulty::{compact_to_target, difficulty, target_to_compact};
pub use error::{BackendError, DecodeError, HeaderError};
pub use hash::{double_sha256, HashBackends, HeaderHasher, KawpowVerifier};
pub use header::{BlockHeader, ChainContext, HeaderFields, PowFields};
pub use network::{ChainParams, Epoch, Network};
pub use pow::KawpowCheck;
