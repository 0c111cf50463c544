//! Compact difficulty target conversion and difficulty rendering.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::{HeaderError, Result};

/// Decimal places kept by the fixed-point difficulty computation.
const DIFFICULTY_DECIMALS: usize = 8;

/// 10^8, the fixed-point scale matching `DIFFICULTY_DECIMALS`.
const DIFFICULTY_SCALE: u32 = 100_000_000;

/// Convert compact "bits" representation to a target.
///
/// The bits format is: [exponent (1 byte)][mantissa (3 bytes)]
/// Target = mantissa * 256^(exponent - 3)
///
/// All 24 mantissa bits are used and exponents of 3 or less leave the
/// mantissa unshifted.
pub fn compact_to_target(bits: u32) -> BigUint {
    let exponent = bits >> 24;
    let mantissa = BigUint::from(bits & 0x00ff_ffff);

    if exponent <= 3 {
        return mantissa;
    }
    mantissa << (8 * (exponent as usize - 3))
}

/// Convert a target back to compact "bits" representation.
///
/// This is the inverse of `compact_to_target` for normalized bits.
pub fn target_to_compact(target: &BigUint) -> u32 {
    if target.is_zero() {
        return 0;
    }

    // Number of significant bytes
    let mut size = ((target.bits() + 7) / 8) as u32;

    let mut mantissa = if size <= 3 {
        target.to_u32().unwrap_or(0) << (8 * (3 - size))
    } else {
        (target >> (8 * (size as usize - 3))).to_u32().unwrap_or(0)
    };

    // Keep the top mantissa bit clear so the value does not read as negative
    if mantissa & 0x0080_0000 != 0 {
        mantissa >>= 8;
        size += 1;
    }

    (size << 24) | (mantissa & 0x007f_ffff)
}

/// Check if a proof value meets the difficulty target.
///
/// Returns true if proof <= target.
#[inline]
pub fn hash_meets_target(proof: &BigUint, target: &BigUint) -> bool {
    proof <= target
}

/// Render the difficulty of `bits` relative to `genesis_bits` with 8 decimals.
///
/// The genesis target is scaled by 10^8 before the integer division so no
/// precision is lost to floating point.
pub fn difficulty_string(bits: u32, genesis_bits: u32) -> Result<String> {
    let current = compact_to_target(bits);
    if current.is_zero() {
        return Err(HeaderError::ZeroTarget(bits));
    }
    let scaled = compact_to_target(genesis_bits) * BigUint::from(DIFFICULTY_SCALE);
    let digits = (scaled / current).to_str_radix(10);

    // Ratios below 1.0 have fewer digits than the decimal position
    let padded = if digits.len() <= DIFFICULTY_DECIMALS {
        format!("{:0>width$}", digits, width = DIFFICULTY_DECIMALS + 1)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - DIFFICULTY_DECIMALS);
    Ok(format!("{}.{}", int_part, frac_part))
}

/// Difficulty of `bits` relative to `genesis_bits`.
pub fn difficulty(bits: u32, genesis_bits: u32) -> Result<f64> {
    let rendered = difficulty_string(bits, genesis_bits)?;
    rendered
        .parse::<f64>()
        .map_err(|_| HeaderError::DifficultyFormat(rendered))
}

/// Format difficulty for display (e.g., "1.23T" for trillion).
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty >= 1e15 {
        format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        format!("{:.2}K", difficulty / 1e3)
    } else {
        format!("{:.2}", difficulty)
    }
}
