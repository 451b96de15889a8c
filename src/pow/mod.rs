//! Proof-of-work admission puzzle.
//!
//! # Data Flow
//! ```text
//! Issuer (proxy):
//!     Challenge::generate(d) → encode() → banner sent to client
//!
//! Client (jailpow):
//!     Challenge::decode(s) → solve() → "s.<y>" line sent back
//!
//! Issuer (proxy):
//!     Challenge::check(line) → admit or reject
//! ```
//!
//! # Puzzle
//! Arithmetic happens modulo the Mersenne prime `p = 2^1279 - 1`. Because
//! `p ≡ 3 (mod 4)`, `v^((p + 1) / 4)` is a square root of any quadratic
//! residue `v`. Solving takes `d` sequential square roots (a full modular
//! exponentiation each), verifying takes `d` squarings, so the prover pays
//! roughly 1277 times what the verifier pays and cannot parallelize.
//!
//! Every round flips the low bit of the value (`XOR 1`). This is part of the
//! wire contract with independent solver implementations and must not change.
//!
//! # Design Decisions
//! - No I/O in this module; callers own sockets and timing
//! - All decode failures collapse to a single `PowError` family so callers
//!   can treat them exactly like a wrong answer

pub mod challenge;
pub mod encoding;
pub mod error;

pub use challenge::{Challenge, Solution};
pub use error::PowError;

use std::sync::LazyLock;

use num_bigint::BigUint;
use num_traits::One;

/// Format tag leading every challenge and solution string.
pub const VERSION: &str = "s";

/// Size of the random seed drawn for a fresh challenge.
pub const SEED_BYTES: usize = 16;

/// The Mersenne prime `2^1279 - 1`.
pub static MODULUS: LazyLock<BigUint> = LazyLock::new(|| (BigUint::one() << 1279usize) - 1u32);

/// Square-root exponent `(p + 1) / 4 = 2^1277`.
pub static SQRT_EXPONENT: LazyLock<BigUint> = LazyLock::new(|| BigUint::one() << 1277usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_is_three_mod_four() {
        let four = BigUint::from(4u32);
        assert_eq!(&*MODULUS % &four, BigUint::from(3u32));
        assert_eq!(MODULUS.bits(), 1279);
    }

    #[test]
    fn exponent_matches_modulus() {
        let expected = (&*MODULUS + 1u32) >> 2usize;
        assert_eq!(*SQRT_EXPONENT, expected);
    }
}
