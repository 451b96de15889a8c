//! Challenge generation, solving, and verification.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::One;
use rand::{rngs::OsRng, RngCore};

use super::encoding::{
    decode_difficulty, decode_uint, encode_difficulty, encode_uint, split_fields,
};
use super::{PowError, MODULUS, SEED_BYTES, SQRT_EXPONENT, VERSION};

/// A puzzle instance: `difficulty` sequential rounds starting from `seed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    difficulty: u32,
    seed: BigUint,
}

impl Challenge {
    /// Draw a fresh 128-bit seed from the OS random source.
    pub fn generate(difficulty: u32) -> Self {
        let mut bytes = [0u8; SEED_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self {
            difficulty,
            seed: BigUint::from_bytes_be(&bytes),
        }
    }

    /// Build a challenge from known parts.
    pub fn new(difficulty: u32, seed: BigUint) -> Result<Self, PowError> {
        if seed >= *MODULUS {
            return Err(PowError::SeedOutOfRange);
        }
        Ok(Self { difficulty, seed })
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn seed(&self) -> &BigUint {
        &self.seed
    }

    /// `s.<difficulty>.<seed>`
    pub fn encode(&self) -> String {
        format!(
            "{}.{}.{}",
            VERSION,
            encode_difficulty(self.difficulty),
            encode_uint(&self.seed)
        )
    }

    pub fn decode(input: &str) -> Result<Self, PowError> {
        let [difficulty, seed] = split_fields::<2>(input)?;
        let difficulty = decode_difficulty(difficulty)?;
        let seed = decode_uint(seed)?;
        Self::new(difficulty, seed)
    }

    /// Compute the solution. Cost grows linearly with difficulty and each
    /// round is a full modular exponentiation.
    pub fn solve(&self) -> Solution {
        let one = BigUint::one();
        let mut x = self.seed.clone();
        for _ in 0..self.difficulty {
            x = x.modpow(&SQRT_EXPONENT, &MODULUS);
            x ^= &one;
        }
        Solution(x)
    }

    /// Verify an encoded solution line.
    ///
    /// `Ok(false)` for a well-formed wrong answer, `Err` for a malformed one.
    pub fn check(&self, solution: &str) -> Result<bool, PowError> {
        let solution = Solution::decode(solution)?;
        Ok(self.verify(&solution))
    }

    /// Square back `difficulty` times; either square root of the seed is accepted.
    pub fn verify(&self, solution: &Solution) -> bool {
        let one = BigUint::one();
        let mut y = solution.0.clone();
        for _ in 0..self.difficulty {
            y ^= &one;
            y = (&y * &y) % &*MODULUS;
        }
        y == self.seed || y == &*MODULUS - &self.seed
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Challenge {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// The value a client sends back, `s.<y>` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution(BigUint);

impl Solution {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", VERSION, encode_uint(&self.0))
    }

    pub fn decode(input: &str) -> Result<Self, PowError> {
        let [value] = split_fields::<1>(input)?;
        Ok(Self(decode_uint(value)?))
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Solution {
    type Err = PowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
