//! Wire encoding shared by challenges and solutions.
//!
//! Both are dot-separated records: a version tag followed by standard,
//! padded base64 fields. Integers are written as their minimal big-endian
//! bytes, so zero is an empty field.

use base64::{
    alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use num_bigint::BigUint;

use super::{PowError, VERSION};

/// Padded standard base64 that tolerates non-zero trailing bits on decode,
/// matching what other solvers on the wire accept. Encoding stays canonical.
const WIRE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Split `input` into exactly `N` dot-separated fields and check the version tag.
///
/// Returns the fields after the tag.
pub fn split_fields<const N: usize>(input: &str) -> Result<[&str; N], PowError> {
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != N + 1 {
        return Err(PowError::Arity {
            expected: N + 1,
            found: parts.len(),
        });
    }
    if parts[0] != VERSION {
        return Err(PowError::Version);
    }

    let mut fields = [""; N];
    fields.copy_from_slice(&parts[1..]);
    Ok(fields)
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    WIRE.encode(bytes)
}

pub fn decode_bytes(field: &str) -> Result<Vec<u8>, PowError> {
    Ok(WIRE.decode(field)?)
}

/// Minimal big-endian representation; zero has no bytes.
pub fn minimal_bytes(value: &BigUint) -> Vec<u8> {
    if value.bits() == 0 {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

pub fn encode_uint(value: &BigUint) -> String {
    encode_bytes(&minimal_bytes(value))
}

pub fn decode_uint(field: &str) -> Result<BigUint, PowError> {
    Ok(BigUint::from_bytes_be(&decode_bytes(field)?))
}

/// Difficulty is written as a fixed 4-byte big-endian field.
pub fn encode_difficulty(difficulty: u32) -> String {
    encode_bytes(&difficulty.to_be_bytes())
}

/// Shorter fields are zero-padded on the left. Up to 8 bytes are accepted as
/// long as the value still fits in 32 bits.
pub fn decode_difficulty(field: &str) -> Result<u32, PowError> {
    let bytes = decode_bytes(field)?;
    if bytes.len() > 8 {
        return Err(PowError::DifficultyTooLong(bytes.len()));
    }

    let mut padded = [0u8; 8];
    padded[8 - bytes.len()..].copy_from_slice(&bytes);
    let value = u64::from_be_bytes(padded);
    u32::try_from(value).map_err(|_| PowError::DifficultyOverflow(value))
}
