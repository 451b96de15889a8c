//! Puzzle encoding errors.

use thiserror::Error;

/// Malformed challenge or solution encoding.
///
/// Callers must not reveal which variant occurred to a remote peer.
#[derive(Debug, Error)]
pub enum PowError {
    #[error("incorrect version")]
    Version,

    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("difficulty too long: {0} bytes")]
    DifficultyTooLong(usize),

    #[error("difficulty {0} does not fit in 32 bits")]
    DifficultyOverflow(u64),

    #[error("seed is not reduced modulo the puzzle prime")]
    SeedOutOfRange,
}
