//! Core error types used across the system

use thiserror::Error;

/// Errors produced by the base62 identifier codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Cannot decode an empty identifier")]
    Empty,

    #[error("Invalid base62 character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl CoreError {
    pub fn invalid_identifier(input: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier(input.into())
    }
}
