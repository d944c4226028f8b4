//! Base62 identifier codec
//!
//! Maps a 128-bit identifier to a compact, URL-friendly string and back.
//! The identifier is read as a big-endian unsigned integer and written
//! most-significant digit first using the alphabet `0-9A-Za-z`.
//!
//! Output is not padded, so encoded strings do not sort like the
//! identifiers they represent.
//!
//! # Example
//!
//! ```rust
//! use core_kernel::base62;
//! use uuid::Uuid;
//!
//! let id = Uuid::new_v4();
//! let encoded = base62::encode(id);
//! assert_eq!(base62::decode(&encoded).unwrap(), id);
//! assert_eq!(base62::encode(Uuid::nil()), "0");
//! ```

use uuid::Uuid;

use crate::error::CodecError;

/// The 62 symbols, ordered by digit value
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

const BASE: u128 = 62;

/// Longest possible encoding of a 128-bit value
const MAX_DIGITS: usize = 22;

/// Encodes an identifier as a base62 string
///
/// The nil identifier encodes to `"0"`.
pub fn encode(id: Uuid) -> String {
    let mut value = u128::from_be_bytes(*id.as_bytes());
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(MAX_DIGITS);
    while value > 0 {
        digits.push(ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();

    // Every byte comes from ALPHABET, which is ASCII.
    digits.into_iter().map(char::from).collect()
}

/// Decodes a base62 string back into an identifier
///
/// Values wider than 128 bits keep only their low 16 bytes; narrower
/// values are left-padded with zeros.
///
/// # Errors
///
/// * `CodecError::Empty` if the input is empty
/// * `CodecError::InvalidCharacter` for any character outside the alphabet
pub fn decode(input: &str) -> Result<Uuid, CodecError> {
    if input.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut acc: u128 = 0;
    for (position, character) in input.chars().enumerate() {
        let digit = digit_value(character)
            .ok_or(CodecError::InvalidCharacter { character, position })?;
        acc = acc.wrapping_mul(BASE).wrapping_add(u128::from(digit));
    }

    Ok(Uuid::from_bytes(acc.to_be_bytes()))
}

fn digit_value(character: char) -> Option<u8> {
    match character {
        '0'..='9' => Some(character as u8 - b'0'),
        'A'..='Z' => Some(character as u8 - b'A' + 10),
        'a'..='z' => Some(character as u8 - b'a' + 36),
        _ => None,
    }
}
