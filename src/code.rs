//! Session code generation and parsing
//!
//! This module provides the short human-typable codes participants use to
//! join a live session. Codes are six uppercase alphanumeric characters,
//! drawn from a cryptographically strong random source and retried against
//! the caller's registry until an unused one is found.

use std::{fmt::Display, str::FromStr};

use rand::Rng;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

use crate::constants::code::{ALPHABET, LENGTH};

/// The public identifier participants type to join a live session
///
/// Always held in its canonical uppercase form; parsing accepts lowercase
/// input since codes are typed by hand.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct SessionCode(String);

/// Errors that can occur when parsing a session code
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The code does not have exactly [`LENGTH`] characters
    #[error("session code must be {LENGTH} characters long")]
    WrongLength,
    /// The code contains a character outside the allowed alphabet
    #[error("session code may only contain A-Z and 0-9")]
    InvalidCharacter,
}

impl SessionCode {
    /// Generates a fresh code not currently taken according to `is_taken`
    ///
    /// The uniqueness check is injected by the caller; this function is
    /// stateless and keeps drawing codes until the check passes. It gives no
    /// guarantee against a racing generator producing the same code, so the
    /// caller's registry remains the final authority when the code is
    /// actually claimed.
    pub fn generate<F: Fn(&SessionCode) -> bool>(is_taken: F) -> Self {
        let mut rng = rand::rng();
        loop {
            let code = Self(
                (0..LENGTH)
                    .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
                    .collect(),
            );
            if !is_taken(&code) {
                return code;
            }
        }
    }

    /// Returns the code as its canonical uppercase string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionCode {
    type Err = Error;

    /// Parses a session code, normalizing it to uppercase
    ///
    /// # Errors
    ///
    /// Returns [`Error::WrongLength`] or [`Error::InvalidCharacter`] when
    /// the input is not a well-formed code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.chars().count() != LENGTH {
            return Err(Error::WrongLength);
        }
        if !code.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(Error::InvalidCharacter);
        }
        Ok(Self(code))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generated_codes_use_declared_alphabet() {
        for _ in 0..100 {
            let code = SessionCode::generate(|_| false);
            assert_eq!(code.as_str().len(), LENGTH);
            assert!(code.as_str().bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_generating_against_rejecting_store_yields_unique_codes() {
        let mut taken: HashSet<SessionCode> = HashSet::new();
        for _ in 0..10_000 {
            let code = SessionCode::generate(|c| taken.contains(c));
            assert!(taken.insert(code));
        }
        assert_eq!(taken.len(), 10_000);
    }

    #[test]
    fn test_generate_skips_taken_codes() {
        let first = SessionCode::generate(|_| false);
        let second = SessionCode::generate(|c| *c == first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let code: SessionCode = "ab12cd".parse().unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("ABC".parse::<SessionCode>(), Err(Error::WrongLength));
        assert_eq!("ABCDEFG".parse::<SessionCode>(), Err(Error::WrongLength));
        assert_eq!("AB-12!".parse::<SessionCode>(), Err(Error::InvalidCharacter));
        assert_eq!("".parse::<SessionCode>(), Err(Error::WrongLength));
    }

    #[test]
    fn test_code_serializes_as_string() {
        let code: SessionCode = "AB12CD".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"AB12CD\"");

        let parsed: SessionCode = serde_json::from_str("\"ab12cd\"").unwrap();
        assert_eq!(parsed, code);
    }
}
