//! Session token generation and parsing.
//!
//! A session token is the two-part bearer string `"<id>.<secret>"`. Only the
//! id and a SHA-256 digest of the secret are ever stored server-side; the raw
//! secret exists transiently during creation and validation.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Separator between the public id and the secret in a token.
pub const TOKEN_SEPARATOR: char = '.';

/// Alphabet for session identifiers: lowercase letters minus the visually
/// confusable `l` and `o`, plus digits 2-9. 32 symbols, so one character
/// encodes the top 5 bits of a random byte.
const IDENTIFIER_ALPHABET: &[u8; 32] = b"abcdefghijkmnpqrstuvwxyz23456789";

/// Number of random bytes (and output characters) per identifier.
const IDENTIFIER_LENGTH: usize = 24;

/// Generate a 24-character random identifier from the unambiguous alphabet.
///
/// Drawn from 24 bytes of CSPRNG output, one character per byte. Used for
/// both session ids and session secrets.
pub fn generate_identifier() -> String {
    let bytes: [u8; IDENTIFIER_LENGTH] = rand::rng().random();

    bytes
        .iter()
        .map(|&b| IDENTIFIER_ALPHABET[(b >> 3) as usize] as char)
        .collect()
}

/// SHA-256 digest of a session secret.
pub fn hash_secret(secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Compare two digests without leaking where they first differ.
///
/// Length mismatch returns false immediately; equal-length inputs are
/// compared without short-circuiting on the first differing byte.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Join an id and secret into the client-facing token string.
pub fn format_token(id: &str, secret: &str) -> String {
    format!("{}{}{}", id, TOKEN_SEPARATOR, secret)
}

/// Split a token into its id and secret parts.
///
/// Returns None unless the token contains exactly two non-empty parts.
/// Attacker-supplied garbage parses to None, never an error.
pub fn parse_token(token: &str) -> Option<(&str, &str)> {
    let mut parts = token.split(TOKEN_SEPARATOR);
    let id = parts.next()?;
    let secret = parts.next()?;

    if id.is_empty() || secret.is_empty() || parts.next().is_some() {
        return None;
    }

    Some((id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_identifier_shape() {
        let id = generate_identifier();
        assert_eq!(id.len(), 24);
        assert!(id.bytes().all(|b| IDENTIFIER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_identifier_excludes_confusable_chars() {
        for _ in 0..64 {
            let id = generate_identifier();
            assert!(!id.contains('l'));
            assert!(!id.contains('o'));
            assert!(!id.contains('0'));
            assert!(!id.contains('1'));
        }
    }

    #[test]
    fn test_hash_secret_known_digest() {
        // SHA-256("abc")
        assert_eq!(
            hex::encode(hash_secret("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abcdef", b"abcdef"));
        assert!(!constant_time_eq(b"abcdef", b"abcdeg"));
        assert!(!constant_time_eq(b"zbcdef", b"abcdef"));
        assert!(!constant_time_eq(b"abc", b"abcdef"));
        assert!(!constant_time_eq(b"abcdef", b""));
    }

    #[test]
    fn test_token_round_trip() {
        let id = generate_identifier();
        let secret = generate_identifier();
        let token = format_token(&id, &secret);

        assert_eq!(parse_token(&token), Some((id.as_str(), secret.as_str())));
    }

    #[test]
    fn test_parse_token_rejects_malformed() {
        assert_eq!(parse_token(""), None);
        assert_eq!(parse_token("nodot"), None);
        assert_eq!(parse_token("."), None);
        assert_eq!(parse_token("id."), None);
        assert_eq!(parse_token(".secret"), None);
        assert_eq!(parse_token("id.secret.extra"), None);
    }
}
