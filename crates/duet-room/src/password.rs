//! Password hashing and credential generation.
//!
//! Room passwords are low-value shared secrets for pairing, not account
//! credentials, so a salted SHA-256 digest is the stored form. The
//! plaintext is returned exactly once, in the create-room ack, and never
//! kept.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Characters used for auto-generated room codes. Ambiguous glyphs
/// (0/O, 1/I/L) are excluded so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Characters used for auto-generated passwords.
const PASSWORD_ALPHABET: &[u8] = b"abcdefghijkmnpqrstuvwxyz23456789";

/// A salted password digest, stored as `"{salt_hex}${digest_hex}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes a plaintext password with a fresh 16-byte random salt.
    pub fn new(plain: &str) -> Self {
        let mut rng = rand::rng();
        let salt: [u8; 16] = rng.random();
        let digest = digest_with_salt(&salt, plain);
        Self(format!("{}${}", to_hex(&salt), to_hex(&digest)))
    }

    /// Verifies a plaintext password against the stored digest.
    pub fn verify(&self, plain: &str) -> bool {
        let Some((salt_hex, digest_hex)) = self.0.split_once('$') else {
            return false;
        };
        let Some(salt) = from_hex(salt_hex) else {
            return false;
        };
        let recomputed = to_hex(&digest_with_salt(&salt, plain));
        // Length is fixed, so comparing hex strings byte-by-byte without
        // early exit keeps the comparison time independent of the prefix.
        let stored = digest_hex.as_bytes();
        let candidate = recomputed.as_bytes();
        if stored.len() != candidate.len() {
            return false;
        }
        stored
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

fn digest_with_salt(salt: &[u8], plain: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(plain.as_bytes());
    hasher.finalize().to_vec()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Generates a random room code (uppercase, unambiguous alphabet).
pub fn generate_room_code(length: usize) -> String {
    random_string(CODE_ALPHABET, length)
}

/// Generates a random password for rooms created without one.
pub fn generate_password(length: usize) -> String {
    random_string(PASSWORD_ALPHABET, length)
}

fn random_string(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx: usize = rng.random_range(0..alphabet.len());
            alphabet[idx] as char
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================
