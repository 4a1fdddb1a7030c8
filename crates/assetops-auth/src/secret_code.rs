//! Secret (backup) codes
//!
//! Codes are shown to the user once at enrollment and stored only as SHA-256
//! hashes of their normalized form. Each code authorizes a single write.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::SecretCodeConfig;

// No 0, O, 1, I for clarity
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generator and hasher for secret codes
#[derive(Clone)]
pub struct SecretCodeService {
    config: SecretCodeConfig,
}

impl SecretCodeService {
    pub fn new(config: SecretCodeConfig) -> Self {
        Self { config }
    }

    /// Generate a fresh batch of plaintext codes
    pub fn generate_codes(&self) -> Vec<String> {
        let mut codes = Vec::with_capacity(self.config.count);

        for _ in 0..self.config.count {
            let mut bytes = vec![0u8; self.config.length];
            rand::thread_rng().fill_bytes(&mut bytes);

            let code: String = bytes
                .iter()
                .map(|b| CODE_ALPHABET[(*b as usize) % CODE_ALPHABET.len()] as char)
                .collect();

            // Format as XXXX-XXXX for readability
            let formatted = if code.len() >= 8 {
                format!("{}-{}", &code[..4], &code[4..])
            } else {
                code
            };

            codes.push(formatted);
        }

        codes
    }

    /// Hash a code for storage or lookup
    pub fn hash_code(&self, code: &str) -> String {
        let hash = Sha256::digest(normalize(code).as_bytes());
        hex::encode(hash)
    }
}

/// Strip separators and case so `abcd-efgh` and `ABCDEFGH` are the same code
fn normalize(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}
