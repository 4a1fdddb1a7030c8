//! PIN code Service
//!
//! PIN codes are short numeric secrets, so they are only ever stored as
//! Argon2id hashes and verified through the hash's constant-time comparison.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use zeroize::Zeroizing;

use crate::config::PincodeConfig;
use crate::error::{AuthError, AuthResult};

/// PIN code service for hashing and verification
#[derive(Clone)]
pub struct PincodeService {
    config: PincodeConfig,
}

impl PincodeService {
    /// Create a new PIN code service
    pub fn new(config: PincodeConfig) -> Self {
        Self { config }
    }

    /// Hash a PIN code using Argon2id
    pub fn hash_pincode(&self, pincode: &str) -> AuthResult<String> {
        self.validate_format(pincode)?;

        let peppered = self.peppered(pincode);
        let salt = SaltString::generate(&mut OsRng);

        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            Some(self.config.hash_length as usize),
        )
        .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?;

        Ok(hash.to_string())
    }

    /// Verify a PIN code against a stored hash
    pub fn verify_pincode(&self, pincode: &str, hash: &str) -> AuthResult<bool> {
        // A malformed code can never match; skip the expensive hash
        if self.validate_format(pincode).is_err() {
            return Ok(false);
        }

        let peppered = self.peppered(pincode);
        let parsed_hash = PasswordHash::new(hash)?;

        // Parameters are read back from the PHC string
        match Argon2::default().verify_password(peppered.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(AuthError::HashingFailed),
        }
    }

    /// Validate PIN code format
    pub fn validate_format(&self, pincode: &str) -> AuthResult<()> {
        if pincode.len() != self.config.length {
            return Err(AuthError::WeakPincode(format!(
                "PIN code must be exactly {} digits",
                self.config.length
            )));
        }
        if !pincode.chars().all(|c| c.is_ascii_digit()) {
            return Err(AuthError::WeakPincode("PIN code must contain digits only".to_string()));
        }
        Ok(())
    }

    fn peppered(&self, pincode: &str) -> Zeroizing<String> {
        match self.config.pepper {
            Some(ref pepper) => Zeroizing::new(format!("{}{}", pincode, pepper)),
            None => Zeroizing::new(pincode.to_string()),
        }
    }
}
