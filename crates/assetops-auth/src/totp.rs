//! TOTP (Time-based One-Time Password) Service
//!
//! Two-factor verification implementation with:
//! - TOTP generation and verification (RFC 6238)
//! - QR code URL generation for authenticator apps
//! - Time skew tolerance
//!
//! Verification reports the counter of the matching time step so the gate can
//! refuse a second use of the same code.

use base32::{decode as base32_decode, encode as base32_encode, Alphabet};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::TotpConfig;
use crate::error::{AuthError, AuthResult};

/// TOTP enrollment information returned to the user once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpSetup {
    /// Base32 secret
    pub secret: String,
    /// otpauth:// URL for QR rendering
    pub qr_url: String,
}

/// TOTP service for two-factor verification
#[derive(Clone)]
pub struct TotpService {
    config: TotpConfig,
}

impl TotpService {
    /// Create a new TOTP service
    pub fn new(config: TotpConfig) -> Self {
        Self { config }
    }

    /// Configured time step in seconds
    pub fn step(&self) -> u64 {
        self.config.step
    }

    /// Configured skew in periods
    pub fn skew(&self) -> u64 {
        self.config.skew as u64
    }

    /// Generate a new TOTP secret and setup information
    pub fn generate_setup(&self, account_name: &str) -> AuthResult<TotpSetup> {
        // Generate random secret (20 bytes for SHA1, 32 for SHA256)
        let secret_len = match self.config.algorithm.as_str() {
            "SHA256" => 32,
            "SHA512" => 64,
            _ => 20, // SHA1 default
        };

        let mut secret_bytes = vec![0u8; secret_len];
        rand::thread_rng().fill_bytes(&mut secret_bytes);

        let secret = base32_encode(Alphabet::RFC4648 { padding: false }, &secret_bytes);
        let qr_url = self.generate_otpauth_url(&secret, account_name);

        Ok(TotpSetup { secret, qr_url })
    }

    /// Verify a TOTP code against the current time
    ///
    /// Returns the counter of the matching time step, or `None` when no step
    /// within the skew window matches.
    pub fn verify_code(&self, secret: &str, code: &str) -> AuthResult<Option<u64>> {
        self.verify_code_at(secret, code, unix_now()?)
    }

    /// Verify a TOTP code against an explicit unix time
    pub fn verify_code_at(&self, secret: &str, code: &str, unix_secs: u64) -> AuthResult<Option<u64>> {
        let secret_bytes = decode_secret(secret)?;
        let counter = unix_secs / self.config.step;

        // Check current period and skew periods
        for i in 0..=self.skew() {
            // Check past periods
            if i > 0 && counter >= i {
                let past_code = self.generate_code_for_counter(&secret_bytes, counter - i)?;
                if constant_time_compare(code, &past_code) {
                    return Ok(Some(counter - i));
                }
            }

            // Check current/future periods
            let future_code = self.generate_code_for_counter(&secret_bytes, counter + i)?;
            if constant_time_compare(code, &future_code) {
                return Ok(Some(counter + i));
            }
        }

        Ok(None)
    }

    /// Current time-step counter
    pub fn current_counter(&self) -> AuthResult<u64> {
        Ok(unix_now()? / self.config.step)
    }

    /// Generate the current TOTP code (for testing/display)
    pub fn generate_current_code(&self, secret: &str) -> AuthResult<String> {
        self.generate_code_at(secret, unix_now()?)
    }

    /// Generate the TOTP code valid at an explicit unix time
    pub fn generate_code_at(&self, secret: &str, unix_secs: u64) -> AuthResult<String> {
        let secret_bytes = decode_secret(secret)?;
        self.generate_code_for_counter(&secret_bytes, unix_secs / self.config.step)
    }

    // =========================================================================
    // Internal Methods
    // =========================================================================

    /// Generate otpauth:// URL for QR codes
    fn generate_otpauth_url(&self, secret: &str, account_name: &str) -> String {
        let issuer_encoded = urlencoding::encode(&self.config.issuer);
        let account_encoded = urlencoding::encode(account_name);

        format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}&algorithm={}&digits={}&period={}",
            issuer_encoded,
            account_encoded,
            secret,
            issuer_encoded,
            self.config.algorithm,
            self.config.digits,
            self.config.step,
        )
    }

    /// Generate TOTP code for a specific counter value
    fn generate_code_for_counter(&self, secret: &[u8], counter: u64) -> AuthResult<String> {
        let counter_bytes = counter.to_be_bytes();

        let hash = match self.config.algorithm.as_str() {
            "SHA256" => {
                let mut mac = Hmac::<Sha256>::new_from_slice(secret)
                    .map_err(|_| AuthError::CryptoError)?;
                mac.update(&counter_bytes);
                mac.finalize().into_bytes().to_vec()
            }
            "SHA512" => {
                let mut mac = Hmac::<Sha512>::new_from_slice(secret)
                    .map_err(|_| AuthError::CryptoError)?;
                mac.update(&counter_bytes);
                mac.finalize().into_bytes().to_vec()
            }
            _ => {
                let mut mac = Hmac::<Sha1>::new_from_slice(secret)
                    .map_err(|_| AuthError::CryptoError)?;
                mac.update(&counter_bytes);
                mac.finalize().into_bytes().to_vec()
            }
        };

        // Dynamic truncation (RFC 4226)
        let offset = (hash.last().unwrap_or(&0) & 0x0f) as usize;
        let binary = ((hash[offset] & 0x7f) as u32) << 24
            | (hash[offset + 1] as u32) << 16
            | (hash[offset + 2] as u32) << 8
            | (hash[offset + 3] as u32);

        let modulo = 10u32.pow(self.config.digits);
        let code = binary % modulo;

        Ok(format!("{:0width$}", code, width = self.config.digits as usize))
    }
}

fn decode_secret(secret: &str) -> AuthResult<Vec<u8>> {
    base32_decode(Alphabet::RFC4648 { padding: false }, secret)
        .ok_or_else(|| AuthError::Internal("Invalid TOTP secret".to_string()))
}

fn unix_now() -> AuthResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

/// Constant-time string comparison to prevent timing attacks
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }

    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TotpConfig {
        TotpConfig {
            issuer: "TestApp".to_string(),
            digits: 6,
            step: 30,
            algorithm: "SHA1".to_string(),
            skew: 1,
        }
    }

    // RFC 6238 appendix B secret ("12345678901234567890")
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_rfc6238_vector() {
        let mut config = test_config();
        config.digits = 8;
        let service = TotpService::new(config);
        assert_eq!(service.generate_code_at(RFC_SECRET, 59).unwrap(), "94287082");
        assert_eq!(service.generate_code_at(RFC_SECRET, 1111111109).unwrap(), "07081804");
    }

    #[test]
    fn test_verify_reports_counter() {
        let service = TotpService::new(test_config());
        let at = 1_700_000_000;
        let code = service.generate_code_at(RFC_SECRET, at).unwrap();

        assert_eq!(service.verify_code_at(RFC_SECRET, &code, at).unwrap(), Some(at / 30));
        // one step later still accepted through skew
        assert_eq!(service.verify_code_at(RFC_SECRET, &code, at + 30).unwrap(), Some(at / 30));
        // far outside the window
        assert_eq!(service.verify_code_at(RFC_SECRET, &code, at + 300).unwrap(), None);
    }

    #[test]
    fn test_generate_setup() {
        let service = TotpService::new(test_config());
        let setup = service.generate_setup("treasury@example.com").unwrap();

        assert!(setup.secret.chars().all(|c| "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567".contains(c)));
        assert!(setup.qr_url.starts_with("otpauth://totp/TestApp:"));
        assert!(setup.qr_url.contains("treasury%40example.com"));
        assert!(setup.qr_url.contains("period=30"));

        let code = service.generate_current_code(&setup.secret).unwrap();
        assert!(service.verify_code(&setup.secret, &code).unwrap().is_some());
        assert!(service.verify_code(&setup.secret, "not-a-code").unwrap().is_none());
    }

    #[test]
    fn test_sha256_algorithm() {
        let mut config = test_config();
        config.algorithm = "SHA256".to_string();
        let service = TotpService::new(config);

        let setup = service.generate_setup("ops").unwrap();
        let code = service.generate_current_code(&setup.secret).unwrap();
        assert!(service.verify_code(&setup.secret, &code).unwrap().is_some());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("123456", "123456"));
        assert!(!constant_time_compare("123456", "123457"));
        assert!(!constant_time_compare("123456", "12345"));
    }
}
