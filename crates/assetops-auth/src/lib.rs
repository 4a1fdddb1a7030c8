//! AssetOps Verification Layer
//!
//! Second-factor verification for state-changing asset operations:
//!
//! - **PIN codes**: Argon2id hashing with optional pepper
//! - **Two-factor**: TOTP (RFC 6238) with replay rejection
//! - **Secret codes**: single-use backup codes stored as SHA-256 hashes
//! - **Proofs**: HMAC-signed, expiring, single-use verification contexts
//! - **Lockout**: progressive lockout after repeated failures
//! - **Permissions**: capability checks for the access control guard
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Verification Flow                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  authorize(wallet, code) → LockoutTracker → code check      │
//! │                                  │                          │
//! │              ┌───────────────────┼───────────────┐          │
//! │              ▼                   ▼               ▼          │
//! │        PincodeService       TotpService   SecretCodeService │
//! │              │                   │               │          │
//! │              └───────────────────┼───────────────┘          │
//! │                                  ▼                          │
//! │                    ProofIssuer → VerificationContext        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod lockout;
pub mod permissions;
pub mod pincode;
pub mod proof;
pub mod secret_code;
pub mod store;
pub mod totp;

pub use config::VerificationConfig;
pub use error::{AuthError, AuthResult};
pub use gate::{VerificationGate, VerificationService};
pub use lockout::LockoutTracker;
pub use permissions::{AuthenticatedCaller, Capability, Permissions};
pub use pincode::PincodeService;
pub use proof::ProofIssuer;
pub use secret_code::SecretCodeService;
pub use store::{CredentialStore, InMemoryCredentialStore};
pub use totp::{TotpService, TotpSetup};
