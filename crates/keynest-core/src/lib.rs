//! Core library for `KeyNest`.
//!
//! Two independent pieces live here:
//!
//! - the key cipher ([`crypto`], [`blob`]), which seals API keys under a
//!   user passphrase with PBKDF2-HMAC-SHA256 and AES-256-GCM, and
//! - the plan gate ([`plan`]), a durable `free`/`pro` flag stored through
//!   any `keynest-storage` backend.

pub mod blob;
pub mod crypto;
pub mod error;
pub mod plan;

pub use crypto::{KdfParams, KeyCipher, decrypt_api_key, encrypt_api_key};
pub use error::{CryptoError, DecryptionError, PlanError};
pub use plan::{Plan, PlanGate};
