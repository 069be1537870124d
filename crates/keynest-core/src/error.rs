//! Error types for `keynest-core`.
//!
//! Crypto errors never carry key material, passphrases, or plaintext.

/// Errors from sealing an API key.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The plaintext or passphrase was empty.
    #[error("{field} must not be empty")]
    EmptyInput { field: &'static str },

    /// The KDF iteration count is below the accepted minimum.
    #[error("KDF iteration count {iterations} is below the minimum of {minimum}")]
    WeakKdf { iterations: u32, minimum: u32 },

    /// The OS random source failed to produce a salt or nonce.
    #[error("random source failed: {reason}")]
    Random { reason: String },

    /// AES-256-GCM encryption failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// The blocking task running the KDF was cancelled or panicked.
    #[error("crypto task failed: {reason}")]
    Task { reason: String },
}

/// The only failure `decrypt` reports.
///
/// Malformed base64, a truncated blob, a wrong passphrase, and tampered
/// ciphertext all collapse into this one value so callers cannot tell them
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("decryption failed: wrong passphrase or corrupted data")]
pub struct DecryptionError;

/// Errors from plan gating.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The feature is only available on the Pro plan.
    #[error("{feature} requires the Pro plan. Run `keynest plan upgrade` to enable it")]
    ProRequired { feature: String },
}
