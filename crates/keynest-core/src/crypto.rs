//! Passphrase-based encryption of API keys.
//!
//! # Security model
//!
//! - Every seal draws a fresh 128-bit salt and 96-bit nonce from `OsRng`.
//! - The 256-bit key is PBKDF2-HMAC-SHA256 over the passphrase and salt,
//!   with at least [`MIN_KDF_ITERATIONS`] rounds.
//! - Encryption is AES-256-GCM; the tag is appended to the ciphertext.
//! - Output format is described in [`crate::blob`].
//! - Every decrypt failure is reported as the same [`DecryptionError`].
//! - Derived keys and owned passphrase copies are zeroized on drop.

use std::fmt;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::Sha256;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::blob::{EncryptedBlob, NONCE_LEN, SALT_LEN};
use crate::error::{CryptoError, DecryptionError};

/// Lowest PBKDF2 iteration count [`KdfParams`] will accept.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Iteration count used by [`encrypt_api_key`] and [`decrypt_api_key`].
pub const DEFAULT_KDF_ITERATIONS: u32 = MIN_KDF_ITERATIONS;

/// Length of the derived AES-256 key.
const KEY_LEN: usize = 32;

/// PBKDF2 parameters.
///
/// Sealing and opening must use identical parameters. The blob does not
/// record them, so a mismatch shows up as a plain [`DecryptionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Build parameters with a custom iteration count.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::WeakKdf`] if `iterations` is below
    /// [`MIN_KDF_ITERATIONS`].
    pub fn new(iterations: u32) -> Result<Self, CryptoError> {
        if iterations < MIN_KDF_ITERATIONS {
            return Err(CryptoError::WeakKdf {
                iterations,
                minimum: MIN_KDF_ITERATIONS,
            });
        }
        Ok(Self { iterations })
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

/// A 256-bit key derived from a passphrase. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Borrow the raw key bytes. Never log or persist them.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive an AES-256 key from `passphrase` and `salt` with PBKDF2-HMAC-SHA256.
#[must_use]
pub fn derive_key(passphrase: &str, salt: &[u8], params: &KdfParams) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, params.iterations, &mut key);
    let derived = DerivedKey(key);
    key.zeroize();
    derived
}

fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::Random {
            reason: e.to_string(),
        })?;
    Ok(buf)
}

fn cipher_for(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Seals and opens API keys under a passphrase.
///
/// The synchronous [`seal`](Self::seal) and [`open`](Self::open) run the KDF
/// on the calling thread. Async callers should use
/// [`encrypt`](Self::encrypt) and [`decrypt`](Self::decrypt), which move the
/// work onto the Tokio blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyCipher {
    params: KdfParams,
}

impl KeyCipher {
    #[must_use]
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> KdfParams {
        self.params
    }

    /// Encrypt `plaintext` under `passphrase` and return the base64 blob.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::EmptyInput`] if either argument is empty.
    /// - [`CryptoError::Random`] if the OS random source fails.
    /// - [`CryptoError::Encryption`] if the AEAD operation fails.
    pub fn seal(&self, plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Err(CryptoError::EmptyInput { field: "plaintext" });
        }
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyInput {
                field: "passphrase",
            });
        }

        let salt: [u8; SALT_LEN] = random_array()?;
        let nonce: [u8; NONCE_LEN] = random_array()?;
        let key = derive_key(passphrase, &salt, &self.params);

        let ciphertext = cipher_for(&key)
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption {
                reason: e.to_string(),
            })?;

        let encoded = EncryptedBlob::new(salt, nonce, ciphertext).encode();
        debug!(
            iterations = self.params.iterations,
            blob_len = encoded.len(),
            "sealed api key"
        );
        Ok(encoded)
    }

    /// Decrypt a blob produced by [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] for malformed base64, a frame shorter than
    /// the header, a failed authentication tag, or non-UTF-8 plaintext.
    pub fn open(&self, encoded: &str, passphrase: &str) -> Result<String, DecryptionError> {
        let blob = EncryptedBlob::decode(encoded)?;
        let key = derive_key(passphrase, blob.salt(), &self.params);

        let plaintext = cipher_for(&key)
            .decrypt(Nonce::from_slice(blob.nonce()), blob.ciphertext())
            .map_err(|_| DecryptionError)?;

        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            DecryptionError
        })
    }

    /// Async form of [`seal`](Self::seal).
    ///
    /// # Errors
    ///
    /// Same as [`seal`](Self::seal), plus [`CryptoError::Task`] if the
    /// blocking task is cancelled.
    pub async fn encrypt(&self, plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
        let cipher = *self;
        let plaintext = Zeroizing::new(plaintext.to_owned());
        let passphrase = Zeroizing::new(passphrase.to_owned());
        tokio::task::spawn_blocking(move || cipher.seal(&plaintext, &passphrase))
            .await
            .map_err(|e| CryptoError::Task {
                reason: e.to_string(),
            })?
    }

    /// Async form of [`open`](Self::open).
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] on any failure, including a cancelled
    /// blocking task.
    pub async fn decrypt(&self, encoded: &str, passphrase: &str) -> Result<String, DecryptionError> {
        let cipher = *self;
        let encoded = encoded.to_owned();
        let passphrase = Zeroizing::new(passphrase.to_owned());
        tokio::task::spawn_blocking(move || cipher.open(&encoded, &passphrase))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "decrypt task did not complete");
                DecryptionError
            })?
    }
}

/// Encrypt an API key with the default KDF parameters.
///
/// # Errors
///
/// See [`KeyCipher::encrypt`].
pub async fn encrypt_api_key(plaintext: &str, passphrase: &str) -> Result<String, CryptoError> {
    KeyCipher::default().encrypt(plaintext, passphrase).await
}

/// Decrypt an API key sealed with the default KDF parameters.
///
/// # Errors
///
/// See [`KeyCipher::decrypt`].
pub async fn decrypt_api_key(encoded: &str, passphrase: &str) -> Result<String, DecryptionError> {
    KeyCipher::default().decrypt(encoded, passphrase).await
}
