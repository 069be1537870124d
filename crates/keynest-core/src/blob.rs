//! Binary framing for sealed API keys.
//!
//! ```text
//! offset  0  salt            16 bytes
//! offset 16  nonce           12 bytes
//! offset 28  ciphertext||tag variable (tag is the trailing 16 bytes)
//! ```
//!
//! The frame is carried as standard padded base64. It has no version byte,
//! so KDF parameters cannot change without breaking existing blobs.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::DecryptionError;

/// Length of the PBKDF2 salt.
pub const SALT_LEN: usize = 16;

/// Length of the AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

/// Length of the AES-GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Smallest frame that can be sliced into salt and nonce.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;

/// A decoded salt/nonce/ciphertext frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Assemble a frame from its parts. `ciphertext` must already include the tag.
    #[must_use]
    pub fn new(salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            salt,
            nonce,
            ciphertext,
        }
    }

    #[must_use]
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext with the authentication tag appended.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serialize to `salt || nonce || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN.saturating_add(self.ciphertext.len()));
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Slice a raw frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] if `bytes` is shorter than [`HEADER_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecryptionError> {
        if bytes.len() < HEADER_LEN {
            return Err(DecryptionError);
        }
        let (salt, rest) = bytes.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        Ok(Self {
            salt: salt.try_into().map_err(|_| DecryptionError)?,
            nonce: nonce.try_into().map_err(|_| DecryptionError)?,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encode the frame as base64 text.
    #[must_use]
    pub fn encode(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Decode base64 text into a frame. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError`] if the text is not valid base64 or the
    /// decoded frame is too short.
    pub fn decode(encoded: &str) -> Result<Self, DecryptionError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| DecryptionError)?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> EncryptedBlob {
        EncryptedBlob::new([1; SALT_LEN], [2; NONCE_LEN], vec![3; 20])
    }

    #[test]
    fn layout_is_salt_then_nonce_then_ciphertext() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN + 20);
        assert!(bytes[..16].iter().all(|b| *b == 1));
        assert!(bytes[16..28].iter().all(|b| *b == 2));
        assert!(bytes[28..].iter().all(|b| *b == 3));
    }

    #[test]
    fn decode_inverts_encode() {
        let blob = sample();
        assert_eq!(EncryptedBlob::decode(&blob.encode()).unwrap(), blob);
    }

    #[test]
    fn header_only_frame_has_empty_ciphertext() {
        let blob = EncryptedBlob::from_bytes(&[0u8; HEADER_LEN]).unwrap();
        assert!(blob.ciphertext().is_empty());
    }

    #[test]
    fn short_frame_is_rejected() {
        assert_eq!(
            EncryptedBlob::from_bytes(&[0u8; HEADER_LEN - 1]),
            Err(DecryptionError)
        );
        let ten = BASE64.encode([0u8; 10]);
        assert_eq!(EncryptedBlob::decode(&ten), Err(DecryptionError));
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert_eq!(
            EncryptedBlob::decode("not-valid-base64!!"),
            Err(DecryptionError)
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let blob = sample();
        let padded = format!("  {}\n", blob.encode());
        assert_eq!(EncryptedBlob::decode(&padded).unwrap(), blob);
    }
}
