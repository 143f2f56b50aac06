//! Carevault Crypto — sealing for persisted credential records.
//!
//! Provides AES-256-GCM encryption under a caller-supplied 256-bit key:
//! - Every seal gets a fresh random nonce (no reuse)
//! - Records are self-describing text: `base64(version || nonce || ciphertext)`
//! - Any tampering is caught by the GCM authentication tag
//! - Keys implement `Zeroize` for automatic memory cleanup

#![forbid(unsafe_code)]

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a raw cipher key in bytes.
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Current record format version.
pub const RECORD_VERSION: u8 = 1;

/// Error types for crypto operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Encryption failed
    EncryptionFailed,
    /// Decryption failed (wrong key, tampered data, or invalid nonce)
    DecryptionFailed,
    /// Invalid data format
    InvalidFormat(String),
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EncryptionFailed => write!(f, "encryption failed"),
            Self::DecryptionFailed => write!(f, "decryption failed"),
            Self::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
        }
    }
}

impl std::error::Error for CryptoError {}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Encrypted data bundle.
///
/// Contains everything needed to decrypt (except the key):
/// version, nonce, and ciphertext with GCM auth tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Format version (currently 1)
    pub version: u8,
    /// 12-byte nonce (GCM standard)
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext including GCM authentication tag (16 bytes appended)
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Encode as a storable text record.
    #[must_use]
    pub fn to_record(&self) -> String {
        let mut raw = Vec::with_capacity(1 + NONCE_LEN + self.ciphertext.len());
        raw.push(self.version);
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.ciphertext);
        BASE64.encode(raw)
    }

    /// Parse a text record produced by [`EncryptedData::to_record`].
    ///
    /// Only the framing is checked here; the version is validated on decrypt.
    pub fn from_record(record: &str) -> Result<Self> {
        let raw = BASE64
            .decode(record.trim())
            .map_err(|e| CryptoError::InvalidFormat(format!("bad base64: {}", e)))?;

        if raw.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat(format!(
                "record too short: {} bytes",
                raw.len()
            )));
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&raw[1..=NONCE_LEN]);

        Ok(Self {
            version: raw[0],
            nonce,
            ciphertext: raw[1 + NONCE_LEN..].to_vec(),
        })
    }
}

/// Record cipher using AES-256-GCM.
///
/// Implements `Zeroize` + `ZeroizeOnDrop` for automatic key cleanup.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RecordCipher {
    key: [u8; KEY_LEN],
}

impl RecordCipher {
    /// Create a cipher from a raw 256-bit key.
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Encrypt plaintext with a fresh random nonce.
    ///
    /// Each call generates a unique nonce, so encrypting the same plaintext
    /// twice produces different ciphertext.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedData> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::EncryptionFailed)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(EncryptedData {
            version: RECORD_VERSION,
            nonce: nonce_bytes,
            ciphertext,
        })
    }

    /// Decrypt an encrypted data bundle.
    pub fn decrypt(&self, data: &EncryptedData) -> Result<Vec<u8>> {
        if data.version != RECORD_VERSION {
            return Err(CryptoError::InvalidFormat(format!(
                "unsupported version: {}",
                data.version
            )));
        }

        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = Nonce::from_slice(&data.nonce);

        cipher
            .decrypt(nonce, data.ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Encrypt and encode in one step.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String> {
        self.encrypt(plaintext).map(|data| data.to_record())
    }

    /// Decode and decrypt in one step.
    pub fn open(&self, record: &str) -> Result<Vec<u8>> {
        let data = EncryptedData::from_record(record)?;
        self.decrypt(&data)
    }
}

impl std::fmt::Debug for RecordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
