//! Split encryption key management
//!
//! The 256-bit key is never stored whole. It is cut at the midpoint: the
//! first half goes to the durable scope, the second to the session scope.
//! A dump of durable storage alone cannot decrypt anything; the attacker
//! also needs the live session half. Losing either half makes every stored
//! envelope unreadable, which is the intended failure mode.

use crate::error::Result;
use crate::scope::{ScopeKind, StorageScope};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use carevault_crypto::{RecordCipher, KEY_LEN};
use rand::RngCore;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of each stored key half
pub const HALF_LEN: usize = KEY_LEN / 2;

/// Symmetric key protecting the credential record
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Generate a fresh key from the OS CSPRNG
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Reassemble a key from its two halves.
    ///
    /// Returns `None` unless both halves are exactly [`HALF_LEN`] bytes.
    #[must_use]
    pub fn from_halves(first: &[u8], second: &[u8]) -> Option<Self> {
        if first.len() != HALF_LEN || second.len() != HALF_LEN {
            return None;
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes[..HALF_LEN].copy_from_slice(first);
        bytes[HALF_LEN..].copy_from_slice(second);
        Some(Self { bytes })
    }

    /// Split at the midpoint into (durable half, session half)
    #[must_use]
    pub fn halves(&self) -> (&[u8], &[u8]) {
        self.bytes.split_at(HALF_LEN)
    }

    /// Cipher keyed with this key
    #[must_use]
    pub fn cipher(&self) -> RecordCipher {
        RecordCipher::from_key(self.bytes)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for EncryptionKey {}

/// Generates, splits, and reassembles the encryption key
#[derive(Clone)]
pub struct KeyManager {
    durable: Arc<dyn StorageScope>,
    session: Arc<dyn StorageScope>,
    durable_key: String,
    session_key: String,
}

impl KeyManager {
    /// Create a manager over the two scopes and their half storage keys
    #[must_use]
    pub fn new(
        durable: Arc<dyn StorageScope>,
        session: Arc<dyn StorageScope>,
        durable_key: impl Into<String>,
        session_key: impl Into<String>,
    ) -> Self {
        Self {
            durable,
            session,
            durable_key: durable_key.into(),
            session_key: session_key.into(),
        }
    }

    /// Return the existing key, or create and persist a new one.
    ///
    /// A lone surviving half is overwritten; whatever it protected is
    /// already unreadable.
    pub async fn ensure_key(&self) -> Result<EncryptionKey> {
        if let Some(key) = self.read_key().await? {
            debug!("Reusing existing split encryption key");
            return Ok(key);
        }

        let key = EncryptionKey::generate();
        let (first, second) = key.halves();
        let first = Zeroizing::new(BASE64.encode(first));
        let second = Zeroizing::new(BASE64.encode(second));

        self.durable.set_item(&self.durable_key, &first).await?;
        self.session.set_item(&self.session_key, &second).await?;

        info!("Generated new split encryption key");
        Ok(key)
    }

    /// Reassemble the key if both halves are present and well-formed
    pub async fn read_key(&self) -> Result<Option<EncryptionKey>> {
        let first = self.durable.get_item(&self.durable_key).await?.map(Zeroizing::new);
        let second = self.session.get_item(&self.session_key).await?.map(Zeroizing::new);

        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            (first, second) => {
                debug!(
                    durable_present = first.is_some(),
                    session_present = second.is_some(),
                    "Encryption key incomplete"
                );
                return Ok(None);
            }
        };

        let first = match decode_half(&first, ScopeKind::Durable) {
            Some(half) => half,
            None => return Ok(None),
        };
        let second = match decode_half(&second, ScopeKind::Session) {
            Some(half) => half,
            None => return Ok(None),
        };

        Ok(EncryptionKey::from_halves(&first, &second))
    }

    /// Remove both halves.
    ///
    /// Both removals are attempted; the first failure is returned.
    pub async fn delete_key(&self) -> Result<()> {
        let durable = self.durable.remove_item(&self.durable_key).await;
        let session = self.session.remove_item(&self.session_key).await;

        if let Err(e) = &durable {
            warn!(scope = ?ScopeKind::Durable, error = %e, "Failed to delete key half");
        }
        if let Err(e) = &session {
            warn!(scope = ?ScopeKind::Session, error = %e, "Failed to delete key half");
        }

        durable?;
        session?;
        debug!("Deleted both encryption key halves");
        Ok(())
    }
}

fn decode_half(encoded: &str, scope: ScopeKind) -> Option<Zeroizing<Vec<u8>>> {
    match BASE64.decode(encoded.trim()) {
        Ok(bytes) if bytes.len() == HALF_LEN => Some(Zeroizing::new(bytes)),
        Ok(bytes) => {
            warn!(scope = ?scope, len = bytes.len(), "Key half has wrong length");
            None
        }
        Err(e) => {
            warn!(scope = ?scope, error = %e, "Key half is not valid base64");
            None
        }
    }
}
