//! Credential envelopes and their encrypted encoding
//!
//! An envelope wraps the payload with the device fingerprint, the issue time
//! and an optional expiry. It is serialized to JSON, sealed with the split
//! key, and persisted as a single text record. A refresh writes a brand-new
//! envelope; envelopes are never edited in place.

use crate::clock::Clock;
use crate::error::Result;
use crate::events::{StoreEvent, StoreEvents};
use crate::fingerprint::FingerprintProvider;
use crate::keys::KeyManager;
use crate::payload::CredentialPayload;
use crate::scope::StorageScope;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Metadata sealed alongside every payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMeta {
    /// Device fingerprint at encode time
    pub fingerprint: String,
    /// Encode time, Unix epoch milliseconds
    pub timestamp: i64,
    /// Expiry, Unix epoch milliseconds; `None` never expires
    pub expires_at: Option<i64>,
}

/// Payload plus its sealing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEnvelope<P> {
    /// The protected payload
    pub data: P,
    /// Sealing metadata
    pub meta: EnvelopeMeta,
}

impl<P> CredentialEnvelope<P> {
    /// When the envelope was sealed
    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.meta.timestamp)
    }

    /// When the credential expires, if ever
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.meta
            .expires_at
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Time left until expiry; negative once expired, `None` if non-expiring
    #[must_use]
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.meta.expires_at.map(|at| {
            let remaining = at.saturating_sub(now.timestamp_millis()).max(-i64::MAX);
            Duration::milliseconds(remaining)
        })
    }

    /// Unwrap the payload
    #[must_use]
    pub fn into_data(self) -> P {
        self.data
    }
}

/// Seals payloads into records and opens them again.
///
/// Decoding never fails loudly: every problem yields `None`. A fingerprint
/// mismatch additionally destroys the record and the key.
#[derive(Clone)]
pub struct EnvelopeCodec {
    keys: KeyManager,
    durable: Arc<dyn StorageScope>,
    record_key: String,
    fingerprint: Arc<dyn FingerprintProvider>,
    clock: Arc<dyn Clock>,
    events: StoreEvents,
}

impl EnvelopeCodec {
    /// Create a codec; `durable` and `record_key` locate the ciphertext
    /// record that a tamper purge deletes.
    #[must_use]
    pub fn new(
        keys: KeyManager,
        durable: Arc<dyn StorageScope>,
        record_key: impl Into<String>,
        fingerprint: Arc<dyn FingerprintProvider>,
        clock: Arc<dyn Clock>,
        events: StoreEvents,
    ) -> Self {
        Self {
            keys,
            durable,
            record_key: record_key.into(),
            fingerprint,
            clock,
            events,
        }
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Build the envelope for `payload` as of now.
    ///
    /// Lifetimes that overflow the timestamp range expire at the latest
    /// representable instant.
    pub(crate) fn wrap<P: CredentialPayload>(&self, payload: &P) -> CredentialEnvelope<P> {
        let now = self.clock.now();
        let expires_at = payload.expires_in().map(|lifetime| {
            Duration::from_std(lifetime)
                .ok()
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp_millis()
        });

        CredentialEnvelope {
            data: payload.clone(),
            meta: EnvelopeMeta {
                fingerprint: self.fingerprint.fingerprint(),
                timestamp: now.timestamp_millis(),
                expires_at,
            },
        }
    }

    /// Wrap, serialize and encrypt `payload` into a record string.
    ///
    /// Creates the split key on first use.
    pub async fn encode<P: CredentialPayload>(&self, payload: &P) -> Result<String> {
        let envelope = self.wrap(payload);
        let plaintext = Zeroizing::new(serde_json::to_vec(&envelope)?);
        let key = self.keys.ensure_key().await?;
        let record = key.cipher().seal(&plaintext)?;

        debug!(
            expires_at = ?envelope.meta.expires_at,
            "Encoded credential envelope"
        );
        Ok(record)
    }

    /// Decrypt and validate a record.
    ///
    /// `None` when the key is gone, the record is corrupt or foreign, or the
    /// fingerprint differs from the current device. Expiry is not checked.
    pub async fn decode<P: CredentialPayload>(
        &self,
        record: &str,
    ) -> Option<CredentialEnvelope<P>> {
        let key = match self.keys.read_key().await {
            Ok(Some(key)) => key,
            Ok(None) => {
                debug!("Encryption key not reconstructible; credential unreadable");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read encryption key");
                return None;
            }
        };

        let plaintext = match key.cipher().open(record) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to decrypt credential record");
                return None;
            }
        };

        let envelope: CredentialEnvelope<P> = match serde_json::from_slice(&plaintext) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Failed to parse credential envelope");
                return None;
            }
        };

        let current = self.fingerprint.fingerprint();
        if !fingerprints_match(&envelope.meta.fingerprint, &current) {
            warn!("Device fingerprint mismatch; purging stored credential material");
            match self.purge().await {
                Ok(()) => {
                    self.events.publish(StoreEvent::Purged);
                }
                Err(e) => warn!(error = %e, "Purge after fingerprint mismatch was incomplete"),
            }
            return None;
        }

        Some(envelope)
    }

    /// Delete the record and both key halves.
    ///
    /// Every deletion is attempted; the first failure is returned.
    pub async fn purge(&self) -> Result<()> {
        let record = self.durable.remove_item(&self.record_key).await;
        if let Err(e) = &record {
            warn!(key = %self.record_key, error = %e, "Failed to delete credential record");
        }
        let key = self.keys.delete_key().await;

        record?;
        key?;
        info!("Purged credential record and encryption key");
        Ok(())
    }
}

fn fingerprints_match(stored: &str, current: &str) -> bool {
    stored.as_bytes().ct_eq(current.as_bytes()).into()
}
