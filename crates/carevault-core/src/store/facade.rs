//! Store facade implementation

use super::builder::StoreBuilder;
use super::status::CredentialStatus;
use crate::clock::Clock;
use crate::envelope::{CredentialEnvelope, EnvelopeCodec};
use crate::error::Result;
use crate::events::{StoreEvent, StoreEvents};
use crate::payload::CredentialPayload;
use crate::scope::StorageScope;
use chrono::Duration;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Device-bound encrypted store for one credential payload.
///
/// Concurrent writers are last-write-wins; there is no locking or
/// versioning. Subscribe to [`StoreEvent`]s to coordinate several writers.
pub struct SecureCredentialStore<P> {
    codec: EnvelopeCodec,
    durable: Arc<dyn StorageScope>,
    record_key: String,
    refresh_window: Duration,
    clock: Arc<dyn Clock>,
    events: StoreEvents,
    _payload: PhantomData<fn() -> P>,
}

impl<P: CredentialPayload> SecureCredentialStore<P> {
    /// Start configuring a store
    #[must_use]
    pub fn builder() -> StoreBuilder<P> {
        StoreBuilder::new()
    }

    pub(super) fn from_parts(
        codec: EnvelopeCodec,
        durable: Arc<dyn StorageScope>,
        record_key: String,
        refresh_window: Duration,
        clock: Arc<dyn Clock>,
        events: StoreEvents,
    ) -> Self {
        Self {
            codec,
            durable,
            record_key,
            refresh_window,
            clock,
            events,
            _payload: PhantomData,
        }
    }

    /// Encrypt and persist `payload`, replacing whatever was stored.
    ///
    /// Returns `false` on any internal failure.
    pub async fn store(&self, payload: &P) -> bool {
        match self.try_store(payload).await {
            Ok(()) => {
                self.events.publish(StoreEvent::Stored);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to store credential");
                false
            }
        }
    }

    async fn try_store(&self, payload: &P) -> Result<()> {
        let record = self.codec.encode(payload).await?;
        self.durable.set_item(&self.record_key, &record).await?;
        debug!(key = %self.record_key, "Stored credential record");
        Ok(())
    }

    /// The stored payload, or `None` if absent, unreadable, or foreign
    pub async fn retrieve(&self) -> Option<P> {
        self.retrieve_envelope()
            .await
            .map(CredentialEnvelope::into_data)
    }

    /// The stored payload with its sealing metadata
    pub async fn retrieve_envelope(&self) -> Option<CredentialEnvelope<P>> {
        let record = match self.durable.get_item(&self.record_key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(key = %self.record_key, "No credential record stored");
                return None;
            }
            Err(e) => {
                warn!(key = %self.record_key, error = %e, "Failed to read credential record");
                return None;
            }
        };

        self.codec.decode(&record).await
    }

    /// Delete the record and both key halves.
    ///
    /// Returns `false` if any deletion failed.
    pub async fn remove(&self) -> bool {
        match self.codec.purge().await {
            Ok(()) => {
                self.events.publish(StoreEvent::Removed);
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove credential material");
                false
            }
        }
    }

    /// Whether the caller must refresh or re-authenticate.
    ///
    /// True when nothing is stored or the expiry falls within the refresh
    /// window; false for non-expiring credentials.
    pub async fn needs_refresh(&self) -> bool {
        self.status().await.needs_refresh()
    }

    /// Classify the stored credential
    pub async fn status(&self) -> CredentialStatus {
        let Some(envelope) = self.retrieve_envelope().await else {
            return CredentialStatus::Missing;
        };

        match envelope.time_until_expiry(self.clock.now()) {
            None => CredentialStatus::Valid,
            Some(left) if left <= Duration::zero() => CredentialStatus::Expired,
            Some(left) if left <= self.refresh_window => CredentialStatus::ExpiringSoon,
            Some(_) => CredentialStatus::Valid,
        }
    }

    /// Whether a readable credential is stored
    pub async fn exists(&self) -> bool {
        self.retrieve_envelope().await.is_some()
    }

    /// Receive [`StoreEvent`]s for future mutations
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Look-ahead used by [`needs_refresh`](Self::needs_refresh)
    #[must_use]
    pub fn refresh_window(&self) -> Duration {
        self.refresh_window
    }
}

impl<P> std::fmt::Debug for SecureCredentialStore<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureCredentialStore")
            .field("record_key", &self.record_key)
            .field("refresh_window", &self.refresh_window)
            .finish_non_exhaustive()
    }
}
