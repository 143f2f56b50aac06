//! Store construction

use super::facade::SecureCredentialStore;
use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::envelope::EnvelopeCodec;
use crate::error::{Result, StoreError};
use crate::events::StoreEvents;
use crate::fingerprint::{FingerprintProvider, HostSignals, SignalFingerprint};
use crate::keys::KeyManager;
use crate::payload::CredentialPayload;
use crate::scope::StorageScope;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

/// Assembles a [`SecureCredentialStore`] from injected dependencies.
///
/// Both scopes are required. The fingerprint defaults to [`HostSignals`]
/// over the configured signal set, the clock to [`SystemClock`].
pub struct StoreBuilder<P> {
    durable: Option<Arc<dyn StorageScope>>,
    session: Option<Arc<dyn StorageScope>>,
    fingerprint: Option<Arc<dyn FingerprintProvider>>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    events: StoreEvents,
    _payload: PhantomData<fn() -> P>,
}

impl<P: CredentialPayload> StoreBuilder<P> {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            durable: None,
            session: None,
            fingerprint: None,
            clock: Arc::new(SystemClock),
            config: StoreConfig::default(),
            events: StoreEvents::default(),
            _payload: PhantomData,
        }
    }

    /// Scope that survives restarts
    #[must_use]
    pub fn durable(self, scope: impl StorageScope + 'static) -> Self {
        self.durable_shared(Arc::new(scope))
    }

    /// Scope that survives restarts, already shared
    #[must_use]
    pub fn durable_shared(mut self, scope: Arc<dyn StorageScope>) -> Self {
        self.durable = Some(scope);
        self
    }

    /// Scope cleared at the end of the session
    #[must_use]
    pub fn session(self, scope: impl StorageScope + 'static) -> Self {
        self.session_shared(Arc::new(scope))
    }

    /// Scope cleared at the end of the session, already shared
    #[must_use]
    pub fn session_shared(mut self, scope: Arc<dyn StorageScope>) -> Self {
        self.session = Some(scope);
        self
    }

    /// Override the fingerprint provider
    #[must_use]
    pub fn fingerprint(mut self, provider: impl FingerprintProvider + 'static) -> Self {
        self.fingerprint = Some(Arc::new(provider));
        self
    }

    /// Override the time source
    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Use this configuration
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish change notifications on an existing channel
    #[must_use]
    pub fn events(mut self, events: StoreEvents) -> Self {
        self.events = events;
        self
    }

    /// Validate the configuration and build the store
    pub fn build(self) -> Result<SecureCredentialStore<P>> {
        self.config.validate()?;

        let durable = self
            .durable
            .ok_or_else(|| StoreError::Configuration("durable scope not set".to_string()))?;
        let session = self
            .session
            .ok_or_else(|| StoreError::Configuration("session scope not set".to_string()))?;
        let fingerprint = self.fingerprint.unwrap_or_else(|| {
            Arc::new(SignalFingerprint::with_config(
                HostSignals,
                &self.config.fingerprint,
            ))
        });

        let keys = KeyManager::new(
            Arc::clone(&durable),
            session,
            self.config.durable_key_name.clone(),
            self.config.session_key_name.clone(),
        );
        let codec = EnvelopeCodec::new(
            keys,
            Arc::clone(&durable),
            self.config.record_key_name.clone(),
            fingerprint,
            Arc::clone(&self.clock),
            self.events.clone(),
        );

        info!(
            record_key = %self.config.record_key_name,
            refresh_window_secs = self.config.refresh_window_secs,
            "Initializing secure credential store"
        );

        Ok(SecureCredentialStore::from_parts(
            codec,
            durable,
            self.config.record_key_name.clone(),
            self.config.refresh_window(),
            self.clock,
            self.events,
        ))
    }
}

impl<P: CredentialPayload> Default for StoreBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
