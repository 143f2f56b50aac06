//! Tests for the store facade

use super::*;
use crate::clock::ManualClock;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::events::StoreEvent;
use crate::fingerprint::{EnvironmentSignals, ProvidedSignals, Signal, SignalFingerprint};
use crate::payload::OAuthTokens;
use crate::scope::{MemoryScope, StorageScope};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockall::mock;
use serde_json::{json, Value};

mock! {
    pub Scope {}

    #[async_trait]
    impl StorageScope for Scope {
        async fn get_item(&self, key: &str) -> Result<Option<String>>;
        async fn set_item(&self, key: &str, value: &str) -> Result<()>;
        async fn remove_item(&self, key: &str) -> Result<()>;
    }
}

struct Device {
    durable: MemoryScope,
    session: MemoryScope,
    signals: ProvidedSignals,
    clock: ManualClock,
}

fn tablet() -> EnvironmentSignals {
    EnvironmentSignals {
        user_agent: "Mozilla/5.0 (iPad; CPU OS 17_0) Safari/604.1".to_string(),
        language: "en-AU".to_string(),
        color_depth: 32,
        screen_width: 1024,
        screen_height: 1366,
        timezone_offset_minutes: -600,
    }
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).unwrap()
}

impl Device {
    fn new() -> Self {
        Self {
            durable: MemoryScope::new(),
            session: MemoryScope::new(),
            signals: ProvidedSignals::new(tablet()),
            clock: ManualClock::new(t0()),
        }
    }

    fn store<P: crate::CredentialPayload>(&self) -> SecureCredentialStore<P> {
        self.store_with(StoreConfig::default())
    }

    fn store_with<P: crate::CredentialPayload>(
        &self,
        config: StoreConfig,
    ) -> SecureCredentialStore<P> {
        let fingerprint = SignalFingerprint::with_config(self.signals.clone(), &config.fingerprint);
        SecureCredentialStore::builder()
            .durable(self.durable.clone())
            .session(self.session.clone())
            .fingerprint(fingerprint)
            .clock(self.clock.clone())
            .config(config)
            .build()
            .unwrap()
    }

    fn travel(&self, offset_minutes: i32) {
        let mut signals = tablet();
        signals.timezone_offset_minutes = offset_minutes;
        self.signals.replace(signals);
    }
}

#[tokio::test]
async fn test_store_retrieve_roundtrip() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    let tokens = OAuthTokens::new("abc")
        .with_refresh_token("1//refresh")
        .with_expires_in(3600)
        .with_token_type("Bearer");

    assert!(store.store(&tokens).await);
    assert_eq!(store.retrieve().await, Some(tokens));
}

#[tokio::test]
async fn test_roundtrip_opaque_json() {
    let device = Device::new();
    let store = device.store::<Value>();
    let payload = json!({
        "access_token": "abc",
        "expires_in": 3600,
        "nested": {"list": [1, 2, 3], "flag": true}
    });

    assert!(store.store(&payload).await);
    assert_eq!(store.retrieve().await, Some(payload));
}

#[tokio::test]
async fn test_retrieve_empty_store() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert_eq!(store.retrieve().await, None);
    assert!(!store.exists().await);
}

#[tokio::test]
async fn test_store_overwrites_previous_record() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();

    assert!(store.store(&OAuthTokens::new("first")).await);
    assert!(store.store(&OAuthTokens::new("second")).await);

    let current = store.retrieve().await.unwrap();
    assert_eq!(current.access_token.expose(), "second");
    // record + durable key half
    assert_eq!(device.durable.len().await, 2);
}

#[tokio::test]
async fn test_key_reused_across_stores() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();

    assert!(store.store(&OAuthTokens::new("first")).await);
    let half = device.session.get_item("carevault.key.session").await.unwrap();
    assert!(store.store(&OAuthTokens::new("second")).await);

    assert_eq!(
        device.session.get_item("carevault.key.session").await.unwrap(),
        half
    );
}

#[tokio::test]
async fn test_fingerprint_change_purges() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    device.travel(0);
    assert_eq!(store.retrieve().await, None);

    // purge happened: even the original environment cannot read it back
    device.signals.replace(tablet());
    assert_eq!(store.retrieve().await, None);
    assert!(device.durable.is_empty().await);
    assert!(device.session.is_empty().await);
}

#[tokio::test]
async fn test_narrowed_fingerprint_tolerates_timezone_change() {
    let device = Device::new();
    let mut config = StoreConfig::default();
    config.fingerprint.signals = vec![
        Signal::UserAgent,
        Signal::Language,
        Signal::ColorDepth,
        Signal::ScreenResolution,
    ];
    let store = device.store_with::<OAuthTokens>(config);
    assert!(store.store(&OAuthTokens::new("abc")).await);

    device.travel(-660);
    assert!(store.retrieve().await.is_some());
}

#[tokio::test]
async fn test_remove_clears_everything() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    assert!(store.remove().await);
    assert_eq!(store.retrieve().await, None);
    assert!(device.durable.is_empty().await);
    assert!(device.session.is_empty().await);

    // removing again is still a success
    assert!(store.remove().await);
}

#[tokio::test]
async fn test_session_half_lost() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    device.session.clear().await;
    assert_eq!(store.retrieve().await, None);
    assert!(store.needs_refresh().await);
}

#[tokio::test]
async fn test_durable_half_lost() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    device
        .durable
        .remove_item("carevault.key.durable")
        .await
        .unwrap();
    assert_eq!(store.retrieve().await, None);
}

#[tokio::test]
async fn test_new_session_can_store_again() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("old")).await);

    device.session.clear().await;
    assert!(store.store(&OAuthTokens::new("new")).await);

    let current = store.retrieve().await.unwrap();
    assert_eq!(current.access_token.expose(), "new");
}

#[tokio::test]
async fn test_corrupted_record_is_absent() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    let record = device
        .durable
        .get_item("carevault.credentials")
        .await
        .unwrap()
        .unwrap();
    let mut chars: Vec<char> = record.chars().collect();
    let mid = chars.len() / 2;
    chars[mid] = if chars[mid] == 'z' { 'y' } else { 'z' };
    device
        .durable
        .set_item("carevault.credentials", &chars.into_iter().collect::<String>())
        .await
        .unwrap();

    assert_eq!(store.retrieve().await, None);
}

#[tokio::test]
async fn test_garbage_record_is_absent() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc")).await);

    device
        .durable
        .set_item("carevault.credentials", "{\"access_token\":\"plain\"}")
        .await
        .unwrap();
    assert_eq!(store.retrieve().await, None);
}

#[tokio::test]
async fn test_needs_refresh_lifecycle() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();

    assert!(store.needs_refresh().await);

    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(3600)).await);
    assert!(!store.needs_refresh().await);

    device.clock.set(t0() + Duration::seconds(3600 - 200));
    assert!(store.needs_refresh().await);
}

#[tokio::test]
async fn test_needs_refresh_window_boundary() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(3600)).await);

    device.clock.set(t0() + Duration::seconds(3600 - 301));
    assert!(!store.needs_refresh().await);

    device.clock.set(t0() + Duration::seconds(3600 - 300));
    assert!(store.needs_refresh().await);
}

#[tokio::test]
async fn test_non_expiring_never_needs_refresh() {
    let device = Device::new();
    let store = device.store::<Value>();
    assert!(store.store(&json!({"access_token": "abc"})).await);

    device.clock.advance(Duration::days(365));
    assert!(!store.needs_refresh().await);
    assert_eq!(store.status().await, CredentialStatus::Valid);
}

#[tokio::test]
async fn test_negative_lifetime_is_already_expired() {
    let device = Device::new();
    let store = device.store::<Value>();
    assert!(store.store(&json!({"access_token": "abc", "expires_in": -5})).await);

    assert!(store.needs_refresh().await);
    assert_eq!(store.status().await, CredentialStatus::Expired);
}

#[tokio::test]
async fn test_overflowing_lifetime_is_far_future() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(u64::MAX)).await);

    let envelope = store.retrieve_envelope().await.unwrap();
    assert!(envelope.meta.expires_at.is_some());
    assert!(!store.needs_refresh().await);
    assert_eq!(store.status().await, CredentialStatus::Valid);
}

#[tokio::test]
async fn test_expired_payload_is_still_returned() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(60)).await);

    device.clock.advance(Duration::hours(2));
    assert!(store.retrieve().await.is_some());
    assert!(store.needs_refresh().await);
}

#[tokio::test]
async fn test_status_transitions() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert_eq!(store.status().await, CredentialStatus::Missing);

    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(3600)).await);
    assert_eq!(store.status().await, CredentialStatus::Valid);

    device.clock.set(t0() + Duration::minutes(58));
    assert_eq!(store.status().await, CredentialStatus::ExpiringSoon);

    device.clock.set(t0() + Duration::minutes(61));
    assert_eq!(store.status().await, CredentialStatus::Expired);
    assert_eq!(store.status().await.to_string(), "expired (refresh required)");
}

#[tokio::test]
async fn test_custom_refresh_window() {
    let device = Device::new();
    let config = StoreConfig {
        refresh_window_secs: 900,
        ..StoreConfig::default()
    };
    let store = device.store_with::<OAuthTokens>(config);
    assert_eq!(store.refresh_window(), Duration::minutes(15));
    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(3600)).await);

    device.clock.set(t0() + Duration::minutes(46));
    assert!(store.needs_refresh().await);
}

#[tokio::test]
async fn test_envelope_metadata_exposed() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    assert!(store.store(&OAuthTokens::new("abc").with_expires_in(3600)).await);

    let envelope = store.retrieve_envelope().await.unwrap();
    assert_eq!(envelope.issued_at(), Some(t0()));
    assert_eq!(envelope.expires_at(), Some(t0() + Duration::hours(1)));
}

#[tokio::test]
async fn test_events_published() {
    let device = Device::new();
    let store = device.store::<OAuthTokens>();
    let mut rx = store.subscribe();

    assert!(store.store(&OAuthTokens::new("abc")).await);
    assert!(store.remove().await);
    assert!(store.store(&OAuthTokens::new("abc")).await);
    device.travel(120);
    assert_eq!(store.retrieve().await, None);

    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Stored);
    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Removed);
    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Stored);
    assert_eq!(rx.recv().await.unwrap(), StoreEvent::Purged);
}

#[tokio::test]
async fn test_store_returns_false_on_write_failure() {
    let mut durable = MockScope::new();
    durable.expect_get_item().returning(|_| Ok(None));
    durable
        .expect_set_item()
        .returning(|_, _| Err(StoreError::Storage("quota exceeded".to_string())));

    let store = SecureCredentialStore::<OAuthTokens>::builder()
        .durable(durable)
        .session(MemoryScope::new())
        .fingerprint(SignalFingerprint::new(ProvidedSignals::new(tablet())))
        .build()
        .unwrap();

    assert!(!store.store(&OAuthTokens::new("abc")).await);
}

#[tokio::test]
async fn test_unreadable_scope_degrades_to_absent() {
    let mut durable = MockScope::new();
    durable
        .expect_get_item()
        .returning(|_| Err(StoreError::Storage("io error".to_string())));
    durable
        .expect_remove_item()
        .returning(|_| Err(StoreError::Storage("io error".to_string())));

    let store = SecureCredentialStore::<OAuthTokens>::builder()
        .durable(durable)
        .session(MemoryScope::new())
        .fingerprint(SignalFingerprint::new(ProvidedSignals::new(tablet())))
        .build()
        .unwrap();

    assert_eq!(store.retrieve().await, None);
    assert!(store.needs_refresh().await);
    assert!(!store.remove().await);
}

#[test]
fn test_builder_requires_scopes() {
    let missing_session = SecureCredentialStore::<OAuthTokens>::builder()
        .durable(MemoryScope::new())
        .build();
    assert!(matches!(missing_session, Err(StoreError::Configuration(_))));

    let missing_durable = SecureCredentialStore::<OAuthTokens>::builder()
        .session(MemoryScope::new())
        .build();
    assert!(matches!(missing_durable, Err(StoreError::Configuration(_))));
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = SecureCredentialStore::<OAuthTokens>::builder()
        .durable(MemoryScope::new())
        .session(MemoryScope::new())
        .config(StoreConfig {
            refresh_window_secs: 0,
            ..StoreConfig::default()
        })
        .build();
    assert!(result.is_err());
}

#[test]
fn test_status_needs_refresh_mapping() {
    assert!(CredentialStatus::Missing.needs_refresh());
    assert!(CredentialStatus::Expired.needs_refresh());
    assert!(CredentialStatus::ExpiringSoon.needs_refresh());
    assert!(!CredentialStatus::Valid.needs_refresh());
}
