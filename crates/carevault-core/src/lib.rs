//! Carevault Core - Secure Credential Store
//!
//! Persists OAuth tokens inside an untrusted client without a server
//! session. The store is layered as:
//! - Fingerprint: binds envelopes to the device's environment signals
//! - Keys: a random 256-bit key split across durable and session scopes
//! - Envelope: payload + fingerprint + timestamps, sealed with AES-256-GCM
//! - Store: the put/get/delete/needs-refresh facade used by the application
//!
//! ## Failure model
//!
//! The facade never returns errors. Missing key halves, a missing or corrupt
//! record, and foreign ciphertext all read as "no credential". A fingerprint
//! mismatch also destroys the record and key.
//!
//! ```no_run
//! use carevault_core::{MemoryScope, FileScope, OAuthTokens, SecureCredentialStore};
//!
//! # async fn demo() -> carevault_core::Result<()> {
//! let store = SecureCredentialStore::<OAuthTokens>::builder()
//!     .durable(FileScope::new("/var/lib/carevault/durable.json"))
//!     .session(MemoryScope::new())
//!     .build()?;
//!
//! store.store(&OAuthTokens::new("ya29.token").with_expires_in(3600)).await;
//! if store.needs_refresh().await {
//!     // run the OAuth refresh flow
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod envelope;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod keys;
pub mod payload;
pub mod scope;
pub mod secure_string;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use envelope::{CredentialEnvelope, EnvelopeCodec, EnvelopeMeta};
pub use error::{Result, StoreError};
pub use events::{StoreEvent, StoreEvents};
pub use fingerprint::{
    compute_fingerprint, EnvironmentSignals, FingerprintConfig, FingerprintProvider, HostSignals,
    ProvidedSignals, Signal, SignalFingerprint, SignalSource,
};
pub use keys::{EncryptionKey, KeyManager};
pub use payload::{CredentialPayload, OAuthTokens};
pub use scope::{FileScope, MemoryScope, ScopeKind, StorageScope};
pub use secure_string::SecureString;
pub use store::{CredentialStatus, SecureCredentialStore, StoreBuilder};
