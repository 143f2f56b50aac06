//! Carevault - device-bound credential storage for the patient-management client
//!
//! Wires the secure credential store to its host: configuration from
//! embedded defaults, files and `CAREVAULT_*` variables; tracing output;
//! a durable scope on disk and an in-process session scope.
//!
//! ```no_run
//! use carevault::{AppConfig, OAuthTokens};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = AppConfig::load(None)?;
//! carevault::logging::init(&config.logging);
//!
//! let store = carevault::open_store::<OAuthTokens>(&config)?;
//! if store.needs_refresh().await {
//!     // send the user through sign-in or the refresh flow
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod logging;

pub use carevault_core::*;
pub use config::AppConfig;
pub use logging::LoggingConfig;

use anyhow::{Context, Result};
use tracing::info;

/// Open a store with a fresh session scope.
///
/// Each call starts a new session: credentials written by an earlier
/// process are unreadable until the user signs in again.
pub fn open_store<P: CredentialPayload>(config: &AppConfig) -> Result<SecureCredentialStore<P>> {
    open_store_with_session(config, MemoryScope::new())
}

/// Open a store sharing an existing session scope.
///
/// Stores opened with clones of the same `session` can read each other's
/// credentials.
pub fn open_store_with_session<P: CredentialPayload>(
    config: &AppConfig,
    session: MemoryScope,
) -> Result<SecureCredentialStore<P>> {
    let durable_path = config.durable_path()?;
    info!(path = %durable_path.display(), "Opening secure credential store");

    SecureCredentialStore::builder()
        .durable(FileScope::new(durable_path))
        .session(session)
        .fingerprint(SignalFingerprint::with_config(
            HostSignals,
            &config.store.fingerprint,
        ))
        .config(config.store.clone())
        .build()
        .context("Failed to build secure credential store")
}
