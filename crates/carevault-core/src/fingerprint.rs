//! Device fingerprinting
//!
//! A fingerprint is the lowercase hex SHA-256 of a fixed, ordered set of
//! environment signals joined with `|`. It is not secret and never feeds key
//! material; envelopes carry it so that ciphertext copied to another device
//! or browser profile is recognised and discarded.
//!
//! Some signals drift legitimately (timezone offset across DST or travel,
//! resolution on display scaling changes). Each such drift reads as tampering
//! and forces a re-login, so the signal set is configurable through
//! [`FingerprintConfig`].

use chrono::{Local, Offset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::{Arc, PoisonError, RwLock};

/// Separator between signal values in the hashed string
const SIGNAL_SEPARATOR: &str = "|";

/// One environment attribute that can contribute to a fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// User-agent string
    UserAgent,
    /// Preferred language tag
    Language,
    /// Display color depth in bits
    ColorDepth,
    /// Screen resolution as `WIDTHxHEIGHT`
    ScreenResolution,
    /// Offset from UTC in minutes
    TimezoneOffset,
}

impl Signal {
    /// All signals in canonical hashing order
    pub const ALL: [Signal; 5] = [
        Signal::UserAgent,
        Signal::Language,
        Signal::ColorDepth,
        Signal::ScreenResolution,
        Signal::TimezoneOffset,
    ];
}

/// Raw environment attributes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentSignals {
    /// User-agent string
    pub user_agent: String,
    /// Preferred language tag (e.g. `en-US`)
    pub language: String,
    /// Color depth in bits, 0 if unknown
    pub color_depth: u32,
    /// Screen width in pixels, 0 if unknown
    pub screen_width: u32,
    /// Screen height in pixels, 0 if unknown
    pub screen_height: u32,
    /// Offset from UTC in minutes
    pub timezone_offset_minutes: i32,
}

impl EnvironmentSignals {
    fn value_of(&self, signal: Signal) -> String {
        match signal {
            Signal::UserAgent => self.user_agent.clone(),
            Signal::Language => self.language.clone(),
            Signal::ColorDepth => self.color_depth.to_string(),
            Signal::ScreenResolution => format!("{}x{}", self.screen_width, self.screen_height),
            Signal::TimezoneOffset => self.timezone_offset_minutes.to_string(),
        }
    }
}

/// Which signals a fingerprint covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Selected signals; hashing order is always canonical
    #[serde(default = "default_signals")]
    pub signals: Vec<Signal>,
}

/// Returns every signal; the broadest binding.
pub fn default_signals() -> Vec<Signal> {
    Signal::ALL.to_vec()
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            signals: default_signals(),
        }
    }
}

/// Hash the selected signals into a fingerprint.
///
/// Deterministic for equal inputs; selection order does not matter.
#[must_use]
pub fn compute_fingerprint(env: &EnvironmentSignals, selected: &[Signal]) -> String {
    let joined = Signal::ALL
        .iter()
        .filter(|signal| selected.contains(*signal))
        .map(|signal| env.value_of(*signal))
        .collect::<Vec<_>>()
        .join(SIGNAL_SEPARATOR);

    hex::encode(Sha256::digest(joined.as_bytes()))
}

/// Produces the current device fingerprint
pub trait FingerprintProvider: Send + Sync {
    /// Fingerprint of the environment right now
    fn fingerprint(&self) -> String;
}

/// Reads environment signals from the host
pub trait SignalSource: Send + Sync {
    /// Current signal values
    fn signals(&self) -> EnvironmentSignals;
}

/// Signals handed in by an embedding host (e.g. a webview bridge).
///
/// Clones share state; [`ProvidedSignals::replace`] updates every handle.
#[derive(Debug, Clone, Default)]
pub struct ProvidedSignals {
    inner: Arc<RwLock<EnvironmentSignals>>,
}

impl ProvidedSignals {
    /// Wrap a fixed set of signals
    #[must_use]
    pub fn new(signals: EnvironmentSignals) -> Self {
        Self {
            inner: Arc::new(RwLock::new(signals)),
        }
    }

    /// Swap in new values, e.g. after the host reports a timezone change
    pub fn replace(&self, signals: EnvironmentSignals) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = signals;
    }
}

impl SignalSource for ProvidedSignals {
    fn signals(&self) -> EnvironmentSignals {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Signals derived from the native host.
///
/// Display attributes are not observable here and report 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSignals;

impl HostSignals {
    fn user_agent() -> String {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown-host".to_string());
        format!(
            "carevault/{} ({}; {}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH,
            host
        )
    }

    fn language() -> String {
        std::env::var("LC_ALL")
            .or_else(|_| std::env::var("LANG"))
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| v.split('.').next().unwrap_or_default().replace('_', "-"))
            .unwrap_or_else(|| "und".to_string())
    }
}

impl SignalSource for HostSignals {
    fn signals(&self) -> EnvironmentSignals {
        EnvironmentSignals {
            user_agent: Self::user_agent(),
            language: Self::language(),
            color_depth: 0,
            screen_width: 0,
            screen_height: 0,
            timezone_offset_minutes: Local::now().offset().fix().local_minus_utc() / 60,
        }
    }
}

/// Fingerprint provider hashing a [`SignalSource`]
#[derive(Debug, Clone)]
pub struct SignalFingerprint<S> {
    source: S,
    signals: Vec<Signal>,
}

impl<S: SignalSource> SignalFingerprint<S> {
    /// Fingerprint over every signal
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_config(source, &FingerprintConfig::default())
    }

    /// Fingerprint over the configured signals
    #[must_use]
    pub fn with_config(source: S, config: &FingerprintConfig) -> Self {
        Self {
            source,
            signals: config.signals.clone(),
        }
    }
}

impl<S: SignalSource> FingerprintProvider for SignalFingerprint<S> {
    fn fingerprint(&self) -> String {
        compute_fingerprint(&self.source.signals(), &self.signals)
    }
}

#[cfg(test)]
mod tests;
