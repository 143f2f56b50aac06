//! Credential store error types

use carevault_crypto::CryptoError;
use thiserror::Error;

/// Errors raised inside the credential store layers.
///
/// These never reach callers of [`crate::SecureCredentialStore`]; the facade
/// logs them and degrades to an absent credential or a `false` result.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage scope read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encryption or decryption failure
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Envelope (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<CryptoError> for StoreError {
    fn from(e: CryptoError) -> Self {
        Self::Encryption(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for credential store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_conversion() {
        let err: StoreError = CryptoError::DecryptionFailed.into();
        assert!(matches!(err, StoreError::Encryption(_)));
        assert_eq!(err.to_string(), "Encryption error: decryption failed");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
