//! Credential status reporting

use serde::{Deserialize, Serialize};

/// Summary of what the store currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Nothing retrievable; the user must sign in
    Missing,
    /// Present and outside the refresh window (or non-expiring)
    Valid,
    /// Present but expiring within the refresh window
    ExpiringSoon,
    /// Present but past its expiry
    Expired,
}

impl CredentialStatus {
    /// Whether the caller should run a refresh or sign-in flow
    #[must_use]
    pub fn needs_refresh(self) -> bool {
        !matches!(self, Self::Valid)
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "not signed in"),
            Self::Valid => write!(f, "valid"),
            Self::ExpiringSoon => write!(f, "expiring soon (refresh recommended)"),
            Self::Expired => write!(f, "expired (refresh required)"),
        }
    }
}
