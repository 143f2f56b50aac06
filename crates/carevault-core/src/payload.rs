//! Credential payload types
//!
//! The store treats payloads as opaque apart from one hook: how long the
//! credential lives after it was issued.

use crate::secure_string::SecureString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A payload the secure store can protect.
pub trait CredentialPayload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Lifetime of the credential counted from the moment it is stored.
    ///
    /// `None` means the credential does not expire. A lifetime too long to
    /// represent as a timestamp expires at the latest representable instant.
    fn expires_in(&self) -> Option<Duration> {
        None
    }
}

/// OAuth2 token payload as handed over by the token issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// Access token for API calls
    pub access_token: SecureString,
    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<SecureString>,
    /// Lifetime of the access token in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Token type (usually "Bearer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Space-separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Any other fields the issuer returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OAuthTokens {
    /// Create a token payload holding only an access token
    #[must_use]
    pub fn new(access_token: impl Into<SecureString>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            token_type: None,
            scope: None,
            extra: Map::new(),
        }
    }

    /// Set the refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<SecureString>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Set the lifetime in seconds
    #[must_use]
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    /// Set the token type
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = Some(token_type.into());
        self
    }

    /// Set the granted scopes
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Value for an `Authorization` header
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let kind = self.token_type.as_deref().unwrap_or("Bearer");
        format!("{} {}", kind, self.access_token.expose())
    }
}

impl CredentialPayload for OAuthTokens {
    fn expires_in(&self) -> Option<Duration> {
        self.expires_in.map(Duration::from_secs)
    }
}

/// Reads a numeric `expires_in`. Negative lifetimes are already expired;
/// lifetimes too large for a `Duration` saturate.
impl CredentialPayload for Value {
    fn expires_in(&self) -> Option<Duration> {
        let field = self.get("expires_in")?;
        if let Some(secs) = field.as_u64() {
            return Some(Duration::from_secs(secs));
        }

        let secs = field.as_f64()?;
        if secs.is_nan() || secs <= 0.0 {
            return Some(Duration::ZERO);
        }
        Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }
}
