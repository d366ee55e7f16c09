//! Session credentials and the mutations produced while resolving them.
//!
//! The session store owns token validation and rotation. The gate only
//! carries the resulting [`SessionUpdate`] through to the response, so that
//! rotated tokens reach the browser on every code path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::principal::Principal;

/// Tokens presented by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl SessionCredentials {
    /// Creates credentials from optional tokens. Blank tokens are dropped.
    #[must_use]
    pub fn new(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            refresh_token: refresh_token.filter(|t| !t.trim().is_empty()),
        }
    }

    /// Credentials carrying no tokens.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the access token, if present.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns the refresh token, if present.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Returns true if no token was presented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// A freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl SessionTokens {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Returns the access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Returns when the access token expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Credential changes the response must carry back to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionUpdate {
    /// Nothing to write.
    #[default]
    Unchanged,
    /// Tokens were rotated and must replace the presented ones.
    Refreshed(SessionTokens),
    /// The presented tokens are dead and must be removed.
    Cleared,
}

/// Result of asking the session store about a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResolution {
    /// The authenticated caller, if any.
    pub principal: Option<Principal>,
    /// Credential changes to apply to the response.
    pub update: SessionUpdate,
}

impl SessionResolution {
    /// No principal and nothing to write.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated principal with the given credential changes.
    #[must_use]
    pub fn authenticated(principal: Principal, update: SessionUpdate) -> Self {
        Self {
            principal: Some(principal),
            update,
        }
    }

    /// No principal; the presented credentials must be removed.
    #[must_use]
    pub fn cleared() -> Self {
        Self {
            principal: None,
            update: SessionUpdate::Cleared,
        }
    }
}
