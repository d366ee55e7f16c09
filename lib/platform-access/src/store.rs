//! Collaborator contracts consumed by the gate.

use async_trait::async_trait;
use ujian_core::{Result, UserId};

use crate::error::AccessError;
use crate::session::{SessionCredentials, SessionResolution};

/// Validates, and where needed refreshes, the session behind a request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolves the principal for the given credentials.
    ///
    /// Rejected credentials are reported as an anonymous resolution, not as
    /// an error. Errors are reserved for the store being unreachable.
    async fn resolve(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<SessionResolution, AccessError>;
}

/// Looks up profile attributes for a principal.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the raw stored `role` value, or `None` if the principal has
    /// no profile or the column is null.
    async fn stored_role(&self, user_id: &UserId) -> Result<Option<String>, AccessError>;
}
