//! Profile lookups over either the REST interface or a direct connection.

use async_trait::async_trait;
use ujian_core::UserId;
use ujian_platform_access::{AccessError, ProfileStore};

use super::db::ProfileRepository;
use super::supabase::SupabaseClient;
use crate::error::BackendError;

/// Where profile rows live.
#[derive(Debug, Clone)]
pub enum ProfileBackend {
    /// The hosted REST interface.
    Rest(SupabaseClient),
    /// The underlying PostgreSQL database.
    Postgres(ProfileRepository),
}

impl ProfileBackend {
    /// Returns the name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rest(_) => "rest",
            Self::Postgres(_) => "postgres",
        }
    }

    /// Reads the raw stored role of a user.
    pub async fn find_role(&self, id: &UserId) -> Result<Option<String>, BackendError> {
        match self {
            Self::Rest(client) => client.fetch_stored_role(id).await,
            Self::Postgres(repo) => repo.find_role(id).await.map_err(database_error),
        }
    }

    /// Deletes a profile row. Returns whether a row was removed.
    pub async fn delete_profile(&self, id: &UserId) -> Result<bool, BackendError> {
        match self {
            Self::Rest(client) => client.delete_profile(id).await,
            Self::Postgres(repo) => repo.delete(id).await.map_err(database_error),
        }
    }
}

fn database_error(e: sqlx::Error) -> BackendError {
    BackendError::Database {
        details: e.to_string(),
    }
}

#[async_trait]
impl ProfileStore for ProfileBackend {
    async fn stored_role(&self, id: &UserId) -> ujian_core::Result<Option<String>, AccessError> {
        let role = self
            .find_role(id)
            .await
            .map_err(|e| AccessError::ProfileLookup {
                details: e.to_string(),
            })?;
        Ok(role)
    }
}
