//! Authentication and access control for the ujian server.
//!
//! This module provides:
//! - The client for the hosted auth/REST service
//! - Profile lookups over REST or a direct database connection
//! - Session cookie handling
//! - The access gate middleware and handler extractors
//! - Login and logout routes
//!
//! # Access Model
//!
//! Every request that is not on the exclusion list passes through
//! [`middleware::access_gate`]. The gate resolves the session, reads the
//! caller's role from their profile row, and either lets the request
//! through with a [`RequestContext`](ujian_platform_access::RequestContext)
//! extension or redirects the caller. Handlers read the context through the
//! extractors in [`middleware`].
//!
//! Roles are read from the profile on every request, so a role change takes
//! effect immediately. Each lookup is bounded by the gate's timeout.

pub mod cookies;
pub mod db;
pub mod middleware;
pub mod profiles;
pub mod routes;
pub mod supabase;

use std::sync::Arc;
use ujian_platform_access::{AccessGate, ExclusionList};

use crate::config::SessionConfig;

pub use middleware::{AuthRejection, CurrentUser, MaybeUser, RequireSuperadmin, access_gate};
pub use profiles::ProfileBackend;
pub use routes::{login, logout};
pub use supabase::SupabaseClient;

/// Shared application state.
pub struct AppState {
    /// Per-request access gate.
    pub gate: AccessGate,
    /// Client for the hosted service; absent when it is not configured.
    pub supabase: Option<SupabaseClient>,
    /// Profile backend used for admin operations.
    pub profiles: Option<Arc<ProfileBackend>>,
    /// Session cookie configuration.
    pub session_config: SessionConfig,
    /// Requests the gate never sees.
    pub exclusions: ExclusionList,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        gate: AccessGate,
        supabase: Option<SupabaseClient>,
        profiles: Option<Arc<ProfileBackend>>,
        session_config: SessionConfig,
        exclusions: ExclusionList,
    ) -> Self {
        Self {
            gate,
            supabase,
            profiles,
            session_config,
            exclusions,
        }
    }
}
