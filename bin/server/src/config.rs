//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from an optional TOML file (path taken from
//! `UJIAN_CONFIG`) overlaid with environment variables. Nested keys use a
//! double underscore, e.g. `SUPABASE__URL` or `SESSION__SECURE_COOKIES`.

use reqwest::Url;
use rootcause::prelude::Report;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ujian_platform_access::ExclusionList;

use crate::error::ConfigurationError;

/// Value shipped in sample environments in place of a real backend URL.
pub const PLACEHOLDER_BACKEND_URL: &str = "YOUR_SUPABASE_URL";

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "UJIAN_CONFIG";

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Hosted authentication/database service.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Where profile roles are read from.
    #[serde(default)]
    pub profile_backend: ProfileBackendKind,

    /// PostgreSQL connection URL, required for the `postgres` profile backend.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Access gate tuning.
    #[serde(default)]
    pub gate: GateConfig,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Hosted auth/REST service settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    #[serde(default)]
    pub url: Option<String>,
    /// Public (anon) API key.
    #[serde(default)]
    pub anon_key: Option<String>,
    /// Service-role key, needed for admin operations.
    #[serde(default)]
    pub service_role_key: Option<String>,
    /// Timeout for requests that are not gate lookups (login, admin).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

/// Where the gate reads profile roles from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileBackendKind {
    /// The hosted REST interface over the `users` table.
    #[default]
    Rest,
    /// A direct connection to the underlying PostgreSQL database.
    Postgres,
}

/// Access gate settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Bound on each session or profile lookup, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Bound on a whole session lookup, refresh included, in milliseconds.
    /// Defaults to twice `lookup_timeout_ms`.
    #[serde(default)]
    pub session_timeout_ms: Option<u64>,

    /// Requests that bypass the gate entirely.
    #[serde(default)]
    pub exclusions: ExclusionList,
}

fn default_lookup_timeout_ms() -> u64 {
    300
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout_ms(),
            session_timeout_ms: None,
            exclusions: ExclusionList::default(),
        }
    }
}

impl GateConfig {
    /// Returns the lookup bound as a duration.
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Returns the session lookup bound, which covers a validate and a
    /// refresh call.
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        self.session_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.lookup_timeout().saturating_mul(2))
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,

    /// Prefix of the session cookie names.
    #[serde(default = "default_cookie_prefix")]
    pub cookie_prefix: String,

    /// Lifetime of the refresh-token cookie, in days.
    #[serde(default = "default_refresh_max_age_days")]
    pub refresh_max_age_days: i64,
}

fn default_secure_cookies() -> bool {
    true
}

fn default_cookie_prefix() -> String {
    "ujian".to_string()
}

fn default_refresh_max_age_days() -> i64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secure_cookies: default_secure_cookies(),
            cookie_prefix: default_cookie_prefix(),
            refresh_max_age_days: default_refresh_max_age_days(),
        }
    }
}

/// A usable backend endpoint.
#[derive(Debug, Clone)]
pub struct BackendEndpoint {
    pub url: Url,
    pub anon_key: String,
    pub service_role_key: Option<String>,
    pub request_timeout: Duration,
}

/// Whether the hosted backend is configured.
#[derive(Debug, Clone)]
pub enum BackendStatus {
    /// The backend can be reached at this endpoint.
    Configured(BackendEndpoint),
    /// The backend is deliberately not configured; the gate runs in bypass mode.
    Unconfigured { reason: String },
}

impl SupabaseConfig {
    /// Classifies the backend configuration.
    ///
    /// Only a missing or blank URL, or the literal placeholder value, yields
    /// [`BackendStatus::Unconfigured`]. Anything else must be a valid
    /// `http(s)` URL accompanied by an anon key.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is present but unusable, or the anon key
    /// is missing.
    pub fn status(&self) -> Result<BackendStatus, Report<ConfigurationError>> {
        let raw = self.url.as_deref().map(str::trim).unwrap_or_default();

        if raw.is_empty() {
            return Ok(BackendStatus::Unconfigured {
                reason: "SUPABASE__URL is not set".to_string(),
            });
        }
        if raw == PLACEHOLDER_BACKEND_URL {
            return Ok(BackendStatus::Unconfigured {
                reason: format!("SUPABASE__URL holds the placeholder '{PLACEHOLDER_BACKEND_URL}'"),
            });
        }

        let url = Url::parse(raw).map_err(|e| ConfigurationError::InvalidBackendUrl {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidBackendUrl {
                value: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }
            .into());
        }

        let anon_key = non_blank(self.anon_key.as_deref()).ok_or(ConfigurationError::MissingKey {
            key: "SUPABASE__ANON_KEY",
        })?;

        Ok(BackendStatus::Configured(BackendEndpoint {
            url,
            anon_key,
            service_role_key: non_blank(self.service_role_key.as_deref()),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ServerConfig {
    /// Loads configuration from the file named by `UJIAN_CONFIG`, if any,
    /// and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load(file.as_deref(), None)
    }

    /// Loads configuration from an optional file overlaid with environment
    /// variables. `env` replaces the process environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong type.
    pub fn load(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the database URL required by the configured profile backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the `postgres` backend is selected without a URL.
    pub fn postgres_url(&self) -> Result<Option<&str>, Report<ConfigurationError>> {
        match self.profile_backend {
            ProfileBackendKind::Rest => Ok(None),
            ProfileBackendKind::Postgres => self
                .database_url
                .as_deref()
                .filter(|url| !url.trim().is_empty())
                .map(Some)
                .ok_or_else(|| ConfigurationError::MissingKey { key: "DATABASE_URL" }.into()),
        }
    }
}
