//! Client for the hosted authentication and REST service.
//!
//! Session validation and token rotation go through the auth API
//! (`/auth/v1`); profile rows are read from the REST interface
//! (`/rest/v1/users`).

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, Response, Url};
use rootcause::prelude::Report;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, instrument};
use ujian_core::UserId;
use ujian_platform_access::{
    AccessError, Principal, SessionCredentials, SessionResolution, SessionStore, SessionTokens,
    SessionUpdate,
};

use crate::config::BackendEndpoint;
use crate::error::BackendError;

/// Access tokens this close to expiry are refreshed instead of validated.
const EXPIRY_SKEW_SECONDS: i64 = 10;

/// Lifetime assumed when the service reports no expiry at all.
const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3_600;

/// A signed-in user together with the tokens issued for them.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub principal: Principal,
    pub tokens: SessionTokens,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl AuthUser {
    fn into_principal(self) -> Result<Principal, BackendError> {
        let id = UserId::from_str(&self.id).map_err(|e| BackendError::InvalidResponse {
            details: format!("invalid user id '{}': {}", self.id, e),
        })?;
        Ok(Principal::new(id).with_email(self.email))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Result<IssuedSession, BackendError> {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)))
            .or_else(|| access_token_expiry(&self.access_token))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECONDS));

        Ok(IssuedSession {
            principal: self.user.into_principal()?,
            tokens: SessionTokens::new(self.access_token, self.refresh_token, expires_at),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    #[serde(default)]
    role: Option<String>,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
///
/// Only used to decide whether a token is worth sending for validation;
/// the service remains the authority.
#[must_use]
pub fn access_token_expiry(token: &str) -> Option<DateTime<Utc>> {
    #[derive(Deserialize)]
    struct Claims {
        exp: i64,
    }

    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp, 0)
}

/// Picks the human-readable message out of a service error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

/// HTTP client for the hosted auth/REST service.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
    service_role_key: Option<String>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("service_role_key", &self.service_role_key.is_some())
            .finish()
    }
}

impl SupabaseClient {
    /// Creates a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(endpoint: &BackendEndpoint) -> Result<Self, Report<BackendError>> {
        let http = reqwest::Client::builder()
            .timeout(endpoint.request_timeout)
            .build()
            .map_err(|e| BackendError::Transport {
                details: e.to_string(),
            })?;

        let mut base_url = endpoint.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            anon_key: endpoint.anon_key.clone(),
            service_role_key: endpoint.service_role_key.clone(),
        })
    }

    /// Returns true if admin operations are available.
    #[must_use]
    pub fn has_service_key(&self) -> bool {
        self.service_role_key.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::InvalidResponse {
                details: format!("cannot build url for '{}': {}", path, e),
            })
    }

    fn service_key(&self) -> Result<&str, BackendError> {
        self.service_role_key
            .as_deref()
            .ok_or(BackendError::MissingServiceKey)
    }

    /// Key used for profile reads: the service key when available, so
    /// row-level security on `users` does not hide the caller's own row.
    fn profile_key(&self) -> &str {
        self.service_role_key.as_deref().unwrap_or(&self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                details: e.to_string(),
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Rejected {
            status,
            message: error_message(&body),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidResponse {
                details: e.to_string(),
            })
    }

    /// Validates an access token and returns its owner.
    #[instrument(skip_all)]
    pub async fn current_user(&self, access_token: &str) -> Result<Principal, BackendError> {
        let request = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        let response = self.send(request).await?;
        Self::read_json::<AuthUser>(response).await?.into_principal()
    }

    /// Exchanges a refresh token for a new token pair.
    #[instrument(skip_all)]
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<IssuedSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");
        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }));
        let response = self.send(request).await?;
        Self::read_json::<TokenResponse>(response).await?.into_session()
    }

    /// Signs a user in with email and password.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;
        Self::read_json::<TokenResponse>(response).await?.into_session()
    }

    /// Revokes the session behind an access token.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let request = self
            .http
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token);
        self.send(request).await?;
        Ok(())
    }

    /// Deletes an auth user through the admin API.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_auth_user(&self, user_id: &UserId) -> Result<(), BackendError> {
        let key = self.service_key()?;
        let mut url = self.endpoint("auth/v1/admin/users")?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidResponse {
                details: "backend url cannot carry a path".to_string(),
            })?
            .push(user_id.as_str());

        let request = self
            .http
            .delete(url)
            .header("apikey", key)
            .bearer_auth(key);
        self.send(request).await?;
        Ok(())
    }

    /// Reads the raw `role` column of a profile row.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn fetch_stored_role(
        &self,
        user_id: &UserId,
    ) -> Result<Option<String>, BackendError> {
        let key = self.profile_key();
        let request = self
            .http
            .get(self.endpoint("rest/v1/users")?)
            .query(&[
                ("id", format!("eq.{}", user_id)),
                ("select", "role".to_string()),
            ])
            .header("apikey", key)
            .bearer_auth(key);
        let response = self.send(request).await?;
        let rows: Vec<RoleRow> = Self::read_json(response).await?;
        Ok(rows.into_iter().next().and_then(|row| row.role))
    }

    /// Deletes a profile row. Returns whether a row was removed.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_profile(&self, user_id: &UserId) -> Result<bool, BackendError> {
        let key = self.service_key()?;
        let request = self
            .http
            .delete(self.endpoint("rest/v1/users")?)
            .query(&[("id", format!("eq.{}", user_id))])
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=representation");
        let response = self.send(request).await?;
        let rows: Vec<serde_json::Value> = Self::read_json(response).await?;
        Ok(!rows.is_empty())
    }

    /// Validates the presented credentials, refreshing them when needed.
    async fn resolve_credentials(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<SessionResolution, BackendError> {
        if let Some(access_token) = credentials.access_token() {
            let still_fresh = access_token_expiry(access_token)
                .is_none_or(|exp| exp > Utc::now() + Duration::seconds(EXPIRY_SKEW_SECONDS));

            if still_fresh {
                match self.current_user(access_token).await {
                    Ok(principal) => {
                        return Ok(SessionResolution::authenticated(
                            principal,
                            SessionUpdate::Unchanged,
                        ));
                    }
                    Err(e) if e.is_auth_rejection() => {
                        debug!(error = %e, "access token rejected");
                    }
                    Err(e) => return Err(e),
                }
            } else {
                debug!("access token expired");
            }
        }

        let Some(refresh_token) = credentials.refresh_token() else {
            return Ok(if credentials.is_empty() {
                SessionResolution::anonymous()
            } else {
                SessionResolution::cleared()
            });
        };

        match self.refresh_session(refresh_token).await {
            Ok(issued) => {
                debug!(user_id = %issued.principal.id(), "session refreshed");
                Ok(SessionResolution::authenticated(
                    issued.principal,
                    SessionUpdate::Refreshed(issued.tokens),
                ))
            }
            Err(e) if e.is_auth_rejection() => {
                debug!(error = %e, "refresh token rejected");
                Ok(SessionResolution::cleared())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SessionStore for SupabaseClient {
    async fn resolve(
        &self,
        credentials: &SessionCredentials,
    ) -> ujian_core::Result<SessionResolution, AccessError> {
        let resolution = self
            .resolve_credentials(credentials)
            .await
            .map_err(|e| AccessError::SessionLookup {
                details: e.to_string(),
            })?;
        Ok(resolution)
    }
}
