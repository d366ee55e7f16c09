//! In-memory collaborators and request helpers shared by router tests.

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use ujian_core::UserId;
use ujian_platform_access::{
    AccessError, AccessGate, ExclusionList, Principal, ProfileStore, SessionCredentials,
    SessionResolution, SessionStore, SessionTokens, SessionUpdate,
};

use crate::auth::AppState;
use crate::config::SessionConfig;

pub const VALID_REFRESH: &str = "valid-refresh";
pub const ROTATED_ACCESS: &str = "rotated-access";

/// Access token → user id. Roles live in [`FakeProfiles`].
pub const USERS: &[(&str, &str)] = &[
    ("token-superadmin", "u-superadmin"),
    ("token-admin-prodi", "u-admin-prodi"),
    ("token-dosen", "u-dosen"),
    ("token-pengawas", "u-pengawas"),
    ("token-mahasiswa", "u-mahasiswa"),
    ("token-norole", "u-norole"),
    ("token-weird", "u-weird"),
];

const ROLES: &[(&str, &str)] = &[
    ("u-superadmin", "superadmin"),
    ("u-admin-prodi", "admin_prodi"),
    ("u-dosen", "dosen"),
    ("u-pengawas", "pengawas"),
    ("u-mahasiswa", "mahasiswa"),
    ("u-weird", "lecturer"),
];

fn principal(id: &str) -> Principal {
    let id: UserId = id.parse().expect("user id");
    Principal::new(id).with_email(Some("staff@poltrans.com".to_string()))
}

/// Session store keyed on fixed tokens.
///
/// The refresh token [`VALID_REFRESH`] rotates into a session for `u-dosen`.
#[derive(Default)]
pub struct FakeSessions {
    calls: AtomicUsize,
}

impl FakeSessions {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for FakeSessions {
    async fn resolve(
        &self,
        credentials: &SessionCredentials,
    ) -> ujian_core::Result<SessionResolution, AccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let known = credentials
            .access_token()
            .and_then(|token| USERS.iter().find(|(t, _)| *t == token));
        if let Some((_, id)) = known {
            return Ok(SessionResolution::authenticated(
                principal(id),
                SessionUpdate::Unchanged,
            ));
        }

        if credentials.refresh_token() == Some(VALID_REFRESH) {
            let tokens = SessionTokens::new(
                ROTATED_ACCESS.to_string(),
                "rotated-refresh".to_string(),
                Utc::now() + Duration::hours(1),
            );
            return Ok(SessionResolution::authenticated(
                principal("u-dosen"),
                SessionUpdate::Refreshed(tokens),
            ));
        }

        Ok(if credentials.is_empty() {
            SessionResolution::anonymous()
        } else {
            SessionResolution::cleared()
        })
    }
}

/// Profile store over a fixed role table.
pub struct FakeProfiles {
    roles: HashMap<String, String>,
}

impl Default for FakeProfiles {
    fn default() -> Self {
        Self {
            roles: ROLES
                .iter()
                .map(|(id, role)| ((*id).to_string(), (*role).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn stored_role(&self, id: &UserId) -> ujian_core::Result<Option<String>, AccessError> {
        Ok(self.roles.get(id.as_str()).cloned())
    }
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        secure_cookies: false,
        ..SessionConfig::default()
    }
}

/// State with an enforcing gate over the fakes and no hosted backend.
pub fn enforcing_state(sessions: Arc<FakeSessions>) -> Arc<AppState> {
    let gate = AccessGate::enforcing(
        sessions,
        Arc::new(FakeProfiles::default()),
        std::time::Duration::from_millis(200),
    );
    Arc::new(AppState::new(
        gate,
        None,
        None,
        session_config(),
        ExclusionList::default(),
    ))
}

/// State with the gate bypassed, as when no hosted backend is configured.
pub fn bypass_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        AccessGate::bypass("not configured"),
        None,
        None,
        session_config(),
        ExclusionList::default(),
    ))
}

/// A request carrying the given session cookies.
pub fn request(
    method: &str,
    path: &str,
    access: Option<&str>,
    refresh: Option<&str>,
) -> Request<Body> {
    let mut cookies = Vec::new();
    if let Some(token) = access {
        cookies.push(format!("ujian-access-token={token}"));
    }
    if let Some(token) = refresh {
        cookies.push(format!("ujian-refresh-token={token}"));
    }

    let mut builder = Request::builder().method(method).uri(path);
    if !cookies.is_empty() {
        builder = builder.header("cookie", cookies.join("; "));
    }
    builder.body(Body::empty()).expect("request")
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(response: &axum::response::Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
