//! Session cookies.
//!
//! The access and refresh tokens travel in two HttpOnly cookies named
//! `<prefix>-access-token` and `<prefix>-refresh-token`. API clients may
//! instead send the access token as a bearer token.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;
use ujian_platform_access::{SessionCredentials, SessionTokens, SessionUpdate};

use crate::config::SessionConfig;

/// Name of the access-token cookie.
#[must_use]
pub fn access_cookie_name(config: &SessionConfig) -> String {
    format!("{}-access-token", config.cookie_prefix)
}

/// Name of the refresh-token cookie.
#[must_use]
pub fn refresh_cookie_name(config: &SessionConfig) -> String {
    format!("{}-refresh-token", config.cookie_prefix)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}

/// Collects the credentials presented by a request.
///
/// A bearer token takes precedence over the access-token cookie.
#[must_use]
pub fn credentials(
    headers: &HeaderMap,
    jar: &CookieJar,
    config: &SessionConfig,
) -> SessionCredentials {
    let access_token = bearer_token(headers).or_else(|| {
        jar.get(&access_cookie_name(config))
            .map(|c| c.value().to_string())
    });
    let refresh_token = jar
        .get(&refresh_cookie_name(config))
        .map(|c| c.value().to_string());
    SessionCredentials::new(access_token, refresh_token)
}

fn session_cookie(name: String, value: String, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::days(config.refresh_max_age_days))
        .build()
}

fn removal_cookie(name: String) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

/// Writes a freshly issued token pair.
#[must_use]
pub fn store_tokens(jar: CookieJar, tokens: &SessionTokens, config: &SessionConfig) -> CookieJar {
    jar.add(session_cookie(
        access_cookie_name(config),
        tokens.access_token().to_string(),
        config,
    ))
    .add(session_cookie(
        refresh_cookie_name(config),
        tokens.refresh_token().to_string(),
        config,
    ))
}

/// Expires both session cookies.
#[must_use]
pub fn clear(jar: CookieJar, config: &SessionConfig) -> CookieJar {
    jar.add(removal_cookie(access_cookie_name(config)))
        .add(removal_cookie(refresh_cookie_name(config)))
}

/// Applies a session update produced while resolving the request.
#[must_use]
pub fn apply_update(jar: CookieJar, update: &SessionUpdate, config: &SessionConfig) -> CookieJar {
    match update {
        SessionUpdate::Unchanged => jar,
        SessionUpdate::Refreshed(tokens) => store_tokens(jar, tokens, config),
        SessionUpdate::Cleared => clear(jar, config),
    }
}
