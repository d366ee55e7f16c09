//! Authentication routes for password login and logout.

use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use ujian_platform_access::route::LOGIN_ROOT;

use super::{AppState, cookies};
use crate::error::LoginError;

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Signs the user in with email and password.
///
/// On success the session cookies are set and the browser is sent back to
/// the login root, where the gate forwards it to the user's dashboard.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, LoginError> {
    let client = state.supabase.as_ref().ok_or(LoginError::BackendUnavailable)?;

    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(LoginError::MissingCredentials);
    }

    let issued = client
        .sign_in_with_password(email, &form.password)
        .await
        .map_err(|e| {
            if e.is_auth_rejection() {
                LoginError::InvalidCredentials
            } else {
                LoginError::Backend {
                    details: e.to_string(),
                }
            }
        })?;

    info!(user_id = %issued.principal.id(), "User signed in");

    let jar = cookies::store_tokens(jar, &issued.tokens, &state.session_config);
    Ok((jar, Redirect::to(LOGIN_ROOT)))
}

/// Signs the user out and removes the session cookies.
///
/// Remote sign-out is best effort; the cookies are removed either way.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let credentials = cookies::credentials(&headers, &jar, &state.session_config);

    if let (Some(client), Some(access_token)) = (&state.supabase, credentials.access_token()) {
        if let Err(e) = client.sign_out(access_token).await {
            warn!(error = %e, "Remote sign-out failed");
        }
    }

    (cookies::clear(jar, &state.session_config), Redirect::to(LOGIN_ROOT))
}

#[cfg(test)]
mod tests {
    use crate::app;
    use crate::test_support::{FakeSessions, enforcing_state, request, set_cookies};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn login_without_backend_is_unavailable() {
        let state = enforcing_state(Arc::new(FakeSessions::default()));
        let router = app::router(state, std::path::Path::new("static"));
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("email=a%40b.c&password=secret"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn logout_clears_cookies_and_returns_to_login() {
        let state = enforcing_state(Arc::new(FakeSessions::default()));
        let router = app::router(state, std::path::Path::new("static"));
        let response = router
            .oneshot(request("POST", "/auth/logout", Some("token-dosen"), Some("refresh")))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
