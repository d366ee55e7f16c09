//! Access gate middleware and extractors for Axum.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::debug;
use ujian_platform_access::{Decision, RequestContext, Role, route};

use super::{AppState, cookies};

/// Runs the access gate in front of every route.
///
/// Excluded paths go straight to the handler. Otherwise the gate decides,
/// any session change it produced is written to the response whatever the
/// decision, and allowed requests carry a [`RequestContext`] extension
/// when a caller was identified.
pub async fn access_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.exclusions.matches(&path) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let credentials = cookies::credentials(request.headers(), &jar, &state.session_config);
    let outcome = state.gate.evaluate(&path, &credentials).await;
    let jar = cookies::apply_update(jar, &outcome.session_update, &state.session_config);

    match outcome.decision {
        Decision::Allow => {
            if let Some(context) = outcome.context {
                request.extensions_mut().insert(context);
            }
            let response = next.run(request).await;
            if wrote_session_cookies(&response, &state) {
                // The handler replaced the session itself (login, logout).
                response
            } else {
                (jar, response).into_response()
            }
        }
        Decision::RedirectToLogin | Decision::RedirectToDashboard(_) => {
            let location = outcome
                .decision
                .location()
                .unwrap_or_else(|| route::LOGIN_ROOT.to_string());
            debug!(%path, %location, "redirecting");
            (jar, Redirect::to(&location)).into_response()
        }
        Decision::Deny => (jar, (StatusCode::FORBIDDEN, "Access denied")).into_response(),
    }
}

fn wrote_session_cookies(response: &Response, state: &AppState) -> bool {
    let names = [
        cookies::access_cookie_name(&state.session_config),
        cookies::refresh_cookie_name(&state.session_config),
    ];
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| {
            names.iter().any(|name| {
                value
                    .strip_prefix(name.as_str())
                    .is_some_and(|rest| rest.starts_with('='))
            })
        })
}

/// Extractor for requiring an identified caller.
///
/// The gate has already redirected anonymous callers away from protected
/// paths; this only fails on public paths or when the gate is bypassed.
pub struct CurrentUser(pub RequestContext);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthRejection::NotAuthenticated)
    }
}

/// Extractor for optionally getting the caller.
pub struct MaybeUser(pub Option<RequestContext>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<RequestContext>().cloned()))
    }
}

/// Extractor for requiring the superadmin role.
pub struct RequireSuperadmin(pub RequestContext);

impl<S> FromRequestParts<S> for RequireSuperadmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(context) = CurrentUser::from_request_parts(parts, state).await?;

        if !context.has_role(Role::Superadmin) {
            return Err(AuthRejection::SuperadminRequired);
        }

        Ok(RequireSuperadmin(context))
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    SuperadminRequired,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => {
                (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
            }
            Self::SuperadminRequired => {
                (StatusCode::FORBIDDEN, "Superadmin access required").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FakeSessions, ROTATED_ACCESS, VALID_REFRESH, bypass_state, enforcing_state, request,
        set_cookies,
    };
    use axum::{
        Router,
        body::to_bytes,
        middleware::from_fn_with_state,
        routing::{any, get},
    };
    use axum_extra::extract::cookie::Cookie;
    use tower::ServiceExt;

    async fn whoami(MaybeUser(context): MaybeUser) -> String {
        context
            .map(|c| format!("{}:{}", c.principal().id(), c.effective_role()))
            .unwrap_or_else(|| "anonymous".to_string())
    }

    async fn writes_own_session() -> impl IntoResponse {
        let jar = CookieJar::new().add(Cookie::new("ujian-access-token", "from-handler"));
        (jar, "ok")
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/", get(whoami))
            .route("/auth/replace", get(writes_own_session))
            .route("/{*rest}", any(whoami))
            .layer(from_fn_with_state(state.clone(), access_gate))
            .with_state(state)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header")
    }

    #[tokio::test]
    async fn anonymous_login_root_is_allowed() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn anonymous_dashboard_redirects_to_login() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/dosen/jadwal", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn own_namespace_is_allowed_with_context() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/admin-prodi/users", Some("token-admin-prodi"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "u-admin-prodi:admin_prodi");
    }

    #[tokio::test]
    async fn foreign_namespace_redirects_to_own_dashboard() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/superadmin", Some("token-dosen"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dosen");
    }

    #[tokio::test]
    async fn authenticated_root_redirects_to_dashboard() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/", Some("token-admin-prodi"), None))
            .await
            .expect("response");
        assert_eq!(location(&response), "/admin-prodi");
    }

    #[tokio::test]
    async fn missing_profile_row_acts_as_mahasiswa() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/pengawas", Some("token-norole"), None))
            .await
            .expect("response");
        assert_eq!(location(&response), "/mahasiswa");
    }

    #[tokio::test]
    async fn unrecognized_role_is_denied() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/dosen", Some("token-weird"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, "Access denied");
    }

    #[tokio::test]
    async fn refreshed_tokens_reach_allowed_responses() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/dosen", Some("expired"), Some(VALID_REFRESH)))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert!(
            cookies
                .iter()
                .any(|c| c.starts_with(&format!("ujian-access-token={ROTATED_ACCESS}")))
        );
        assert!(cookies.iter().any(|c| c.starts_with("ujian-refresh-token=rotated-refresh")));
    }

    #[tokio::test]
    async fn refreshed_tokens_reach_redirects() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/mahasiswa", None, Some(VALID_REFRESH)))
            .await
            .expect("response");
        assert_eq!(location(&response), "/dosen");
        assert_eq!(set_cookies(&response).len(), 2);
    }

    #[tokio::test]
    async fn dead_session_is_cleared_on_redirect_to_login() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/dosen", Some("revoked"), Some("stale")))
            .await
            .expect("response");
        assert_eq!(location(&response), "/");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[tokio::test]
    async fn handler_session_cookies_win() {
        let sessions = Arc::new(FakeSessions::default());
        let response = app(enforcing_state(sessions))
            .oneshot(request("GET", "/auth/replace", Some("revoked"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("ujian-access-token=from-handler"));
    }

    #[tokio::test]
    async fn excluded_paths_skip_the_gate() {
        let sessions = Arc::new(FakeSessions::default());
        let router = app(enforcing_state(sessions.clone()));

        for path in ["/static/app.css", "/favicon.ico", "/dosen/logo.png"] {
            let response = router
                .clone()
                .oneshot(request("GET", path, None, None))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK, "{path}");
        }
        assert_eq!(sessions.calls(), 0);
    }

    #[tokio::test]
    async fn bypassed_gate_allows_everything() {
        let response = app(bypass_state())
            .oneshot(request("GET", "/superadmin", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn superadmin_extractor_checks_role() {
        async fn admin_only(RequireSuperadmin(context): RequireSuperadmin) -> String {
            context.principal().id().to_string()
        }

        let state = enforcing_state(Arc::new(FakeSessions::default()));
        let router = Router::new()
            .route("/api/admin", get(admin_only))
            .layer(from_fn_with_state(state.clone(), access_gate))
            .with_state(state);

        let response = router
            .clone()
            .oneshot(request("GET", "/api/admin", Some("token-superadmin"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(request("GET", "/api/admin", Some("token-dosen"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .oneshot(request("GET", "/api/admin", None, None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn superadmin_extractor_without_context_is_unauthorized() {
        async fn admin_only(RequireSuperadmin(context): RequireSuperadmin) -> String {
            context.principal().id().to_string()
        }

        let state = bypass_state();
        let router = Router::new()
            .route("/api/admin", get(admin_only))
            .layer(from_fn_with_state(state.clone(), access_gate))
            .with_state(state);

        let response = router
            .oneshot(request("GET", "/api/admin", Some("token-superadmin"), None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "Not authenticated");
    }
}
