//! Router assembly.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use ujian_platform_access::Role;

use crate::{
    api,
    auth::{self, AppState, access_gate},
    pages,
};

/// Builds the application router.
///
/// Every route, static files included, sits behind the access gate; the
/// gate itself skips paths on the exclusion list.
pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let mut router = Router::new()
        .route("/", get(pages::login_page))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/me", get(api::me))
        .route("/api/admin/delete-user", post(api::delete_user));

    for role in Role::ALL {
        let root = role.dashboard_path();
        router = router
            .route(&root, get(pages::dashboard))
            .route(&format!("{root}/{{*section}}"), get(pages::dashboard));
    }

    router
        .nest_service("/static", ServeDir::new(static_dir))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .layer(from_fn_with_state(state.clone(), access_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
