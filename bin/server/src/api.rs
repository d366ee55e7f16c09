//! JSON API routes.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use ujian_core::UserId;

use crate::auth::{AppState, CurrentUser, RequireSuperadmin};
use crate::error::AdminError;

/// Returns the caller's identity as resolved by the gate.
pub async fn me(CurrentUser(context): CurrentUser) -> impl IntoResponse {
    Json(context.summary())
}

/// Body of a delete-user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    #[serde(default)]
    user_id: Option<String>,
}

/// Deletes a user's auth account and profile row.
///
/// Only the auth account deletion decides the outcome; a failed profile
/// deletion is logged and otherwise ignored.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    RequireSuperadmin(caller): RequireSuperadmin,
    Json(body): Json<DeleteUserRequest>,
) -> Result<impl IntoResponse, AdminError> {
    let user_id = body
        .user_id
        .as_deref()
        .and_then(|id| UserId::from_str(id).ok())
        .ok_or(AdminError::MissingUserId)?;

    let client = state
        .supabase
        .as_ref()
        .filter(|client| client.has_service_key())
        .ok_or(AdminError::BackendUnavailable)?;

    client
        .delete_auth_user(&user_id)
        .await
        .map_err(|source| AdminError::DeleteFailed {
            user_id: user_id.to_string(),
            source,
        })?;

    if let Some(profiles) = &state.profiles {
        match profiles.delete_profile(&user_id).await {
            Ok(true) => {}
            Ok(false) => warn!(user_id = %user_id, "No profile row to delete"),
            Err(e) => warn!(user_id = %user_id, error = %e, "Profile deletion failed"),
        }
    }

    info!(user_id = %user_id, deleted_by = %caller.principal().id(), "User deleted");

    Ok(Json(json!({ "success": true })))
}
