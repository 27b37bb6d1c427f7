use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::auth::AppState;

/// Plain-text dump of the users table for checking store connectivity.
pub async fn list_users(State(state): State<AppState>) -> Response {
    match state.store.list_users().await {
        Ok(users) => {
            let listing = serde_json::to_string(&users).unwrap_or_default();
            format!("Users in store: {listing}").into_response()
        }
        Err(e) => {
            error!("Store check failed: {}", e);
            (StatusCode::BAD_GATEWAY, format!("Store error: {e}")).into_response()
        }
    }
}
