//! Externally-invoked sync endpoints.
//!
//! These expose the same pipeline as the admin buttons over a plain
//! OPTIONS/POST pair, for invocation by an external scheduler. They are
//! gated by a shared bearer token instead of a session, and always answer
//! with the JSON outcome payload.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{config::Config, sync, sync::SyncOutcome, AppState};

fn check_token(config: &Config, headers: &HeaderMap) -> Result<(), Response> {
    let Some(expected) = &config.sync_token else {
        // No token provisioned means the external trigger is disabled
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SyncOutcome::failure("sync_token is not configured")),
        )
            .into_response());
    };

    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if presented != Some(expected.as_str()) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(SyncOutcome::failure("Invalid sync token")),
        )
            .into_response());
    }

    Ok(())
}

/// POST /api/sync/youtube - Run the sermon sync
pub async fn sync_youtube_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = check_token(&state.config, &headers) {
        return response;
    }

    match sync::sync_sermons(&state.config, &state.http, &state.storage).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!("Sermon sync failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncOutcome::failure(e.to_string())),
            )
                .into_response()
        }
    }
}

/// POST /api/sync/drive - Run the bulletin sync
pub async fn sync_drive_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = check_token(&state.config, &headers) {
        return response;
    }

    match sync::sync_bulletins(&state.config, &state.http, &state.storage).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            tracing::error!("Bulletin sync failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SyncOutcome::failure(e.to_string())),
            )
                .into_response()
        }
    }
}
