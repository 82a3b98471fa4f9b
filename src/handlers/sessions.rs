use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::ImportRow,
    services::sessions::ImportOutcome,
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    /// Name of the new counting session; becomes the batch identifier.
    pub session_name: String,
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppendSessionRequest {
    pub rows: Vec<ImportRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveSessionResponse {
    pub batch_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearSessionResponse {
    pub rows_removed: u64,
}

/// Start a new counting session, archiving the previous one
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 200, description = "Session started", body = ApiResponse<ImportOutcome>),
        (status = 400, description = "Invalid import rows or session name"),
        (status = 500, description = "Bulk insert failed, possibly after partial application")
    ),
    tag = "sessions"
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> ApiResult<ImportOutcome> {
    let outcome = state
        .sessions
        .start_session(&payload.rows, &payload.session_name)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Append imported rows to the active session
#[utoipa::path(
    post,
    path = "/api/v1/sessions/append",
    request_body = AppendSessionRequest,
    responses(
        (status = 200, description = "Rows appended", body = ApiResponse<ImportOutcome>),
        (status = 400, description = "Invalid import rows"),
        (status = 404, description = "No active session")
    ),
    tag = "sessions"
)]
pub async fn append_to_session(
    State(state): State<AppState>,
    Json(payload): Json<AppendSessionRequest>,
) -> ApiResult<ImportOutcome> {
    let outcome = state.sessions.append_to_session(&payload.rows).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// Name of the active counting session
#[utoipa::path(
    get,
    path = "/api/v1/sessions/active",
    responses(
        (status = 200, description = "Active session name", body = ApiResponse<ActiveSessionResponse>),
        (status = 404, description = "No active session")
    ),
    tag = "sessions"
)]
pub async fn active_session(State(state): State<AppState>) -> ApiResult<ActiveSessionResponse> {
    let batch_id = state
        .sessions
        .active_session_name()
        .await?
        .ok_or(crate::errors::ServiceError::NoActiveSession)?;
    Ok(Json(ApiResponse::success(ActiveSessionResponse { batch_id })))
}

/// Destructively delete all active records, with no archive
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/active",
    responses(
        (status = 200, description = "Active session cleared", body = ApiResponse<ClearSessionResponse>),
        (status = 404, description = "No active session")
    ),
    tag = "sessions"
)]
pub async fn clear_active_session(State(state): State<AppState>) -> ApiResult<ClearSessionResponse> {
    let rows_removed = state.sessions.clear_active_session().await?;
    Ok(Json(ApiResponse::success(ClearSessionResponse {
        rows_removed,
    })))
}
