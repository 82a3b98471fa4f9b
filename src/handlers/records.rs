use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    models::CountState,
    services::{
        snapshots::{Snapshot, SnapshotFilter},
        updates::{ChangeOutcome, ChangeRequest, NotesPolicy},
    },
    ApiResponse, ApiResult, AppState,
};

/// Body of a record update. The snapshot fields echo what the client saw
/// when it loaded the record; they anchor the no-op check and the conflict
/// window.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecordRequest {
    pub physical_qty: i32,
    pub notes: Option<String>,
    pub actor: String,
    pub snapshot_taken_at: DateTime<Utc>,
    pub snapshot_physical_qty: i32,
    pub snapshot_notes: Option<String>,
}

/// List records in the active session (or a named batch) with filters
#[utoipa::path(
    get,
    path = "/api/v1/records",
    params(SnapshotFilter),
    responses(
        (status = 200, description = "Snapshot of matching records", body = ApiResponse<Snapshot>)
    ),
    tag = "records"
)]
pub async fn list_records(
    State(state): State<AppState>,
    Query(filter): Query<SnapshotFilter>,
) -> ApiResult<Snapshot> {
    let snapshot = state.snapshots.load_snapshot(&filter).await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

/// Fetch one record by id
#[utoipa::path(
    get,
    path = "/api/v1/records/{id}",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "The record", body = ApiResponse<crate::models::StockRecord>),
        (status = 404, description = "No such record")
    ),
    tag = "records"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<crate::models::StockRecord> {
    let record = state.updates.get_record(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Apply a counted quantity to one record under optimistic concurrency
#[utoipa::path(
    put,
    path = "/api/v1/records/{id}",
    params(("id" = i64, Path, description = "Record id")),
    request_body = UpdateRecordRequest,
    responses(
        (status = 200, description = "Change committed or request was a no-op", body = ApiResponse<ChangeOutcome>),
        (status = 400, description = "Invalid actor, quantity, or missing required notes"),
        (status = 404, description = "No such record"),
        (status = 409, description = "A competing update landed after the snapshot", body = ApiResponse<ChangeOutcome>)
    ),
    tag = "records"
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRecordRequest>,
) -> Result<Response, ServiceError> {
    let request = ChangeRequest {
        record_id: id,
        physical_qty: payload.physical_qty,
        notes: payload.notes,
        actor: payload.actor,
        snapshot_taken_at: payload.snapshot_taken_at,
        snapshot_physical_qty: payload.snapshot_physical_qty,
        snapshot_notes: payload.snapshot_notes,
    };

    // Validation needs the current record, so only fetch it for requests
    // that will actually attempt a write.
    if !request.is_noop() {
        let record = state.updates.get_record(id).await?;
        if matches!(record.count, CountState::Serialized { .. })
            && !(0..=1).contains(&request.physical_qty)
        {
            return Err(ServiceError::ValidationError(
                "serialized records only accept a found quantity of 0 or 1".into(),
            ));
        }
        state
            .notes_policy
            .check(&record, request.physical_qty, request.notes.as_deref())?;
    }

    let outcome = state.updates.apply_change(request).await?;
    let status = match &outcome {
        ChangeOutcome::Conflict { .. } => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    let body = match &outcome {
        ChangeOutcome::Conflict { competing_actor, .. } => ApiResponse::failure(
            outcome.clone(),
            format!("record was updated by {} after your snapshot", competing_actor),
        ),
        _ => ApiResponse::success(outcome),
    };
    Ok((status, Json(body)).into_response())
}

/// Maps the config switch onto the policy the update handler enforces.
pub fn notes_policy_from_config(require_discrepancy_notes: bool) -> NotesPolicy {
    if require_discrepancy_notes {
        NotesPolicy::RequiredOnDiscrepancy
    } else {
        NotesPolicy::Optional
    }
}
