use axum::extract::{Json, Path, Query, State};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{services::reconciliation::ReconciliationSummary, ApiResponse, ApiResult, AppState};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct SummaryQuery {
    /// Batch to summarize; defaults to the active session.
    pub batch_id: Option<String>,
}

/// Reconciliation summary for the active session or a named batch
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Quantity-weighted progress and per-owner totals", body = ApiResponse<ReconciliationSummary>),
        (status = 404, description = "No active session, or the named batch has no records")
    ),
    tag = "reports"
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<ReconciliationSummary> {
    let summary = match query.batch_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(batch_id) => state.reconciliation.summarize_batch(batch_id).await?,
        None => state.reconciliation.summarize_active().await?,
    };
    Ok(Json(ApiResponse::success(summary)))
}

/// Reconciliation summary for a named batch, archived batches included
#[utoipa::path(
    get,
    path = "/api/v1/reports/summary/{batch_id}",
    params(("batch_id" = String, Path, description = "Batch identifier")),
    responses(
        (status = 200, description = "Summary for the batch", body = ApiResponse<ReconciliationSummary>),
        (status = 404, description = "No records carry that batch id")
    ),
    tag = "reports"
)]
pub async fn batch_summary(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<ReconciliationSummary> {
    let summary = state.reconciliation.summarize_batch(&batch_id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
