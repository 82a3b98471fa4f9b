use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stocktake API",
        version = "1.0.0",
        description = r#"
# Stock Count Reconciliation API

Backend for physical inventory counting. A session is imported from the
system of record, counted concurrently by multiple operators, and
reconciled against the system quantities.

## Concurrency

Record updates are optimistic: each update carries the snapshot the
operator loaded the record under. If another operator committed a change
after that snapshot, the update is rejected with `409 Conflict` naming
the competing actor, and the client should reload before retrying.
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "sessions", description = "Counting session lifecycle"),
        (name = "records", description = "Record listing and counted-quantity updates"),
        (name = "reports", description = "Reconciliation summaries")
    ),
    paths(
        crate::handlers::sessions::start_session,
        crate::handlers::sessions::append_to_session,
        crate::handlers::sessions::active_session,
        crate::handlers::sessions::clear_active_session,
        crate::handlers::records::list_records,
        crate::handlers::records::get_record,
        crate::handlers::records::update_record,
        crate::handlers::reports::summary,
        crate::handlers::reports::batch_summary,
    ),
    components(
        schemas(
            crate::handlers::sessions::StartSessionRequest,
            crate::handlers::sessions::AppendSessionRequest,
            crate::handlers::sessions::ActiveSessionResponse,
            crate::handlers::sessions::ClearSessionResponse,
            crate::handlers::records::UpdateRecordRequest,
            crate::models::ImportRow,
            crate::models::StockRecord,
            crate::models::CountState,
            crate::models::ItemCategory,
            crate::models::ItemType,
            crate::models::Location,
            crate::models::OwnerCategory,
            crate::models::RecordStatus,
            crate::services::sessions::ImportOutcome,
            crate::services::snapshots::Snapshot,
            crate::services::updates::ChangeOutcome,
            crate::services::reconciliation::ReconciliationSummary,
            crate::services::reconciliation::OwnerTotals,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
