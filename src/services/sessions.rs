use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::stock_record::{self, Entity as StockRecord},
    errors::ServiceError,
    events::{Event, EventSender},
    models::ImportRow,
};

/// Result of a session start or append.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub inserted: usize,
}

/// Owns the session/batch lifecycle: exactly one batch has active rows at
/// any time; starting a new session archives the previous one.
#[derive(Clone)]
pub struct SessionService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    chunk_size: usize,
}

impl SessionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, chunk_size: usize) -> Self {
        Self {
            db_pool,
            event_sender,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Archives every currently active record, then bulk-inserts the
    /// imported rows as the new active batch.
    ///
    /// Inserts run in fixed-size chunks with no cross-chunk atomicity. A
    /// chunk failure leaves prior chunks committed (and the old batch
    /// already archived); it surfaces as `PartialImport` with the applied
    /// row count instead of being rolled back.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn start_session(
        &self,
        rows: &[ImportRow],
        session_name: &str,
    ) -> Result<ImportOutcome, ServiceError> {
        let batch_id = validated_session_name(session_name)?;
        validate_rows(rows)?;

        let db = self.db_pool.as_ref();

        let archived_batch = self.active_session_name().await?;
        if archived_batch.as_deref() == Some(batch_id.as_str()) {
            return Err(ServiceError::InvalidOperation(format!(
                "Session '{}' is already active; use append instead",
                batch_id
            )));
        }

        // Batch names are campaign identifiers. Reusing one, even after its
        // batch was archived, would splice two counts into one history.
        let name_taken = StockRecord::find()
            .filter(stock_record::Column::BatchId.eq(batch_id.as_str()))
            .one(db)
            .await?
            .is_some();
        if name_taken {
            return Err(ServiceError::InvalidOperation(format!(
                "Session name '{}' was already used by an archived batch",
                batch_id
            )));
        }

        let archived = StockRecord::update_many()
            .col_expr(
                stock_record::Column::IsActive,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(stock_record::Column::IsActive.eq(true))
            .exec(db)
            .await?;
        if archived.rows_affected > 0 {
            info!(
                archived_rows = archived.rows_affected,
                archived_batch = ?archived_batch,
                "Archived previous session"
            );
        }

        let inserted = self.insert_rows(rows, &batch_id).await?;

        self.event_sender
            .send(Event::SessionStarted {
                batch_id: batch_id.clone(),
                rows: inserted,
                archived_batch,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ImportOutcome { batch_id, inserted })
    }

    /// Bulk-inserts additional rows into the active batch without touching
    /// any existing record. Used to merge a secondary source (e.g., a
    /// consignment list) into an in-progress count.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn append_to_session(&self, rows: &[ImportRow]) -> Result<ImportOutcome, ServiceError> {
        validate_rows(rows)?;

        let batch_id = self
            .active_session_name()
            .await?
            .ok_or(ServiceError::NoActiveSession)?;

        let inserted = self.insert_rows(rows, &batch_id).await?;

        self.event_sender
            .send(Event::SessionAppended {
                batch_id: batch_id.clone(),
                rows: inserted,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ImportOutcome { batch_id, inserted })
    }

    /// The batch identifier shared by all active records, or `None` when no
    /// session is active.
    pub async fn active_session_name(&self) -> Result<Option<String>, ServiceError> {
        let db = self.db_pool.as_ref();
        let batch_id = StockRecord::find()
            .select_only()
            .column(stock_record::Column::BatchId)
            .filter(stock_record::Column::IsActive.eq(true))
            .distinct()
            .into_tuple::<String>()
            .one(db)
            .await?;
        Ok(batch_id)
    }

    /// Destructive delete of all active records. No archive is produced and
    /// the operation cannot be undone.
    #[instrument(skip(self))]
    pub async fn clear_active_session(&self) -> Result<u64, ServiceError> {
        let batch_id = self
            .active_session_name()
            .await?
            .ok_or(ServiceError::NoActiveSession)?;

        let db = self.db_pool.as_ref();
        let result = StockRecord::delete_many()
            .filter(stock_record::Column::IsActive.eq(true))
            .exec(db)
            .await?;

        warn!(
            batch_id = %batch_id,
            rows_removed = result.rows_affected,
            "Cleared active session"
        );

        self.event_sender
            .send(Event::SessionCleared {
                batch_id,
                rows_removed: result.rows_affected,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(result.rows_affected)
    }

    async fn insert_rows(&self, rows: &[ImportRow], batch_id: &str) -> Result<usize, ServiceError> {
        let db = self.db_pool.as_ref();
        let now = Utc::now();

        let models: Vec<stock_record::ActiveModel> = rows
            .iter()
            .map(|row| row.into_active_model(batch_id, now))
            .collect();

        let mut applied = 0usize;
        for chunk in models.chunks(self.chunk_size) {
            StockRecord::insert_many(chunk.to_vec())
                .exec(db)
                .await
                .map_err(|source| ServiceError::PartialImport { applied, source })?;
            applied += chunk.len();
        }

        info!(batch_id = %batch_id, rows = applied, "Bulk insert completed");
        Ok(applied)
    }
}

fn validated_session_name(session_name: &str) -> Result<String, ServiceError> {
    let trimmed = session_name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(
            "session_name must not be empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_rows(rows: &[ImportRow]) -> Result<(), ServiceError> {
    if rows.is_empty() {
        return Err(ServiceError::ValidationError(
            "import contains no rows".into(),
        ));
    }
    for (index, row) in rows.iter().enumerate() {
        row.validate().map_err(|e| {
            ServiceError::ValidationError(format!("row {}: {}", index + 1, e))
        })?;
    }
    Ok(())
}
