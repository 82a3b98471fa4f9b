use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::stock_record::{self, Entity as StockRecordEntity},
    errors::ServiceError,
    models::{OwnerCategory, RecordStatus, StockRecord},
};

/// Counts and totals for one ownership stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct OwnerTotals {
    pub records: usize,
    pub checked: usize,
    pub system_total: i64,
    pub physical_total: i64,
}

/// Progress and discrepancy summary over a record set.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReconciliationSummary {
    pub batch_id: Option<String>,
    pub total_records: usize,
    /// Records touched at least once.
    pub checked_records: usize,
    pub matched: usize,
    pub over: usize,
    pub short: usize,
    pub system_total: i64,
    pub physical_total: i64,
    /// Quantity-weighted: sum(physical) / sum(system). A 50-unit line
    /// counts as much progress as 50 separately-counted serialized units.
    pub progress: f64,
    pub regular: OwnerTotals,
    pub consignment: OwnerTotals,
}

/// Stateless summary over any record set, active or archived.
pub fn summarize(records: &[StockRecord]) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary {
        batch_id: None,
        total_records: records.len(),
        checked_records: 0,
        matched: 0,
        over: 0,
        short: 0,
        system_total: 0,
        physical_total: 0,
        progress: 0.0,
        regular: OwnerTotals::default(),
        consignment: OwnerTotals::default(),
    };

    for record in records {
        let system = i64::from(record.system_qty());
        let physical = i64::from(record.physical_qty());
        let checked = record.is_checked();

        summary.system_total += system;
        summary.physical_total += physical;
        if checked {
            summary.checked_records += 1;
        }
        match record.status() {
            RecordStatus::Match => summary.matched += 1,
            RecordStatus::Over => summary.over += 1,
            RecordStatus::Short => summary.short += 1,
        }

        let owner_totals = match record.owner {
            OwnerCategory::Regular => &mut summary.regular,
            OwnerCategory::Consignment => &mut summary.consignment,
        };
        owner_totals.records += 1;
        owner_totals.system_total += system;
        owner_totals.physical_total += physical;
        if checked {
            owner_totals.checked += 1;
        }
    }

    if summary.system_total > 0 {
        summary.progress = summary.physical_total as f64 / summary.system_total as f64;
    }

    summary
}

/// Loads the record set for the active or a named (possibly archived)
/// batch and summarizes it. Always reads live rows, not a snapshot.
#[derive(Clone)]
pub struct ReconciliationService {
    db_pool: Arc<DbPool>,
}

impl ReconciliationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn summarize_active(&self) -> Result<ReconciliationSummary, ServiceError> {
        let rows = StockRecordEntity::find()
            .filter(stock_record::Column::IsActive.eq(true))
            .all(self.db_pool.as_ref())
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::NoActiveSession);
        }
        let batch_id = rows.first().map(|r| r.batch_id.clone());
        let mut summary = summarize(&to_domain(rows)?);
        summary.batch_id = batch_id;
        Ok(summary)
    }

    #[instrument(skip(self))]
    pub async fn summarize_batch(
        &self,
        batch_id: &str,
    ) -> Result<ReconciliationSummary, ServiceError> {
        let rows = StockRecordEntity::find()
            .filter(stock_record::Column::BatchId.eq(batch_id))
            .all(self.db_pool.as_ref())
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Batch '{}' has no records",
                batch_id
            )));
        }
        let mut summary = summarize(&to_domain(rows)?);
        summary.batch_id = Some(batch_id.to_string());
        Ok(summary)
    }
}

fn to_domain(rows: Vec<stock_record::Model>) -> Result<Vec<StockRecord>, ServiceError> {
    rows.into_iter()
        .map(StockRecord::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            ServiceError::InternalError(format!("stored record has invalid enum value: {}", e))
        })
}
