use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::{
    db::DbPool,
    entities::stock_record::{self, Entity as StockRecord},
    errors::ServiceError,
    models::{self, ItemType, Location, OwnerCategory},
};

/// Scope of a snapshot load. With no `batch_id` the active session is
/// selected; an explicit `batch_id` reads any batch, archived ones
/// included.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct SnapshotFilter {
    pub batch_id: Option<String>,
    pub location: Option<Location>,
    pub item_type: Option<ItemType>,
    pub owner: Option<OwnerCategory>,
    /// Case-insensitive substring match across name, brand and sku.
    pub search: Option<String>,
}

/// A client-local view of the record set plus the instant it was captured,
/// which callers thread back into `apply_change` for conflict detection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Snapshot {
    pub records: Vec<models::StockRecord>,
    pub taken_at: DateTime<Utc>,
}

/// Materializes filtered, timestamped snapshots of the record set.
#[derive(Clone)]
pub struct SnapshotService {
    db_pool: Arc<DbPool>,
}

impl SnapshotService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn load_snapshot(&self, filter: &SnapshotFilter) -> Result<Snapshot, ServiceError> {
        // The timestamp must be captured before the read: a write landing
        // during the query then shows up as a (spurious) conflict rather
        // than being invisible to the conflict check.
        let taken_at = Utc::now();

        let db = self.db_pool.as_ref();

        let mut query = StockRecord::find();
        query = match &filter.batch_id {
            Some(batch_id) => query.filter(stock_record::Column::BatchId.eq(batch_id.clone())),
            None => query.filter(stock_record::Column::IsActive.eq(true)),
        };
        if let Some(location) = filter.location {
            query = query.filter(stock_record::Column::Location.eq(location.to_string()));
        }
        if let Some(item_type) = filter.item_type {
            query = query.filter(stock_record::Column::ItemType.eq(item_type.to_string()));
        }
        if let Some(owner) = filter.owner {
            query = query.filter(stock_record::Column::OwnerCategory.eq(owner.to_string()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            stock_record::Entity,
                            stock_record::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            stock_record::Entity,
                            stock_record::Column::Brand,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            stock_record::Entity,
                            stock_record::Column::Sku,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        let rows = query
            .order_by_asc(stock_record::Column::Brand)
            .order_by_asc(stock_record::Column::Sku)
            .order_by_asc(stock_record::Column::Id)
            .all(db)
            .await?;

        let records = rows
            .into_iter()
            .map(models::StockRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                ServiceError::InternalError(format!("stored record has invalid enum value: {}", e))
            })?;

        Ok(Snapshot { records, taken_at })
    }
}
