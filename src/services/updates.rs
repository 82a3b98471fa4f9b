use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::stock_record::{self, Entity as StockRecord},
    errors::ServiceError,
    events::{Event, EventSender},
    models::{self, CountState, UNCOUNTED_ACTOR},
};

/// A proposed change to one record, carrying the snapshot context the
/// client loaded it under. The snapshot values, not ambient state, are the
/// basis for the no-op check and the conflict anchor.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeRequest {
    pub record_id: i64,
    pub physical_qty: i32,
    pub notes: Option<String>,
    pub actor: String,
    pub snapshot_taken_at: DateTime<Utc>,
    pub snapshot_physical_qty: i32,
    pub snapshot_notes: Option<String>,
}

impl ChangeRequest {
    /// True when the proposal matches the snapshot values after notes
    /// normalization. Such requests resolve to `NoChange` without a write
    /// or a conflict check.
    pub fn is_noop(&self) -> bool {
        self.physical_qty == self.snapshot_physical_qty
            && normalized_notes(self.notes.as_deref())
                == normalized_notes(self.snapshot_notes.as_deref())
    }
}

/// Every way a change request can resolve. Conflict is a first-class
/// outcome of concurrent editing, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChangeOutcome {
    Committed { updated_at: DateTime<Utc> },
    NoChange,
    Conflict {
        competing_actor: String,
        competing_at: DateTime<Utc>,
    },
}

/// Caller-selectable validation for discrepancy notes. Deployments have
/// required notes on any discrepancy or left them optional; the choice is
/// injected and evaluated before `apply_change`, never inside the conflict
/// algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesPolicy {
    Optional,
    RequiredOnDiscrepancy,
}

impl NotesPolicy {
    /// Checks a proposed change against this policy. For quantity-tracked
    /// records a discrepancy is a new quantity that differs from the system
    /// baseline; for serialized records it is any flip of the found state.
    pub fn check(
        &self,
        record: &models::StockRecord,
        new_physical_qty: i32,
        notes: Option<&str>,
    ) -> Result<(), ServiceError> {
        if matches!(self, NotesPolicy::Optional) {
            return Ok(());
        }
        let needs_note = match record.count {
            CountState::Serialized { .. } => new_physical_qty != record.physical_qty(),
            CountState::Counted { system_qty, .. } => new_physical_qty != system_qty,
        };
        if needs_note && normalized_notes(notes).is_none() {
            return Err(ServiceError::ValidationError(
                "keterangan (notes) is required when the count does not match the system quantity"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Trims notes and collapses blank input to `None` so "" and NULL compare
/// equal in the no-op check.
fn normalized_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Applies per-record changes under optimistic concurrency: a write only
/// lands if nobody touched the record after the caller's snapshot.
#[derive(Clone)]
pub struct UpdateService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl UpdateService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Point read of one record, for callers that need current context
    /// (e.g., the notes policy) before proposing a change.
    pub async fn get_record(&self, record_id: i64) -> Result<models::StockRecord, ServiceError> {
        let db = self.db_pool.as_ref();
        let row = StockRecord::find_by_id(record_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Record {} not found", record_id)))?;
        models::StockRecord::try_from(row).map_err(|e| {
            ServiceError::InternalError(format!("stored record has invalid enum value: {}", e))
        })
    }

    /// Resolves one change request.
    ///
    /// 1. Identical quantity and (trimmed) notes against the snapshot are a
    ///    no-op: nothing is written and no conflict check runs.
    /// 2. Otherwise a single conditional update commits the change only
    ///    while the row is still active and the stored `updated_at` is not
    ///    past the snapshot instant.
    /// 3. Zero affected rows means the record is missing, archived, or was
    ///    committed to after the snapshot; one point read distinguishes the
    ///    three and names the competing editor on conflict.
    #[instrument(skip(self, request), fields(record_id = request.record_id, actor = %request.actor))]
    pub async fn apply_change(&self, request: ChangeRequest) -> Result<ChangeOutcome, ServiceError> {
        if request.is_noop() {
            return Ok(ChangeOutcome::NoChange);
        }
        let new_notes = normalized_notes(request.notes.as_deref());

        let actor = request.actor.trim();
        if actor.is_empty() || actor == UNCOUNTED_ACTOR {
            return Err(ServiceError::ValidationError(
                "actor must identify the acting user".into(),
            ));
        }
        if request.physical_qty < 0 {
            return Err(ServiceError::ValidationError(
                "physical_qty must not be negative".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let now = Utc::now();
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();
        let anchor: sea_orm::prelude::DateTimeWithTimeZone = request.snapshot_taken_at.into();

        let result = StockRecord::update_many()
            .col_expr(
                stock_record::Column::PhysicalQty,
                Expr::value(request.physical_qty),
            )
            .col_expr(stock_record::Column::Notes, Expr::value(new_notes))
            .col_expr(
                stock_record::Column::UpdatedBy,
                Expr::value(actor.to_string()),
            )
            .col_expr(stock_record::Column::UpdatedAt, Expr::value(now_tz))
            .filter(stock_record::Column::Id.eq(request.record_id))
            .filter(stock_record::Column::IsActive.eq(true))
            .filter(stock_record::Column::UpdatedAt.lte(anchor))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            let row = StockRecord::find_by_id(request.record_id)
                .one(db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Record {} not found", request.record_id))
                })?;

            // Archived batches are a closed history; their rows stay
            // readable by id but reject writes.
            if !row.is_active {
                return Err(ServiceError::InvalidOperation(format!(
                    "Record {} belongs to an archived batch and cannot be changed",
                    request.record_id
                )));
            }

            let competing_actor = row.updated_by;
            let competing_at = row.updated_at.with_timezone(&Utc);
            self.event_sender
                .send(Event::UpdateConflicted {
                    record_id: request.record_id,
                    rejected_actor: actor.to_string(),
                    competing_actor: competing_actor.clone(),
                })
                .await
                .map_err(ServiceError::EventError)?;

            return Ok(ChangeOutcome::Conflict {
                competing_actor,
                competing_at,
            });
        }

        info!(
            record_id = request.record_id,
            physical_qty = request.physical_qty,
            "Change committed"
        );
        self.event_sender
            .send(Event::RecordUpdated {
                record_id: request.record_id,
                updated_by: actor.to_string(),
                updated_at: now,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(ChangeOutcome::Committed { updated_at: now })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemType, Location, OwnerCategory};

    fn serialized_record(found: bool) -> models::StockRecord {
        models::StockRecord {
            id: 1,
            sku: "SKU-1".into(),
            brand: "ACME".into(),
            name: "Acme Widget".into(),
            owner: OwnerCategory::Regular,
            location: Location::Floor,
            item_type: ItemType::Stock,
            count: CountState::Serialized {
                serial_number: "SN1001".into(),
                found,
            },
            notes: None,
            updated_by: UNCOUNTED_ACTOR.into(),
            updated_at: Utc::now(),
            is_active: true,
            batch_id: "SO-1".into(),
        }
    }

    fn counted_record(system: i32, physical: i32) -> models::StockRecord {
        let mut rec = serialized_record(false);
        rec.count = CountState::Counted {
            system_qty: system,
            physical_qty: physical,
        };
        rec
    }

    #[test]
    fn notes_normalization_collapses_blanks() {
        assert_eq!(normalized_notes(None), None);
        assert_eq!(normalized_notes(Some("   ")), None);
        assert_eq!(normalized_notes(Some(" damaged box ")), Some("damaged box".into()));
    }

    #[test]
    fn optional_policy_never_requires_notes() {
        let rec = counted_record(50, 0);
        assert!(NotesPolicy::Optional.check(&rec, 3, None).is_ok());
    }

    #[test]
    fn discrepancy_policy_requires_note_on_short_count() {
        let rec = counted_record(50, 0);
        let policy = NotesPolicy::RequiredOnDiscrepancy;
        assert!(policy.check(&rec, 42, None).is_err());
        assert!(policy.check(&rec, 42, Some("  ")).is_err());
        assert!(policy.check(&rec, 42, Some("two cartons missing")).is_ok());
        // A count that matches the baseline needs no note.
        assert!(policy.check(&rec, 50, None).is_ok());
    }

    #[test]
    fn discrepancy_policy_requires_note_on_sn_flip() {
        let policy = NotesPolicy::RequiredOnDiscrepancy;
        let rec = serialized_record(true);
        assert!(policy.check(&rec, 0, None).is_err());
        assert!(policy.check(&rec, 0, Some("unit not on shelf")).is_ok());
        // Re-submitting the current state is not a flip.
        assert!(policy.check(&rec, 1, None).is_ok());
    }
}
