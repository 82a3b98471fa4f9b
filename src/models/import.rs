use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::stock_record;
use crate::models::record::{ItemCategory, ItemType, Location, OwnerCategory, UNCOUNTED_ACTOR};

/// One row of an import source, as handed over by the session start and
/// append flows. Field defaults reproduce the legacy import behavior
/// exactly so historical batches round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportRow {
    /// Product reference code.
    #[validate(length(min = 1, message = "sku must not be empty"))]
    pub sku: String,
    /// Falls back to the first token of `name` when blank.
    #[serde(default)]
    pub brand: Option<String>,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Defaults to Regular when unspecified.
    #[serde(default)]
    pub owner_category: Option<OwnerCategory>,
    /// Presence of a serial number makes the row a serialized (SN) record.
    #[serde(default)]
    pub serial_number: Option<String>,
    pub location: Location,
    pub item_type: ItemType,
    #[validate(range(min = 0, message = "system_qty must not be negative"))]
    pub system_qty: i32,
}

impl ImportRow {
    fn trimmed_serial(&self) -> Option<&str> {
        self.serial_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Category is derived, never supplied: a non-empty serial number makes
    /// the row SN, everything else is NON-SN.
    pub fn category(&self) -> ItemCategory {
        if self.trimmed_serial().is_some() {
            ItemCategory::Sn
        } else {
            ItemCategory::NonSn
        }
    }

    fn effective_brand(&self) -> String {
        let trimmed = self.brand.as_deref().map(str::trim).unwrap_or("");
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
        self.name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string()
    }

    fn effective_owner(&self) -> OwnerCategory {
        self.owner_category.unwrap_or(OwnerCategory::Regular)
    }

    /// Builds the row to insert for a fresh session. Physical quantity
    /// starts at zero, notes empty, actor set to the uncounted sentinel.
    /// Serialized rows are unit tracked, so their baseline is one unit
    /// regardless of the quantity column in the source.
    pub fn into_active_model(
        &self,
        batch_id: &str,
        now: DateTime<Utc>,
    ) -> stock_record::ActiveModel {
        let category = self.category();
        let system_qty = match category {
            ItemCategory::Sn => 1,
            ItemCategory::NonSn => self.system_qty,
        };
        stock_record::ActiveModel {
            sku: Set(self.sku.trim().to_string()),
            brand: Set(self.effective_brand()),
            name: Set(self.name.trim().to_string()),
            owner_category: Set(self.effective_owner().to_string()),
            serial_number: Set(self.trimmed_serial().map(str::to_string)),
            category: Set(category.to_string()),
            location: Set(self.location.to_string()),
            item_type: Set(self.item_type.to_string()),
            system_qty: Set(system_qty),
            physical_qty: Set(0),
            notes: Set(None),
            updated_by: Set(UNCOUNTED_ACTOR.to_string()),
            updated_at: Set(now.into()),
            is_active: Set(true),
            batch_id: Set(batch_id.to_string()),
            ..Default::default()
        }
    }
}
