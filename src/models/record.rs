use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::entities::stock_record;

/// Actor recorded on rows that nobody has counted yet.
pub const UNCOUNTED_ACTOR: &str = "-";

/// Serialized (unit-tracked) vs quantity-tracked item categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ItemCategory {
    #[serde(rename = "SN")]
    #[strum(serialize = "SN")]
    Sn,
    #[serde(rename = "NON-SN")]
    #[strum(serialize = "NON-SN")]
    NonSn,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum Location {
    Floor,
    Warehouse,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum ItemType {
    Stock,
    Demo,
}

/// Whether counted stock is store-owned or vendor-owned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum OwnerCategory {
    Regular,
    Consignment,
}

/// Count payload of a record. Serialized items are unit-tracked (their
/// system quantity is always one unit); quantity-tracked items carry both
/// the imported baseline and the physical count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountState {
    Serialized {
        serial_number: String,
        found: bool,
    },
    Counted {
        system_qty: i32,
        physical_qty: i32,
    },
}

/// Per-record reconciliation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RecordStatus {
    Match,
    Over,
    Short,
}

/// Domain view of one stock record, with the SN / NON-SN split modeled as a
/// tagged variant instead of nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockRecord {
    pub id: i64,
    pub sku: String,
    pub brand: String,
    pub name: String,
    pub owner: OwnerCategory,
    pub location: Location,
    pub item_type: ItemType,
    pub count: CountState,
    pub notes: Option<String>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub batch_id: String,
}

impl StockRecord {
    pub fn category(&self) -> ItemCategory {
        match self.count {
            CountState::Serialized { .. } => ItemCategory::Sn,
            CountState::Counted { .. } => ItemCategory::NonSn,
        }
    }

    pub fn system_qty(&self) -> i32 {
        match self.count {
            CountState::Serialized { .. } => 1,
            CountState::Counted { system_qty, .. } => system_qty,
        }
    }

    pub fn physical_qty(&self) -> i32 {
        match self.count {
            CountState::Serialized { found, .. } => i32::from(found),
            CountState::Counted { physical_qty, .. } => physical_qty,
        }
    }

    /// Physical minus system quantity.
    pub fn delta(&self) -> i32 {
        self.physical_qty() - self.system_qty()
    }

    pub fn status(&self) -> RecordStatus {
        match self.delta() {
            0 => RecordStatus::Match,
            d if d > 0 => RecordStatus::Over,
            _ => RecordStatus::Short,
        }
    }

    /// A record counts as checked once anybody has written to it.
    pub fn is_checked(&self) -> bool {
        self.updated_by != UNCOUNTED_ACTOR
    }
}

impl TryFrom<stock_record::Model> for StockRecord {
    type Error = strum::ParseError;

    fn try_from(row: stock_record::Model) -> Result<Self, Self::Error> {
        let category: ItemCategory = row.category.parse()?;
        let count = match category {
            ItemCategory::Sn => CountState::Serialized {
                serial_number: row.serial_number.unwrap_or_default(),
                found: row.physical_qty >= 1,
            },
            ItemCategory::NonSn => CountState::Counted {
                system_qty: row.system_qty,
                physical_qty: row.physical_qty,
            },
        };
        Ok(Self {
            id: row.id,
            sku: row.sku,
            brand: row.brand,
            name: row.name,
            owner: row.owner_category.parse()?,
            location: row.location.parse()?,
            item_type: row.item_type.parse()?,
            count,
            notes: row.notes,
            updated_by: row.updated_by,
            updated_at: row.updated_at.with_timezone(&Utc),
            is_active: row.is_active,
            batch_id: row.batch_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, serial: Option<&str>, system: i32, physical: i32) -> stock_record::Model {
        stock_record::Model {
            id: 1,
            sku: "SKU-1".into(),
            brand: "ACME".into(),
            name: "Acme Widget".into(),
            owner_category: "Regular".into(),
            serial_number: serial.map(str::to_string),
            category: category.into(),
            location: "Floor".into(),
            item_type: "Stock".into(),
            system_qty: system,
            physical_qty: physical,
            notes: None,
            updated_by: UNCOUNTED_ACTOR.into(),
            updated_at: Utc::now().into(),
            is_active: true,
            batch_id: "SO-2024-01".into(),
        }
    }

    #[test]
    fn serialized_row_maps_to_found_flag() {
        let rec = StockRecord::try_from(row("SN", Some("SN1001"), 1, 1)).unwrap();
        assert_eq!(
            rec.count,
            CountState::Serialized {
                serial_number: "SN1001".into(),
                found: true,
            }
        );
        assert_eq!(rec.system_qty(), 1);
        assert_eq!(rec.physical_qty(), 1);
        assert_eq!(rec.status(), RecordStatus::Match);
    }

    #[test]
    fn counted_row_keeps_quantities() {
        let rec = StockRecord::try_from(row("NON-SN", None, 50, 42)).unwrap();
        assert_eq!(rec.delta(), -8);
        assert_eq!(rec.status(), RecordStatus::Short);
        assert!(!rec.is_checked());
    }

    #[test]
    fn over_count_is_flagged() {
        let rec = StockRecord::try_from(row("NON-SN", None, 10, 12)).unwrap();
        assert_eq!(rec.status(), RecordStatus::Over);
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(StockRecord::try_from(row("MYSTERY", None, 1, 0)).is_err());
    }

    #[test]
    fn enum_string_forms_round_trip() {
        assert_eq!(ItemCategory::Sn.to_string(), "SN");
        assert_eq!("NON-SN".parse::<ItemCategory>().unwrap(), ItemCategory::NonSn);
        assert_eq!("Consignment".parse::<OwnerCategory>().unwrap(), OwnerCategory::Consignment);
        assert_eq!(Location::Warehouse.to_string(), "Warehouse");
        assert_eq!(ItemType::Demo.to_string(), "Demo");
    }
}
