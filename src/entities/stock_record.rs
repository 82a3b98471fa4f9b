use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per trackable item (serialized) or per-SKU aggregate (quantity
/// tracked). Column names are kept from the legacy dataset for round-trip
/// fidelity with historical batches.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub sku: String,
    pub brand: String,
    #[sea_orm(column_name = "nama_barang")]
    pub name: String,
    pub owner_category: String,
    pub serial_number: Option<String>,
    #[sea_orm(column_name = "kategori_barang")]
    pub category: String,
    #[sea_orm(column_name = "lokasi")]
    pub location: String,
    #[sea_orm(column_name = "jenis")]
    pub item_type: String,
    pub system_qty: i32,
    #[sea_orm(column_name = "fisik_qty")]
    pub physical_qty: i32,
    #[sea_orm(column_name = "keterangan")]
    pub notes: Option<String>,
    pub updated_by: String,
    pub updated_at: DateTimeWithTimeZone,
    pub is_active: bool,
    pub batch_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
