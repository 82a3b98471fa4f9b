pub mod import;
pub mod record;

pub use import::ImportRow;
pub use record::{
    CountState, ItemCategory, ItemType, Location, OwnerCategory, RecordStatus, StockRecord,
    UNCOUNTED_ACTOR,
};
