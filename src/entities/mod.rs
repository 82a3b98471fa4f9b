pub mod stock_record;

pub use stock_record::Entity as StockRecord;
