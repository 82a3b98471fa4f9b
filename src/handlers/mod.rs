pub mod records;
pub mod reports;
pub mod sessions;
