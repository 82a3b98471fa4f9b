pub mod reconciliation;
pub mod sessions;
pub mod snapshots;
pub mod updates;
