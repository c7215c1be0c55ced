pub mod batch;
pub mod scan;
pub mod sync_log;

pub use batch::{BatchOutcome, InsertOutcome};
pub use scan::{ScanValidationError, ValidScan, REQUIRED_FIELDS};
pub use sync_log::{NewSyncLog, SyncStatus};
