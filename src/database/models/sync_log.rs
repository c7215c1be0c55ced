use serde::{Deserialize, Serialize};

/// Device recorded when a failed batch cannot be attributed
pub const UNKNOWN_DEVICE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Error => "error",
        }
    }
}

/// One `sync_logs` row, written once per ingest attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSyncLog {
    pub device_id: String,
    pub scans_count: i32,
    pub status: SyncStatus,
    pub error_message: Option<String>,
}

impl NewSyncLog {
    /// Batches spanning several devices are attributed to the first one.
    pub fn success(device_id: &str, scans_count: usize) -> Self {
        Self {
            device_id: device_id.to_string(),
            scans_count: i32::try_from(scans_count).unwrap_or(i32::MAX),
            status: SyncStatus::Success,
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            device_id: UNKNOWN_DEVICE.to_string(),
            scans_count: 0,
            status: SyncStatus::Error,
            error_message: Some(message.into()),
        }
    }
}
