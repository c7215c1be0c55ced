use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Fields every scan must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 6] = ["device_id", "sample", "well_name", "block", "type", "scanned_at"];

const DEFAULT_SCANNED_BY: &str = "Unknown";

/// Why a submitted scan could not be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanValidationError {
    #[error("Scan at index {index} is not an object")]
    NotAnObject { index: usize },

    #[error("Missing required field: {field} (scan {index})")]
    MissingField { index: usize, field: &'static str },

    #[error("Invalid value for field {field} (scan {index}): {reason}")]
    InvalidField {
        index: usize,
        field: &'static str,
        reason: String,
    },
}

impl ScanValidationError {
    pub fn index(&self) -> usize {
        match self {
            ScanValidationError::NotAnObject { index }
            | ScanValidationError::MissingField { index, .. }
            | ScanValidationError::InvalidField { index, .. } => *index,
        }
    }
}

/// A scan that passed validation, normalized and ready to insert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidScan {
    pub device_id: String,
    pub local_id: Option<i32>,
    pub sample: String,
    pub well_name: String,
    pub block: String,
    #[serde(rename = "type")]
    pub scan_type: String,
    pub scanned_at: DateTime<Utc>,
    pub scanned_by: String,
    pub is_test: bool,
}

impl ValidScan {
    /// Validate the `index`-th element of a submitted batch
    pub fn from_json(index: usize, value: &Value) -> Result<Self, ScanValidationError> {
        let fields = value
            .as_object()
            .ok_or(ScanValidationError::NotAnObject { index })?;

        // Presence first, in declaration order, so the first missing field is reported
        for field in REQUIRED_FIELDS {
            if !is_present(fields.get(field)) {
                return Err(ScanValidationError::MissingField { index, field });
            }
        }

        Ok(Self {
            device_id: required_text(fields, index, "device_id")?,
            local_id: local_id(fields, index)?,
            sample: required_text(fields, index, "sample")?,
            well_name: required_text(fields, index, "well_name")?,
            block: required_text(fields, index, "block")?,
            scan_type: required_text(fields, index, "type")?,
            scanned_at: scanned_at(fields, index)?,
            scanned_by: optional_text(fields.get("scanned_by"))
                .unwrap_or_else(|| DEFAULT_SCANNED_BY.to_string()),
            is_test: matches!(fields.get("is_test"), Some(Value::Bool(true))),
        })
    }
}

/// Loose truthiness: absent, null, false, zero and blank strings are missing
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    }
}

fn required_text(
    fields: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, ScanValidationError> {
    optional_text(fields.get(field)).ok_or_else(|| ScanValidationError::InvalidField {
        index,
        field,
        reason: "expected text or a number".to_string(),
    })
}

fn local_id(fields: &Map<String, Value>, index: usize) -> Result<Option<i32>, ScanValidationError> {
    let invalid = |reason: &str| ScanValidationError::InvalidField {
        index,
        field: "local_id",
        reason: reason.to_string(),
    };

    match fields.get("local_id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| invalid("expected a 32-bit integer")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| invalid("expected a 32-bit integer")),
        Some(_) => Err(invalid("expected a 32-bit integer")),
    }
}

fn scanned_at(fields: &Map<String, Value>, index: usize) -> Result<DateTime<Utc>, ScanValidationError> {
    let invalid = |raw: String| ScanValidationError::InvalidField {
        index,
        field: "scanned_at",
        reason: format!("unrecognized timestamp '{}'", raw),
    };

    match fields.get("scanned_at") {
        Some(Value::String(s)) => parse_timestamp(s.trim()).ok_or_else(|| invalid(s.clone())),
        // Epoch milliseconds, as produced by Date.now() on the client
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| invalid(n.to_string())),
        Some(other) => Err(invalid(other.to_string())),
        None => Err(ScanValidationError::MissingField {
            index,
            field: "scanned_at",
        }),
    }
}

/// Accepts RFC 3339, naive ISO date-times (taken as UTC) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
