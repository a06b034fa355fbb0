//! The canonical per-location weather document persisted by the pipeline.
//!
//! Every provider adapter normalizes its raw payload into a [`WeatherRecord`]
//! with stable top-level keys (`timestamp`, `location`, `current`, `raw`), so
//! downstream consumers never see a provider-specific shape.

use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The normalized, provider-agnostic weather document for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Capture time in the location's timezone, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Identity of the location the record belongs to.
    pub location: LocationInfo,
    /// Current conditions. Core keys (`temperature`, `windSpeed`,
    /// `windDirection`, `time`) are always present; provider-specific fields
    /// ride alongside them.
    pub current: Map<String, Value>,
    /// The original provider payload, preserved for downstream consumers.
    pub raw: Value,
    /// Set only when the record was reused after a failed refresh.
    #[serde(rename = "_fallback", default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackNote>,
}

/// Location identity embedded in a record. Optional fields depend on how the
/// location is addressed (coordinates vs. station code).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adm4: Option<String>,
}

/// Annotation attached to a reused prior record when the current refresh failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackNote {
    pub note: String,
    pub error: String,
    pub attempted_at: String,
}

/// Renders the current instant in the given timezone as the fixed-width
/// timestamp format used by [`WeatherRecord::timestamp`].
pub fn local_timestamp(timezone: Tz) -> String {
    Utc::now()
        .with_timezone(&timezone)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
