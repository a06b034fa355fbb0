//! Adapter for the BMKG station-code forecast API (JSON).
//!
//! The payload holds forecast entry lists under `data[0].cuaca`, grouped per
//! day; entries are sorted by time, so the first entry is the current slot.

use crate::providers::error::NormalizeError;
use crate::providers::{location_info, NOT_AVAILABLE};
use crate::record::{local_timestamp, WeatherRecord};
use crate::registry::Location;
use serde_json::{json, Map, Value};

pub(crate) fn normalize(raw: &str, location: &Location) -> Result<WeatherRecord, NormalizeError> {
    let payload: Value = serde_json::from_str(raw).map_err(|e| NormalizeError::JsonParse {
        id: location.id.clone(),
        source: e,
    })?;

    let missing = |field| NormalizeError::MissingField {
        id: location.id.clone(),
        field,
    };

    let groups = payload
        .get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|entry| entry.get("cuaca"))
        .and_then(Value::as_array)
        .ok_or_else(|| missing("data[0].cuaca"))?;

    // Entries may be grouped per day; flatten before taking the current slot.
    let slot = groups
        .iter()
        .flat_map(|group| match group {
            Value::Array(entries) => entries.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .next()
        .ok_or_else(|| missing("data[0].cuaca[0]"))?;

    let temperature = slot
        .get("t")
        .and_then(Value::as_number)
        .ok_or_else(|| missing("data[0].cuaca[0].t"))?;

    let timestamp = local_timestamp(location.timezone);
    let mut current = Map::new();
    current.insert("temperature".to_string(), json!(format!("{temperature}°C")));
    current.insert(
        "humidity".to_string(),
        match slot.get("hu").and_then(Value::as_number) {
            Some(humidity) => json!(format!("{humidity}%")),
            None => json!(NOT_AVAILABLE),
        },
    );
    current.insert(
        "windSpeed".to_string(),
        match slot.get("ws").and_then(Value::as_number) {
            Some(speed) => json!(format!("{speed} km/h")),
            None => json!(NOT_AVAILABLE),
        },
    );
    current.insert(
        "windDirection".to_string(),
        slot.get("wd").cloned().unwrap_or_else(|| json!(NOT_AVAILABLE)),
    );
    current.insert(
        "weather".to_string(),
        slot.get("weather_desc")
            .cloned()
            .unwrap_or_else(|| json!(NOT_AVAILABLE)),
    );
    current.insert(
        "time".to_string(),
        slot.get("local_datetime")
            .cloned()
            .unwrap_or_else(|| json!(timestamp.clone())),
    );

    Ok(WeatherRecord {
        timestamp,
        location: location_info(location),
        current,
        raw: payload,
        fallback: None,
    })
}
