//! Adapter for the Open-Meteo coordinate forecast API.
//!
//! The payload carries a `current_weather` object with numeric temperature,
//! wind speed/direction, a WMO weather code, a day/night flag, and an
//! observation time.

use crate::providers::error::NormalizeError;
use crate::providers::location_info;
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

    let current_weather = payload
        .get("current_weather")
        .and_then(Value::as_object)
        .ok_or_else(|| missing("current_weather"))?;

    let temperature = current_weather
        .get("temperature")
        .and_then(Value::as_number)
        .ok_or_else(|| missing("current_weather.temperature"))?;
    let windspeed = current_weather
        .get("windspeed")
        .and_then(Value::as_number)
        .ok_or_else(|| missing("current_weather.windspeed"))?;
    let winddirection = current_weather
        .get("winddirection")
        .and_then(Value::as_number)
        .ok_or_else(|| missing("current_weather.winddirection"))?;

    let timestamp = local_timestamp(location.timezone);
    let mut current = Map::new();
    current.insert("temperature".to_string(), json!(format!("{temperature}°C")));
    current.insert("windSpeed".to_string(), json!(format!("{windspeed} km/h")));
    current.insert(
        "windDirection".to_string(),
        json!(format!("{winddirection}°")),
    );
    if let Some(code) = current_weather.get("weathercode") {
        current.insert("weathercode".to_string(), code.clone());
    }
    if let Some(is_day) = current_weather.get("is_day").and_then(Value::as_i64) {
        let label = if is_day == 1 { "Ya" } else { "Tidak" };
        current.insert("isDay".to_string(), json!(label));
    }
    current.insert(
        "time".to_string(),
        current_weather
            .get("time")
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ambon() -> Location {
        Location::coordinates("ambon", "Ambon", -3.6596, 128.1884, chrono_tz::Asia::Jayapura)
    }

    #[test]
    fn normalizes_the_ambon_example() {
        let payload = json!({
            "latitude": -3.66,
            "longitude": 128.19,
            "timezone": "Asia/Jayapura",
            "current_weather": {
                "temperature": 29.5,
                "windspeed": 10,
                "winddirection": 180,
                "weathercode": 1,
                "is_day": 1,
                "time": "2024-01-01T12:00"
            }
        });

        let record = normalize(&payload.to_string(), &ambon()).unwrap();
        assert_eq!(record.current["temperature"], "29.5°C");
        assert_eq!(record.current["windSpeed"], "10 km/h");
        assert_eq!(record.current["windDirection"], "180°");
        assert_eq!(record.current["weathercode"], 1);
        assert_eq!(record.current["isDay"], "Ya");
        assert_eq!(record.current["time"], "2024-01-01T12:00");
        assert_eq!(record.location.timezone.as_deref(), Some("Asia/Jayapura"));
        assert_eq!(record.location.latitude, Some(-3.6596));
        assert_eq!(record.raw, payload);
        assert!(record.fallback.is_none());
    }

    #[test]
    fn time_defaults_to_the_local_timestamp_when_absent() {
        let payload = json!({
            "current_weather": {
                "temperature": 27,
                "windspeed": 6,
                "winddirection": 45
            }
        });

        let record = normalize(&payload.to_string(), &ambon()).unwrap();
        assert_eq!(record.current["time"], record.timestamp);
    }

    #[test]
    fn night_flag_renders_tidak() {
        let payload = json!({
            "current_weather": {
                "temperature": 24,
                "windspeed": 4.2,
                "winddirection": 90,
                "is_day": 0
            }
        });

        let record = normalize(&payload.to_string(), &ambon()).unwrap();
        assert_eq!(record.current["isDay"], "Tidak");
        assert_eq!(record.current["windSpeed"], "4.2 km/h");
    }

    #[test]
    fn missing_current_weather_is_a_shape_error() {
        let payload = json!({"latitude": -3.66});
        let error = normalize(&payload.to_string(), &ambon()).unwrap_err();
        assert!(matches!(
            error,
            NormalizeError::MissingField {
                field: "current_weather",
                ..
            }
        ));
    }

    #[test]
    fn missing_temperature_is_a_shape_error() {
        let payload = json!({
            "current_weather": {"windspeed": 10, "winddirection": 180}
        });
        let error = normalize(&payload.to_string(), &ambon()).unwrap_err();
        assert!(matches!(
            error,
            NormalizeError::MissingField {
                field: "current_weather.temperature",
                ..
            }
        ));
    }
}
