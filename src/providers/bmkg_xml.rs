//! Adapter for the BMKG legacy per-station forecast endpoint (XML).
//!
//! The payload is a parameter list keyed by parameter id (`cuaca`, `suhu`,
//! `kecepatan_angin`, `arah_angin`), each holding a time-series of values.
//! Only the first timerange entry is used; the endpoint publishes a forecast,
//! and the earliest entry is the current slot.

use crate::providers::error::NormalizeError;
use crate::providers::{location_info, NOT_AVAILABLE};
use crate::record::{local_timestamp, WeatherRecord};
use crate::registry::Location;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use xmltree::{Element, XMLNode};

const PARAMETER_IDS: [&str; 4] = ["cuaca", "suhu", "kecepatan_angin", "arah_angin"];

pub(crate) fn normalize(raw: &str, location: &Location) -> Result<WeatherRecord, NormalizeError> {
    let root = Element::parse(raw.as_bytes()).map_err(|e| NormalizeError::XmlParse {
        id: location.id.clone(),
        source: e,
    })?;

    let missing = |field| NormalizeError::MissingField {
        id: location.id.clone(),
        field,
    };

    // The forecast element is either the document root or nested one level in.
    let forecast = if root.name == "forecast" {
        &root
    } else {
        root.get_child("forecast").ok_or_else(|| missing("forecast"))?
    };
    let area = forecast
        .get_child("area")
        .ok_or_else(|| missing("forecast.area"))?;

    let mut parameters: HashMap<&str, String> = HashMap::new();
    for node in &area.children {
        let XMLNode::Element(element) = node else {
            continue;
        };
        if element.name != "parameter" {
            continue;
        }
        let Some(id) = element.attributes.get("id") else {
            continue;
        };
        if !PARAMETER_IDS.contains(&id.as_str()) {
            continue;
        }
        if let Some(value) = first_timerange_value(element) {
            parameters.insert(id.as_str(), value);
        }
    }

    let temperature = parameters.remove("suhu").ok_or_else(|| missing("suhu"))?;
    let mut take = |id: &str| parameters.remove(id).unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let timestamp = local_timestamp(location.timezone);
    let mut current = Map::new();
    current.insert("weather".to_string(), json!(take("cuaca")));
    current.insert("temperature".to_string(), json!(temperature));
    current.insert("windSpeed".to_string(), json!(take("kecepatan_angin")));
    current.insert("windDirection".to_string(), json!(take("arah_angin")));
    current.insert("time".to_string(), json!(timestamp.clone()));

    Ok(WeatherRecord {
        timestamp,
        location: location_info(location),
        current,
        raw: Value::String(raw.to_string()),
        fallback: None,
    })
}

/// First `<value>` of the first `<timerange>`, i.e. the earliest forecast slot.
fn first_timerange_value(parameter: &Element) -> Option<String> {
    parameter
        .get_child("timerange")
        .and_then(|timerange| timerange.get_child("value"))
        .and_then(|value| value.get_text())
        .map(|text| text.trim().to_string())
}
