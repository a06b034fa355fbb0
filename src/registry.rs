//! Defines the data structures describing the locations the pipeline polls:
//! identifiers, provider addressing (coordinates or a BMKG adm4 station code),
//! timezones, and the provider adapter each location uses. Also includes the
//! built-in default registry and loading of a registry from a JSON file.

use crate::error::CuacaError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifies which provider adapter handles a location's requests and payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Open-Meteo coordinate-based forecast API (JSON).
    OpenMeteo,
    /// BMKG station-code forecast API (JSON).
    BmkgJson,
    /// BMKG legacy per-station forecast endpoint (XML).
    BmkgXml,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::OpenMeteo => "open-meteo",
            ProviderKind::BmkgJson => "bmkg-json",
            ProviderKind::BmkgXml => "bmkg-xml",
        };
        f.write_str(name)
    }
}

/// Provider-specific addressing for a location.
///
/// Coordinate-based providers are addressed with latitude/longitude;
/// BMKG endpoints are addressed with an adm4 administrative-area code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderAddress {
    Coordinates { latitude: f64, longitude: f64 },
    StationCode {
        #[serde(rename = "adm4")]
        code: String,
    },
}

/// A single entry of the location registry.
///
/// The registry is fixed at configuration time; the set of locations does not
/// change during a run. `id` must be unique and filesystem-safe since it names
/// the record slot in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique, filesystem-safe identifier (e.g. "ambon"). Names the store slot.
    pub id: String,
    /// Human-readable display name (e.g. "Ambon").
    pub name: String,
    /// Provider-specific addressing.
    #[serde(flatten)]
    pub address: ProviderAddress,
    /// IANA timezone used to render the record timestamp in local time.
    pub timezone: Tz,
    /// Which provider adapter serves this location.
    pub provider: ProviderKind,
}

impl Location {
    /// Creates a coordinate-addressed location served by Open-Meteo.
    pub fn coordinates(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: Tz,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: ProviderAddress::Coordinates {
                latitude,
                longitude,
            },
            timezone,
            provider: ProviderKind::OpenMeteo,
        }
    }

    /// Creates a station-code-addressed location served by one of the BMKG adapters.
    pub fn station(
        id: impl Into<String>,
        name: impl Into<String>,
        code: impl Into<String>,
        timezone: Tz,
        provider: ProviderKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: ProviderAddress::StationCode { code: code.into() },
            timezone,
            provider,
        }
    }
}

/// The built-in registry: eight Indonesian cities polled from the BMKG
/// per-station XML endpoint.
pub fn default_locations() -> Vec<Location> {
    use chrono_tz::Asia::{Jakarta, Jayapura, Makassar};
    let xml = ProviderKind::BmkgXml;
    vec![
        Location::station("ambon", "Ambon", "81.76.01.1001", Jayapura, xml),
        Location::station("jakarta", "Jakarta", "31.71.06.1001", Jakarta, xml),
        Location::station("surabaya", "Surabaya", "35.76.01.1001", Jakarta, xml),
        Location::station("medan", "Medan", "12.76.01.1001", Jakarta, xml),
        Location::station("makassar", "Makassar", "73.77.01.1001", Makassar, xml),
        Location::station("bandung", "Bandung", "32.73.01.1001", Jakarta, xml),
        Location::station("yogyakarta", "Yogyakarta", "34.75.01.1001", Jakarta, xml),
        Location::station("padang", "Padang", "13.72.01.1001", Jakarta, xml),
    ]
}

/// Loads a registry from a JSON file containing an array of locations.
///
/// # Errors
///
/// Returns [`CuacaError::RegistryRead`] if the file cannot be read and
/// [`CuacaError::RegistryParse`] if its content is not a valid registry.
pub fn load_locations(path: &Path) -> Result<Vec<Location>, CuacaError> {
    let bytes =
        std::fs::read(path).map_err(|e| CuacaError::RegistryRead(path.to_path_buf(), e))?;
    serde_json::from_slice(&bytes).map_err(|e| CuacaError::RegistryParse(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_registry_ids_are_unique() {
        let locations = default_locations();
        assert_eq!(locations.len(), 8);
        let ids: HashSet<&str> = locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), locations.len());
    }

    #[test]
    fn registry_json_roundtrip() {
        let json = r#"[
            {
                "id": "ambon",
                "name": "Ambon",
                "latitude": -3.6596,
                "longitude": 128.1884,
                "timezone": "Asia/Jayapura",
                "provider": "open-meteo"
            },
            {
                "id": "jakarta",
                "name": "Jakarta",
                "adm4": "31.71.06.1001",
                "timezone": "Asia/Jakarta",
                "provider": "bmkg-xml"
            }
        ]"#;

        let locations: Vec<Location> = serde_json::from_str(json).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(
            locations[0].address,
            ProviderAddress::Coordinates {
                latitude: -3.6596,
                longitude: 128.1884,
            }
        );
        assert_eq!(locations[0].timezone, chrono_tz::Asia::Jayapura);
        assert_eq!(locations[0].provider, ProviderKind::OpenMeteo);
        assert_eq!(
            locations[1].address,
            ProviderAddress::StationCode {
                code: "31.71.06.1001".to_string(),
            }
        );
        assert_eq!(locations[1].provider, ProviderKind::BmkgXml);

        let reencoded = serde_json::to_value(&locations).unwrap();
        assert_eq!(reencoded[1]["adm4"], "31.71.06.1001");
    }
}
