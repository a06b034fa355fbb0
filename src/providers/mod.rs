//! Provider adapters mapping raw payloads into the canonical record shape.
//!
//! Each supported provider has its own extraction rule; a payload the adapter
//! cannot parse is a [`NormalizeError`] and is never retried, since it
//! indicates an unexpected shape rather than a transient fault.

mod bmkg_json;
mod bmkg_xml;
pub mod error;
mod open_meteo;

pub use error::NormalizeError;

use crate::record::{LocationInfo, WeatherRecord};
use crate::registry::{Location, ProviderAddress, ProviderKind};

/// Value rendered for BMKG parameters that are absent from the payload.
pub(crate) const NOT_AVAILABLE: &str = "Tidak tersedia";

/// Normalizes a raw provider payload into the canonical record for `location`,
/// dispatching on the location's provider adapter.
pub fn normalize(raw: &str, location: &Location) -> Result<WeatherRecord, NormalizeError> {
    match location.provider {
        ProviderKind::OpenMeteo => open_meteo::normalize(raw, location),
        ProviderKind::BmkgJson => bmkg_json::normalize(raw, location),
        ProviderKind::BmkgXml => bmkg_xml::normalize(raw, location),
    }
}

/// Location identity block shared by all adapters.
pub(crate) fn location_info(location: &Location) -> LocationInfo {
    let (latitude, longitude, adm4) = match &location.address {
        ProviderAddress::Coordinates {
            latitude,
            longitude,
        } => (Some(*latitude), Some(*longitude), None),
        ProviderAddress::StationCode { code } => (None, None, Some(code.clone())),
    };
    LocationInfo {
        name: location.name.clone(),
        latitude,
        longitude,
        timezone: Some(location.timezone.name().to_string()),
        adm4,
    }
}
