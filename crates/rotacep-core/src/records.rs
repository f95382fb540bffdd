use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Which resolution strategy produced a [`GeocodeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeSource {
    /// Postal-lookup page scrape (richest fields, most brittle).
    Scrape,
    /// AwesomeAPI-style direct coordinate + district lookup.
    AwesomeApi,
    /// BrasilAPI-style direct coordinate + neighborhood lookup.
    BrasilApi,
    /// ViaCEP address lookup followed by a rate-limited forward geocode.
    ViaCepNominatim,
}

impl std::fmt::Display for GeocodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeSource::Scrape => write!(f, "scrape"),
            GeocodeSource::AwesomeApi => write!(f, "awesome_api"),
            GeocodeSource::BrasilApi => write!(f, "brasil_api"),
            GeocodeSource::ViaCepNominatim => write!(f, "viacep_nominatim"),
        }
    }
}

/// The outcome of geocoding one postal code.
///
/// Also the persisted shape of the per-city cache files, so field names
/// are part of the cache format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRecord {
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    pub source: GeocodeSource,
}

impl GeocodeRecord {
    /// A record is usable only when both the coordinate and a non-blank
    /// neighborhood label are present. Partial records are resolution
    /// failures: a point with an unknown coordinate cannot be measured,
    /// and a coordinate with an unknown zone cannot be filed.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.coordinate.is_some()
            && self
                .neighborhood
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        coordinate: Option<Coordinate>,
        neighborhood: Option<&str>,
    ) -> GeocodeRecord {
        GeocodeRecord {
            postal_code: "01310100".to_string(),
            coordinate,
            neighborhood: neighborhood.map(str::to_string),
            street: None,
            source: GeocodeSource::AwesomeApi,
        }
    }

    #[test]
    fn usable_requires_both_coordinate_and_neighborhood() {
        let coord = Coordinate::new(-23.55, -46.63);
        assert!(record(Some(coord), Some("Bela Vista")).is_usable());
        assert!(!record(Some(coord), None).is_usable());
        assert!(!record(None, Some("Bela Vista")).is_usable());
        assert!(!record(None, None).is_usable());
    }

    #[test]
    fn blank_neighborhood_is_not_usable() {
        let coord = Coordinate::new(-23.55, -46.63);
        assert!(!record(Some(coord), Some("   ")).is_usable());
        assert!(!record(Some(coord), Some("")).is_usable());
    }
}
