//! Strategy 3: BrasilAPI-style CEP lookup (coordinate nested under
//! `location.coordinates`, latitude/longitude served as strings).

use std::time::Duration;

use rotacep_core::{Coordinate, GeocodeRecord, GeocodeSource};

use crate::error::SourceError;
use crate::sources::json_number;

/// Default production endpoint.
pub(crate) const DEFAULT_BASE_URL: &str = "https://brasilapi.com.br";

pub(crate) async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    cep: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<GeocodeRecord, SourceError> {
    let url = format!("{}/api/cep/v2/{cep}", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(SourceError::Status {
            status: response.status().as_u16(),
            url,
        });
    }

    let body = response.text().await?;
    let context = format!("brasil_api({cep})");
    let payload: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.clone(),
            source: e,
        })?;

    let coordinates = payload
        .get("location")
        .and_then(|l| l.get("coordinates"))
        .ok_or(SourceError::MissingField {
            field: "location.coordinates",
            context: context.clone(),
        })?;
    let latitude = coordinates
        .get("latitude")
        .and_then(json_number)
        .ok_or(SourceError::MissingField {
            field: "latitude",
            context: context.clone(),
        })?;
    let longitude = coordinates
        .get("longitude")
        .and_then(json_number)
        .ok_or(SourceError::MissingField {
            field: "longitude",
            context: context.clone(),
        })?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(SourceError::InvalidField {
            field: "latitude/longitude",
            context,
        });
    }

    let neighborhood = payload
        .get("neighborhood")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(SourceError::MissingField {
            field: "neighborhood",
            context,
        })?;
    let street = payload
        .get("street")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(GeocodeRecord {
        postal_code: cep.to_string(),
        coordinate: Some(coordinate),
        neighborhood: Some(neighborhood.to_string()),
        street,
        source: GeocodeSource::BrasilApi,
    })
}
