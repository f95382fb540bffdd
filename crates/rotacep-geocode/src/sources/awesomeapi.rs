//! Strategy 2: AwesomeAPI-style CEP lookup (direct coordinate + district).

use std::time::Duration;

use serde::Deserialize;

use rotacep_core::{Coordinate, GeocodeRecord, GeocodeSource};

use crate::error::SourceError;

/// Default production endpoint.
pub(crate) const DEFAULT_BASE_URL: &str = "https://cep.awesomeapi.com.br";

#[derive(Debug, Deserialize)]
struct CepPayload {
    lat: Option<String>,
    lng: Option<String>,
    district: Option<String>,
    address: Option<String>,
}

pub(crate) async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    cep: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<GeocodeRecord, SourceError> {
    let url = format!("{}/json/{cep}", base_url.trim_end_matches('/'));
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
    let context = format!("awesome_api({cep})");
    let payload: CepPayload =
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.clone(),
            source: e,
        })?;

    let latitude = parse_coordinate_field(payload.lat.as_deref(), "lat", &context)?;
    let longitude = parse_coordinate_field(payload.lng.as_deref(), "lng", &context)?;
    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(SourceError::InvalidField {
            field: "lat/lng",
            context,
        });
    }

    let district = payload
        .district
        .filter(|d| !d.trim().is_empty())
        .ok_or(SourceError::MissingField {
            field: "district",
            context,
        })?;

    Ok(GeocodeRecord {
        postal_code: cep.to_string(),
        coordinate: Some(coordinate),
        neighborhood: Some(district),
        street: payload.address.filter(|a| !a.trim().is_empty()),
        source: GeocodeSource::AwesomeApi,
    })
}

fn parse_coordinate_field(
    raw: Option<&str>,
    field: &'static str,
    context: &str,
) -> Result<f64, SourceError> {
    let raw = raw.ok_or_else(|| SourceError::MissingField {
        field,
        context: context.to_string(),
    })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| SourceError::InvalidField {
            field,
            context: context.to_string(),
        })
}
