//! Strategy 4b: forward geocoding via a Nominatim-style search endpoint.
//!
//! Callers must pace requests through the resolver's [`crate::MinInterval`]
//! before invoking [`search`]; the endpoint's usage policy caps request
//! frequency, not concurrency.

use std::time::Duration;

use rotacep_core::Coordinate;

use crate::error::SourceError;
use crate::sources::json_number;

/// Default production endpoint.
pub(crate) const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub(crate) async fn search(
    client: &reqwest::Client,
    base_url: &str,
    street: Option<&str>,
    city: &str,
    cep: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<Coordinate, SourceError> {
    let base = format!("{}/search", base_url.trim_end_matches('/'));
    let mut url = reqwest::Url::parse(&base).map_err(|e| SourceError::InvalidBaseUrl {
        url: base.clone(),
        reason: e.to_string(),
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(street) = street {
            pairs.append_pair("street", street);
        }
        pairs.append_pair("city", city);
        pairs.append_pair("postalcode", cep);
        pairs.append_pair("country", "Brasil");
        pairs.append_pair("format", "jsonv2");
    }

    let response = client
        .get(url.clone())
        .header(reqwest::header::USER_AGENT, user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(SourceError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    let context = format!("nominatim({cep})");
    let payload: serde_json::Value =
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.clone(),
            source: e,
        })?;

    let first = payload
        .as_array()
        .and_then(|results| results.first())
        .ok_or(SourceError::NotFound {
            url: url.to_string(),
        })?;
    let latitude = first
        .get("lat")
        .and_then(json_number)
        .ok_or(SourceError::MissingField {
            field: "lat",
            context: context.clone(),
        })?;
    let longitude = first
        .get("lon")
        .and_then(json_number)
        .ok_or(SourceError::MissingField {
            field: "lon",
            context: context.clone(),
        })?;

    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(SourceError::InvalidField {
            field: "lat/lon",
            context,
        });
    }
    Ok(coordinate)
}
