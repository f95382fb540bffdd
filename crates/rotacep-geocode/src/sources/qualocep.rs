//! Strategy 1: postal-lookup page scrape.
//!
//! The lookup site renders the street and neighborhood in the address
//! table and the coordinates in a "Latitude: … Longitude: …" heading.
//! All four fields must parse or the page counts as unavailable.

use std::time::Duration;

use regex::Regex;

use rotacep_core::{Coordinate, GeocodeRecord, GeocodeSource};

use crate::error::SourceError;

#[derive(Debug, PartialEq)]
pub(crate) struct ParsedCepPage {
    pub latitude: f64,
    pub longitude: f64,
    pub neighborhood: String,
    pub street: String,
}

pub(crate) async fn fetch(
    client: &reqwest::Client,
    base_url: &str,
    cep: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<GeocodeRecord, SourceError> {
    let url = format!("{}/busca-cep/{cep}/", base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .timeout(Duration::from_secs(timeout_secs))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(SourceError::Status {
            status: response.status().as_u16(),
            url,
        });
    }

    let html = response.text().await?;
    let parsed = parse_page(&html).ok_or(SourceError::Unparseable { url })?;
    let coordinate = Coordinate::new(parsed.latitude, parsed.longitude);
    if !coordinate.is_valid() {
        return Err(SourceError::InvalidField {
            field: "coordinates",
            context: format!("scrape({cep})"),
        });
    }

    Ok(GeocodeRecord {
        postal_code: cep.to_string(),
        coordinate: Some(coordinate),
        neighborhood: Some(parsed.neighborhood),
        street: Some(parsed.street),
        source: GeocodeSource::Scrape,
    })
}

/// Parses the coordinate heading and the address table out of a lookup
/// page. Returns `None` unless every field is present and non-empty.
pub(crate) fn parse_page(html: &str) -> Option<ParsedCepPage> {
    let latitude = capture_f64(html, r"Latitude:\s*(-?\d+\.\d+)")?;
    let longitude = capture_f64(html, r"Longitude:\s*(-?\d+\.\d+)")?;

    // Street and neighborhood live in the data row that follows the
    // `<tr class="info">` header row: cells are CEP, street, neighborhood.
    let info_re = Regex::new(r#"<tr[^>]*class="[^"]*info[^"]*"[^>]*>"#).expect("valid regex");
    let info_end = info_re.find(html)?.end();
    let after_header = &html[info_end..];
    let row_re = Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("valid regex");
    let data_row = row_re.captures(after_header)?.get(1)?.as_str();

    let cell_re = Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("valid regex");
    let cells: Vec<String> = cell_re
        .captures_iter(data_row)
        .filter_map(|c| c.get(1).map(|m| strip_tags(m.as_str())))
        .collect();
    if cells.len() < 3 {
        return None;
    }

    let street = cells[1].trim().to_string();
    let neighborhood = cells[2].trim().to_string();
    if street.is_empty() || neighborhood.is_empty() {
        return None;
    }

    Some(ParsedCepPage {
        latitude,
        longitude,
        neighborhood,
        street,
    })
}

fn capture_f64(html: &str, pattern: &str) -> Option<f64> {
    let re = Regex::new(pattern).expect("valid regex");
    re.captures(html)?.get(1)?.as_str().parse().ok()
}

fn strip_tags(fragment: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("valid regex");
    tag_re.replace_all(fragment, "").trim().to_string()
}
