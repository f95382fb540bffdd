//! Strategy 4a: ViaCEP-style address lookup.
//!
//! Returns a street address with no coordinates; the resolver pairs it
//! with a forward geocode (see [`super::nominatim`]) to finish the job.

use std::time::Duration;

use serde::Deserialize;

use crate::error::SourceError;

/// Default production endpoint.
pub(crate) const DEFAULT_BASE_URL: &str = "https://viacep.com.br";

#[derive(Debug, Deserialize)]
pub(crate) struct CepAddress {
    pub logradouro: Option<String>,
    pub bairro: Option<String>,
    pub localidade: Option<String>,
    /// ViaCEP signals an unknown CEP with `{"erro": true}` (older
    /// deployments serve the string `"true"`).
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl CepAddress {
    fn is_error(&self) -> bool {
        match &self.erro {
            Some(value) => value.as_bool() == Some(true) || value.as_str() == Some("true"),
            None => false,
        }
    }

    pub(crate) fn street(&self) -> Option<&str> {
        self.logradouro.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

pub(crate) async fn fetch_address(
    client: &reqwest::Client,
    base_url: &str,
    cep: &str,
    timeout_secs: u64,
    user_agent: &str,
) -> Result<CepAddress, SourceError> {
    let url = format!("{}/ws/{cep}/json/", base_url.trim_end_matches('/'));
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
    let context = format!("viacep({cep})");
    let address: CepAddress =
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.clone(),
            source: e,
        })?;
    if address.is_error() {
        return Err(SourceError::NotFound { url });
    }

    let has_neighborhood = address
        .bairro
        .as_deref()
        .is_some_and(|b| !b.trim().is_empty());
    if !has_neighborhood {
        return Err(SourceError::MissingField {
            field: "bairro",
            context,
        });
    }
    let has_city = address
        .localidade
        .as_deref()
        .is_some_and(|c| !c.trim().is_empty());
    if !has_city {
        return Err(SourceError::MissingField {
            field: "localidade",
            context,
        });
    }

    Ok(address)
}
