//! Cascading CEP resolver.
//!
//! No single free geocoding source has complete coverage of Brazilian
//! postal codes, so resolution walks an ordered list of independent
//! sources and returns the first usable record. Cost and robustness both
//! increase down the cascade: the scrape is richest but most brittle, the
//! address-lookup + forward-geocode fallback is slowest but most robust.

use std::time::Duration;

use rotacep_core::{cep, GeocodeRecord, GeocodeSource};

use crate::error::SourceError;
use crate::rate_limit::MinInterval;
use crate::sources::{awesomeapi, brasilapi, nominatim, qualocep, viacep};

/// Per-source endpoints and timeouts.
///
/// Every base URL is overridable so tests can point a source at a mock
/// server; the defaults are the public production endpoints.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Unset disables the scrape strategy; the cascade then starts at
    /// the first API source.
    pub scrape_base_url: Option<String>,
    pub awesome_base_url: String,
    pub brasil_base_url: String,
    pub viacep_base_url: String,
    pub nominatim_base_url: String,
    pub api_timeout_secs: u64,
    pub scrape_timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    /// Minimum spacing between forward-geocode calls (the upstream
    /// usage policy asks for at least ~1 request/second).
    pub geocode_min_interval_ms: u64,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scrape_base_url: None,
            awesome_base_url: awesomeapi::DEFAULT_BASE_URL.to_string(),
            brasil_base_url: brasilapi::DEFAULT_BASE_URL.to_string(),
            viacep_base_url: viacep::DEFAULT_BASE_URL.to_string(),
            nominatim_base_url: nominatim::DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: 5,
            scrape_timeout_secs: 10,
            geocode_timeout_secs: 15,
            geocode_min_interval_ms: 1100,
            user_agent: "rotacep/0.1 (delivery-radius planner)".to_string(),
        }
    }
}

/// Resolves postal codes to coordinates + neighborhood labels.
///
/// Owns its HTTP client and the forward-geocode pacer, so sharing one
/// resolver across a task pool shares connection pooling and the rate
/// limit; dropping it releases both.
pub struct CepResolver {
    client: reqwest::Client,
    config: ResolverConfig,
    order: Vec<GeocodeSource>,
    geocode_pacer: MinInterval,
}

impl CepResolver {
    /// Creates a resolver with the cascade order implied by `config`:
    /// scrape first when configured, then the two direct APIs, then the
    /// address-lookup fallback.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: ResolverConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        let mut order = Vec::with_capacity(4);
        if config.scrape_base_url.is_some() {
            order.push(GeocodeSource::Scrape);
        }
        order.extend([
            GeocodeSource::AwesomeApi,
            GeocodeSource::BrasilApi,
            GeocodeSource::ViaCepNominatim,
        ]);

        let geocode_pacer =
            MinInterval::new(Duration::from_millis(config.geocode_min_interval_ms));

        Ok(Self {
            client,
            config,
            order,
            geocode_pacer,
        })
    }

    /// The cascade order this resolver walks.
    #[must_use]
    pub fn source_order(&self) -> &[GeocodeSource] {
        &self.order
    }

    /// Resolves one postal code, or `None` when it cannot be resolved.
    ///
    /// Malformed input (anything that does not normalize to 8 digits) is
    /// rejected before any network traffic. Source failures and partial
    /// records are logged and the cascade continues; the batch caller
    /// skips `None` results rather than aborting.
    pub async fn resolve(&self, raw: &str) -> Option<GeocodeRecord> {
        let Some(cep) = cep::normalize(raw) else {
            tracing::warn!(raw, "rejecting malformed postal code");
            return None;
        };

        for source in &self.order {
            match self.attempt(*source, &cep).await {
                Ok(record) if record.is_usable() => {
                    tracing::debug!(%cep, source = %source, "postal code resolved");
                    return Some(record);
                }
                Ok(_) => {
                    tracing::warn!(
                        %cep,
                        source = %source,
                        "source returned a partial record; trying the next source"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        %cep,
                        source = %source,
                        error = %err,
                        "geocode source unavailable"
                    );
                }
            }
        }

        tracing::warn!(%cep, "every geocode source failed");
        None
    }

    async fn attempt(
        &self,
        source: GeocodeSource,
        cep: &str,
    ) -> Result<GeocodeRecord, SourceError> {
        match source {
            GeocodeSource::Scrape => {
                let base = self.config.scrape_base_url.as_deref().ok_or(
                    SourceError::MissingField {
                        field: "scrape_base_url",
                        context: "resolver configuration".to_string(),
                    },
                )?;
                qualocep::fetch(
                    &self.client,
                    base,
                    cep,
                    self.config.scrape_timeout_secs,
                    &self.config.user_agent,
                )
                .await
            }
            GeocodeSource::AwesomeApi => {
                awesomeapi::fetch(
                    &self.client,
                    &self.config.awesome_base_url,
                    cep,
                    self.config.api_timeout_secs,
                    &self.config.user_agent,
                )
                .await
            }
            GeocodeSource::BrasilApi => {
                brasilapi::fetch(
                    &self.client,
                    &self.config.brasil_base_url,
                    cep,
                    self.config.api_timeout_secs,
                    &self.config.user_agent,
                )
                .await
            }
            GeocodeSource::ViaCepNominatim => self.resolve_via_address(cep).await,
        }
    }

    /// Last-resort strategy: look the address up (no coordinates), then
    /// forward-geocode it through the paced endpoint.
    async fn resolve_via_address(&self, cep: &str) -> Result<GeocodeRecord, SourceError> {
        let address = viacep::fetch_address(
            &self.client,
            &self.config.viacep_base_url,
            cep,
            self.config.api_timeout_secs,
            &self.config.user_agent,
        )
        .await?;

        let city = address
            .localidade
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(SourceError::MissingField {
                field: "localidade",
                context: format!("viacep({cep})"),
            })?;

        self.geocode_pacer.wait().await;
        let coordinate = nominatim::search(
            &self.client,
            &self.config.nominatim_base_url,
            address.street(),
            city,
            cep,
            self.config.geocode_timeout_secs,
            &self.config.user_agent,
        )
        .await?;

        Ok(GeocodeRecord {
            postal_code: cep.to_string(),
            coordinate: Some(coordinate),
            neighborhood: address.bairro.clone(),
            street: address.street().map(str::to_string),
            source: GeocodeSource::ViaCepNominatim,
        })
    }
}
