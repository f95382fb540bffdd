//! Routing oracle client (OSRM-compatible HTTP API).
//!
//! The pipeline always computes great-circle distances itself; this
//! client is consulted afterwards, by the route queue, when real
//! drive-distance columns are wanted.

use std::time::Duration;

use thiserror::Error;

use rotacep_core::Coordinate;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload from {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no drivable route: {context}")]
    NoRoute { context: String },
}

/// Client for an OSRM `route/v1/driving` endpoint.
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout_secs: u64,
}

impl OsrmClient {
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            timeout_secs,
        })
    }

    /// Shortest drivable distance between two coordinates, in kilometers.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::NoRoute`] when the oracle reports no route
    ///   between the points.
    /// - [`RoutingError::Http`] / [`RoutingError::Status`] /
    ///   [`RoutingError::Deserialize`] for transport and payload failures.
    pub async fn shortest_path_km(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<f64, RoutingError> {
        // OSRM takes lon,lat pairs.
        let url = format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.base_url, from.longitude, from.latitude, to.longitude, to.latitude
        );
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RoutingError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let context = format!(
            "route ({:.4},{:.4}) -> ({:.4},{:.4})",
            from.latitude, from.longitude, to.latitude, to.longitude
        );
        let payload: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| RoutingError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        if payload.get("code").and_then(serde_json::Value::as_str) != Some("Ok") {
            return Err(RoutingError::NoRoute { context });
        }
        let meters = payload
            .get("routes")
            .and_then(serde_json::Value::as_array)
            .and_then(|routes| routes.first())
            .and_then(|route| route.get("distance"))
            .and_then(serde_json::Value::as_f64)
            .ok_or(RoutingError::NoRoute { context })?;

        Ok(meters / 1000.0)
    }
}
