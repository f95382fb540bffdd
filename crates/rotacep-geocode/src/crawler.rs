//! City directory crawler.
//!
//! Walks the public postal-code directory (country index → state page →
//! city page → neighborhood pages) and collects every CEP listed for a
//! city. An empty result means the city has no listed codes (or the
//! directory layout changed); callers treat that as "no work to do",
//! not as an error.

use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Errors that stop a directory crawl outright. Structural misses (state
/// or city link not found) are reported as an empty result instead.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
}

/// Client for the postal-code directory site.
pub struct CityDirectoryClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout_secs: u64,
    page_delay_ms: u64,
}

impl CityDirectoryClient {
    /// Creates a client against `base_url` (no trailing slash needed).
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        user_agent: &str,
        timeout_secs: u64,
        page_delay_ms: u64,
    ) -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            timeout_secs,
            page_delay_ms,
        })
    }

    /// Collects the deduplicated, sorted set of 8-digit CEPs for a city.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError`] only for transport-level failures on the
    /// navigation pages; unreachable neighborhood pages are skipped with
    /// a warning.
    pub async fn list_postal_codes(
        &self,
        state: &str,
        city: &str,
    ) -> Result<Vec<String>, CrawlerError> {
        let index_url = format!("{}/pt-br/brasil/", self.base_url);
        let index = self.fetch_page(&index_url).await?;
        let Some(state_href) = find_link_by_name(&index, state) else {
            tracing::warn!(state, "state not found in the directory index");
            return Ok(vec![]);
        };

        self.pause().await;
        let state_page = self.fetch_page(&self.absolute(&state_href)).await?;
        let Some(city_href) = find_link_by_name(&state_page, city) else {
            tracing::warn!(state, city, "city not found on the state page");
            return Ok(vec![]);
        };

        self.pause().await;
        let city_page = self.fetch_page(&self.absolute(&city_href)).await?;
        let neighborhood_links = column_list_links(&city_page);

        let mut codes: BTreeSet<String> = BTreeSet::new();
        if neighborhood_links.is_empty() {
            tracing::warn!(
                city,
                "no neighborhood list on the city page; extracting codes from the page itself"
            );
            codes.extend(extract_postal_codes(&city_page));
        } else {
            let total = neighborhood_links.len();
            for (i, href) in neighborhood_links.iter().enumerate() {
                tracing::debug!(city, page = i + 1, total, %href, "fetching neighborhood page");
                self.pause().await;
                match self.fetch_page(&self.absolute(href)).await {
                    Ok(page) => codes.extend(extract_postal_codes(&page)),
                    Err(err) => {
                        tracing::warn!(%href, error = %err, "skipping unreachable neighborhood page");
                    }
                }
            }
        }

        if codes.is_empty() {
            tracing::warn!(state, city, "no postal codes extracted for the city");
        } else {
            tracing::info!(state, city, count = codes.len(), "city crawl complete");
        }
        Ok(codes.into_iter().collect())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, CrawlerError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CrawlerError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{href}", self.base_url)
        } else {
            format!("{}/{href}", self.base_url)
        }
    }

    async fn pause(&self) {
        if self.page_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.page_delay_ms)).await;
        }
    }
}

/// Finds the href of the link whose anchor text matches `name`
/// (case-insensitive, trimmed), scoped to the page's column list.
fn find_link_by_name(html: &str, name: &str) -> Option<String> {
    let section = column_list_section(html)?;
    let anchor_re =
        Regex::new(r#"(?s)<a\s+[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("valid regex");
    let wanted = name.trim().to_lowercase();
    for capture in anchor_re.captures_iter(section) {
        if let (Some(href), Some(text)) = (capture.get(1), capture.get(2)) {
            if text.as_str().trim().to_lowercase() == wanted {
                return Some(href.as_str().to_string());
            }
        }
    }
    None
}

/// Every href inside the page's column list, in document order.
fn column_list_links(html: &str) -> Vec<String> {
    let Some(section) = column_list_section(html) else {
        return vec![];
    };
    let anchor_re =
        Regex::new(r#"<a\s+[^>]*href=["']([^"']+)["']"#).expect("valid regex");
    anchor_re
        .captures_iter(section)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// The directory marks both state/city listings and neighborhood
/// listings with a `column-list` class on the `<ul>`.
fn column_list_section(html: &str) -> Option<&str> {
    let start = html.find("column-list")?;
    let rest = &html[start..];
    let end = rest.find("</ul>").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Extracts `ddddd-ddd` codes from listing-table anchors, normalized to
/// bare 8-digit strings.
fn extract_postal_codes(html: &str) -> BTreeSet<String> {
    let cep_re = Regex::new(r">\s*(\d{5})-(\d{3})\s*<").expect("valid regex");
    cep_re
        .captures_iter(html)
        .filter_map(|c| match (c.get(1), c.get(2)) {
            (Some(root), Some(suffix)) => Some(format!("{}{}", root.as_str(), suffix.as_str())),
            _ => None,
        })
        .collect()
}
