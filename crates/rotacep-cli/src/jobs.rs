//! The batch job runner and the city-map command.
//!
//! Jobs are grouped by (state, city) so the expensive whole-city
//! geocoding runs once per city no matter how many companies target it.
//! Every per-job failure is logged with its identifying context and the
//! batch moves on; there is no partial-result rollback.

use std::sync::Arc;

use anyhow::Context;

use rotacep_core::jobs::JobConfig;
use rotacep_core::{AppConfig, Coordinate, GeocodeRecord};
use rotacep_geocode::{CepResolver, CityDirectoryClient};
use rotacep_pipeline::report::{self, DETAIL_SUFFIX, SUMMARY_SUFFIX};
use rotacep_pipeline::{resolve_many, CityGeocodeCache, CsvDirStore};

pub(crate) async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let jobs_file = rotacep_core::jobs::load_jobs(&config.jobs_path)?;
    if jobs_file.jobs.is_empty() {
        tracing::info!("no jobs configured; nothing to do");
        return Ok(());
    }
    tracing::info!(count = jobs_file.jobs.len(), "loaded jobs");

    let resolver = Arc::new(build_resolver(config)?);
    let crawler = build_crawler(config)?;
    let cache = CityGeocodeCache::new(&config.cache_dir);
    let mut store = CsvDirStore::new(&config.output_dir);

    let groups = group_by_city(&jobs_file.jobs);
    let total_groups = groups.len();
    for (i, ((state, city), group)) in groups.into_iter().enumerate() {
        tracing::info!(
            group = i + 1,
            total_groups,
            state,
            city,
            jobs = group.len(),
            "processing city group"
        );

        let records = match city_map(config, &cache, &crawler, &resolver, state, city).await {
            Ok(records) => records,
            Err(err) => {
                let error = format!("{err:#}");
                tracing::error!(
                    state,
                    city,
                    error = %error,
                    "failed to build the city map; skipping its jobs"
                );
                continue;
            }
        };
        if records.is_empty() {
            tracing::warn!(state, city, "no usable postal codes for city; skipping its jobs");
            continue;
        }

        for job in group {
            if let Err(err) = run_job(&resolver, &mut store, job, &records).await {
                let error = format!("{err:#}");
                tracing::error!(
                    company = %job.company,
                    origin_cep = %job.origin_cep,
                    city = %job.city,
                    error = %error,
                    "job failed; continuing with the next job"
                );
            }
        }
    }

    tracing::info!("job batch complete");
    Ok(())
}

/// Force-builds the cached geocode map for one city.
pub(crate) async fn run_map_city(
    config: &AppConfig,
    state: &str,
    city: &str,
    refresh: bool,
) -> anyhow::Result<()> {
    let resolver = Arc::new(build_resolver(config)?);
    let crawler = build_crawler(config)?;
    let cache = CityGeocodeCache::new(&config.cache_dir);

    if refresh && cache.invalidate(state, city)? {
        tracing::info!(state, city, "dropped the existing cache entry");
    }

    let records = city_map(config, &cache, &crawler, &resolver, state, city).await?;
    tracing::info!(state, city, count = records.len(), "city map ready");
    Ok(())
}

/// Grouping key: trimmed (state, city), ASCII-case-insensitive; jobs naming the
/// city with different casing share one crawl.
fn group_by_city(jobs: &[JobConfig]) -> Vec<((&str, &str), Vec<&JobConfig>)> {
    let mut groups: Vec<((&str, &str), Vec<&JobConfig>)> = Vec::new();
    for job in jobs {
        let key = (job.state.trim(), job.city.trim());
        match groups.iter_mut().find(|((state, city), _)| {
            state.eq_ignore_ascii_case(key.0) && city.eq_ignore_ascii_case(key.1)
        }) {
            Some((_, members)) => members.push(job),
            None => groups.push((key, vec![job])),
        }
    }
    groups
}

/// Loads the geocoded city map through the cache, crawling + resolving
/// on a miss. Only usable records enter the map.
async fn city_map(
    config: &AppConfig,
    cache: &CityGeocodeCache,
    crawler: &CityDirectoryClient,
    resolver: &Arc<CepResolver>,
    state: &str,
    city: &str,
) -> anyhow::Result<Vec<GeocodeRecord>> {
    cache
        .get_or_resolve(state, city, || async {
            let codes = crawler.list_postal_codes(state, city).await?;
            if codes.is_empty() {
                return Ok(Vec::new());
            }
            tracing::info!(
                state,
                city,
                count = codes.len(),
                "geocoding postal codes for the city map; this runs once per city"
            );
            let results = resolve_many(
                codes,
                config.pool_width,
                config.progress_every,
                |code| {
                    let resolver = Arc::clone(resolver);
                    async move { resolver.resolve(&code).await }
                },
                None,
            )
            .await;
            Ok(results
                .into_iter()
                .filter_map(|(_, record)| record)
                .filter(GeocodeRecord::is_usable)
                .collect())
        })
        .await
}

async fn run_job(
    resolver: &CepResolver,
    store: &mut CsvDirStore,
    job: &JobConfig,
    records: &[GeocodeRecord],
) -> anyhow::Result<()> {
    tracing::info!(company = %job.company, origin_cep = %job.origin_cep, "running job");

    let origin = resolve_origin(resolver, &job.origin_cep).await?;

    let rows = report::detail_rows(&job.state, &job.city, origin, records);
    if rows.is_empty() {
        tracing::warn!(company = %job.company, "city map has no measurable rows; skipping job");
        return Ok(());
    }

    let detail_sheet = format!("{}{DETAIL_SUFFIX}", job.company);
    report::write_detail(store, &detail_sheet, &job.origin_cep, &rows)
        .with_context(|| format!("writing sheet '{detail_sheet}'"))?;

    let rollups = report::root_rollup(&rows);
    let summary_sheet = format!("{}{SUMMARY_SUFFIX}", job.company);
    report::write_rollup(store, &summary_sheet, &rollups)
        .with_context(|| format!("writing sheet '{summary_sheet}'"))?;

    tracing::info!(
        company = %job.company,
        rows = rows.len(),
        roots = rollups.len(),
        "job complete"
    );
    Ok(())
}

/// Resolves an origin CEP to a coordinate; failure is fatal for the
/// calling job only.
pub(crate) async fn resolve_origin(
    resolver: &CepResolver,
    origin_cep: &str,
) -> anyhow::Result<Coordinate> {
    let record = resolver
        .resolve(origin_cep)
        .await
        .with_context(|| format!("origin postal code {origin_cep} could not be geocoded"))?;
    record
        .coordinate
        .with_context(|| format!("origin postal code {origin_cep} resolved without a coordinate"))
}

pub(crate) fn build_resolver(config: &AppConfig) -> anyhow::Result<CepResolver> {
    crate::build_resolver(config).map_err(|e| anyhow::anyhow!("building resolver: {e}"))
}

fn build_crawler(config: &AppConfig) -> anyhow::Result<CityDirectoryClient> {
    CityDirectoryClient::new(
        &config.crawler_base_url,
        &config.user_agent,
        config.scrape_timeout_secs,
        config.crawler_page_delay_ms,
    )
    .map_err(|e| anyhow::anyhow!("building directory crawler: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, state: &str, city: &str) -> JobConfig {
        JobConfig {
            company: company.to_string(),
            origin_cep: "01310100".to_string(),
            state: state.to_string(),
            city: city.to_string(),
        }
    }

    #[test]
    fn jobs_sharing_a_city_land_in_one_group() {
        let jobs = vec![
            job("A", "São Paulo", "Guarulhos"),
            job("B", "Minas Gerais", "Varginha"),
            job("C", "São Paulo", " guarulhos "),
        ];
        let groups = group_by_city(&jobs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[0].company, "A");
        assert_eq!(groups[0].1[1].company, "C");
        assert_eq!(groups[1].1.len(), 1);
    }
}
