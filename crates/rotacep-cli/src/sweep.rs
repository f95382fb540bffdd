//! Root sweep commands: the dense high-precision sweep and the sparse
//! quick estimate.

use std::sync::Arc;

use anyhow::Context;

use rotacep_core::{cep, AppConfig};
use rotacep_pipeline::report::{self, SENTINEL};
use rotacep_pipeline::{
    aggregate_zones, build_root_report, quick_estimate, resolve_many, sampler, CsvDirStore,
    RowKind, ZoneSample, ZoneSummary,
};

pub(crate) async fn run_sweep(
    config: &AppConfig,
    origin: &str,
    root: &str,
) -> anyhow::Result<()> {
    let root = normalize_root(root)?;
    let resolver = Arc::new(crate::jobs::build_resolver(config)?);
    let origin_coord = crate::jobs::resolve_origin(&resolver, origin).await?;

    let codes = sampler::dense_samples(&root);
    tracing::info!(%root, candidates = codes.len(), "starting high-precision sweep");
    let results = resolve_many(
        codes,
        config.pool_width,
        config.progress_every,
        |code| {
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(&code).await }
        },
        None,
    )
    .await;

    let samples: Vec<ZoneSample> = results
        .iter()
        .filter_map(|(_, record)| record.as_ref())
        .filter(|record| record.is_usable())
        .filter_map(|record| ZoneSample::from_record(origin_coord, record))
        .collect();
    tracing::info!(%root, usable = samples.len(), "sweep resolution finished");

    let zones = aggregate_zones(origin_coord, &root, &samples);
    let rows = build_root_report(&root, zones, &samples);
    publish(config, &format!("{root} - Sweep"), &rows)
}

pub(crate) async fn run_quick(
    config: &AppConfig,
    origin: &str,
    root: &str,
) -> anyhow::Result<()> {
    let root = normalize_root(root)?;
    let resolver = Arc::new(crate::jobs::build_resolver(config)?);
    let origin_coord = crate::jobs::resolve_origin(&resolver, origin).await?;

    let codes = sampler::sparse_samples(&root);
    tracing::info!(%root, candidates = codes.len(), "starting quick estimate");
    // The sparse batch is tiny; a narrower pool keeps the burst polite.
    let width = config.pool_width.min(10);
    let results = resolve_many(
        codes,
        width,
        config.progress_every,
        |code| {
            let resolver = Arc::clone(&resolver);
            async move { resolver.resolve(&code).await }
        },
        None,
    )
    .await;

    let coordinates: Vec<_> = results
        .iter()
        .filter_map(|(_, record)| record.as_ref())
        .filter_map(|record| record.coordinate)
        .collect();
    tracing::info!(%root, usable = coordinates.len(), "quick resolution finished");

    let rows = quick_estimate(origin_coord, &root, &coordinates);
    publish(config, &format!("{root} - Quick"), &rows)
}

fn normalize_root(raw: &str) -> anyhow::Result<String> {
    cep::normalize_root(raw).with_context(|| format!("'{raw}' is not a 5-digit postal root"))
}

fn publish(config: &AppConfig, sheet: &str, rows: &[ZoneSummary]) -> anyhow::Result<()> {
    let mut store = CsvDirStore::new(&config.output_dir);
    report::write_summaries(&mut store, sheet, rows)
        .with_context(|| format!("writing sheet '{sheet}'"))?;

    for row in rows {
        let distance = row
            .distance_km
            .map_or_else(|| SENTINEL.to_string(), |d| format!("{d:.2}"));
        let minutes = row
            .estimated_minutes
            .map_or_else(|| SENTINEL.to_string(), |m| format!("{m:.1}"));
        match row.kind {
            RowKind::NoData => {
                tracing::warn!(root = %row.root, "no valid postal code found for the root");
            }
            RowKind::RootAverage | RowKind::Zone => {
                tracing::info!(
                    neighborhood = %row.neighborhood,
                    distance_km = %distance,
                    est_minutes = %minutes,
                    samples = row.sample_count,
                    "zone result"
                );
            }
        }
    }
    tracing::info!(sheet, rows = rows.len(), "report written");
    Ok(())
}
