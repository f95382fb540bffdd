//! Route queue: fills real-route distances into queued detail sheets.
//!
//! Every sheet named "<company> - Detailed" is a queue entry: the origin
//! CEP is read back from its marker cell, each row's coordinate is routed
//! through the oracle, the distance column is overwritten in place, and
//! the sheet is renamed "<company> - Routed" so a re-run skips it.

use anyhow::Context;

use rotacep_core::geo::round2;
use rotacep_core::{AppConfig, Coordinate};
use rotacep_geocode::{OsrmClient, RoutingError};
use rotacep_pipeline::report::{
    header_index, DETAIL_SUFFIX, ORIGIN_MARKER_VALUE_CELL, ROUTED_SUFFIX,
};
use rotacep_pipeline::store::parse_cell_ref;
use rotacep_pipeline::{CellValue, CsvDirStore, TabularStore};

/// Cell text for rows the oracle cannot route.
const NO_ROUTE: &str = "No route";
/// Cell text for rows with unparseable coordinates.
const NO_COORDINATES: &str = "No coordinates";

pub(crate) async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let osrm_base = config
        .osrm_base_url
        .as_deref()
        .context("ROTACEP_OSRM_BASE_URL must be set to process the route queue")?;
    let oracle = OsrmClient::new(osrm_base, config.geocode_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("building routing client: {e}"))?;
    let resolver = crate::jobs::build_resolver(config)?;
    let mut store = CsvDirStore::new(&config.output_dir);

    let queued: Vec<String> = store
        .list_sheets()?
        .into_iter()
        .filter(|name| name.ends_with(DETAIL_SUFFIX))
        .collect();
    if queued.is_empty() {
        tracing::info!("route queue is empty");
        return Ok(());
    }
    tracing::info!(sheets = queued.len(), "processing route queue");

    for sheet in &queued {
        match process_sheet(&oracle, &resolver, &mut store, sheet).await {
            Ok(routed) => {
                tracing::info!(%sheet, rows = routed, "route distances filled");
            }
            Err(err) => {
                let error = format!("{err:#}");
                tracing::error!(
                    %sheet,
                    error = %error,
                    "failed to fill route distances; sheet stays queued"
                );
            }
        }
    }
    Ok(())
}

async fn process_sheet(
    oracle: &OsrmClient,
    resolver: &rotacep_geocode::CepResolver,
    store: &mut CsvDirStore,
    sheet: &str,
) -> anyhow::Result<usize> {
    let rows = store.read_sheet(sheet)?;
    let header = rows.first().context("sheet is empty")?;

    let (marker_row, marker_col) = parse_cell_ref(ORIGIN_MARKER_VALUE_CELL)?;
    let origin_cep = rows
        .get(marker_row)
        .and_then(|row| row.get(marker_col))
        .map(String::as_str)
        .filter(|cep| !cep.trim().is_empty())
        .context("origin marker cell is missing")?;
    let origin = crate::jobs::resolve_origin(resolver, origin_cep).await?;

    let header_refs: Vec<&str> = header.iter().map(String::as_str).collect();
    let distance_col =
        header_index(&header_refs, "Distance_km").context("sheet has no Distance_km column")?;
    let lat_col = header_index(&header_refs, "Latitude").context("sheet has no Latitude column")?;
    let lon_col =
        header_index(&header_refs, "Longitude").context("sheet has no Longitude column")?;

    let mut values = Vec::with_capacity(rows.len().saturating_sub(1));
    let mut routed = 0usize;
    for (i, row) in rows.iter().enumerate().skip(1) {
        let destination = parse_coordinate(row, lat_col, lon_col);
        let Some(destination) = destination else {
            tracing::warn!(sheet, row = i + 1, "row has no usable coordinates");
            values.push(CellValue::from(NO_COORDINATES));
            continue;
        };

        match oracle.shortest_path_km(origin, destination).await {
            Ok(km) => {
                values.push(CellValue::Number(round2(km)));
                routed += 1;
            }
            Err(RoutingError::NoRoute { .. }) => {
                tracing::warn!(sheet, row = i + 1, "no drivable route to row");
                values.push(CellValue::from(NO_ROUTE));
            }
            Err(err) => {
                tracing::warn!(sheet, row = i + 1, error = %err, "routing call failed for row");
                values.push(CellValue::from(NO_ROUTE));
            }
        }
    }

    store.update_column(sheet, distance_col, 1, &values)?;

    let base = sheet.strip_suffix(DETAIL_SUFFIX).unwrap_or(sheet);
    let routed_name = format!("{base}{ROUTED_SUFFIX}");
    store.rename_sheet(sheet, &routed_name)?;
    tracing::info!(from = sheet, to = %routed_name, "sheet marked as routed");
    Ok(routed)
}

fn parse_coordinate(row: &[String], lat_col: usize, lon_col: usize) -> Option<Coordinate> {
    let latitude: f64 = row.get(lat_col)?.trim().parse().ok()?;
    let longitude: f64 = row.get(lon_col)?.trim().parse().ok()?;
    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(coordinate)
}
