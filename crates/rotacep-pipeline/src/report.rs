//! Report assembly for the delivery-radius sheets.
//!
//! Three shapes leave the pipeline: the per-CEP detail sheet (one row
//! per geocoded postal code, ascending by distance, carrying an
//! origin-CEP marker for the route queue), the per-root rollup, and the
//! ranked zone summaries produced by sweeps.

use rotacep_core::geo::{haversine_km, round1, round2, Coordinate};
use rotacep_core::{cep, GeocodeRecord};

use crate::store::{CellValue, StoreError, TabularStore};
use crate::summary::ZoneSummary;

pub const DETAIL_HEADER: [&str; 9] = [
    "State",
    "City",
    "Neighborhood",
    "Street",
    "Root",
    "CEP",
    "Distance_km",
    "Latitude",
    "Longitude",
];

pub const ROLLUP_HEADER: [&str; 4] = ["Root", "Avg_distance_km", "Postal_codes", "Est_minutes"];

pub const SUMMARY_HEADER: [&str; 8] = [
    "Root",
    "Neighborhood",
    "Distance_km",
    "Est_minutes",
    "Samples",
    "Reference_CEP",
    "Latitude",
    "Longitude",
];

/// Marker cells on the detail header row; the route queue reads the
/// origin back from [`ORIGIN_MARKER_VALUE_CELL`].
pub const ORIGIN_MARKER_LABEL_CELL: &str = "K1";
pub const ORIGIN_MARKER_VALUE_CELL: &str = "L1";
pub const ORIGIN_MARKER_LABEL: &str = "Origin CEP:";

/// Sheet-name suffixes shared by the job runner and the route queue.
pub const DETAIL_SUFFIX: &str = " - Detailed";
pub const SUMMARY_SUFFIX: &str = " - Summary";
pub const ROUTED_SUFFIX: &str = " - Routed";

/// Rendered value for distance/time cells with no value.
pub const SENTINEL: &str = "-";

/// One detail row: a geocoded postal code and its distance from the
/// origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
    pub state: String,
    pub city: String,
    pub neighborhood: Option<String>,
    pub street: Option<String>,
    pub root: String,
    pub postal_code: String,
    pub distance_km: f64,
    pub coordinate: Coordinate,
}

/// Builds the detail rows for a city map, ascending by distance.
/// Records without a coordinate are skipped.
#[must_use]
pub fn detail_rows(
    state: &str,
    city: &str,
    origin: Coordinate,
    records: &[GeocodeRecord],
) -> Vec<DetailRow> {
    let mut rows: Vec<DetailRow> = records
        .iter()
        .filter_map(|record| {
            let coordinate = record.coordinate?;
            Some(DetailRow {
                state: state.to_string(),
                city: city.to_string(),
                neighborhood: record.neighborhood.clone(),
                street: record.street.clone(),
                root: cep::root_of(&record.postal_code).to_string(),
                postal_code: record.postal_code.clone(),
                distance_km: round2(haversine_km(origin, coordinate)),
                coordinate,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    rows
}

/// Writes a detail sheet plus the origin marker cells.
///
/// # Errors
///
/// Propagates [`StoreError`] from the underlying store.
pub fn write_detail<S: TabularStore + ?Sized>(
    store: &mut S,
    sheet: &str,
    origin_cep: &str,
    rows: &[DetailRow],
) -> Result<(), StoreError> {
    let cells: Vec<Vec<CellValue>> = rows
        .iter()
        .map(|row| {
            vec![
                CellValue::from(row.state.as_str()),
                CellValue::from(row.city.as_str()),
                optional_text(row.neighborhood.as_deref()),
                optional_text(row.street.as_deref()),
                CellValue::from(row.root.as_str()),
                CellValue::from(row.postal_code.as_str()),
                CellValue::Number(row.distance_km),
                CellValue::Number(row.coordinate.latitude),
                CellValue::Number(row.coordinate.longitude),
            ]
        })
        .collect();

    store.replace_sheet(sheet, &DETAIL_HEADER, &cells)?;
    store.update_cell(
        sheet,
        ORIGIN_MARKER_LABEL_CELL,
        CellValue::from(ORIGIN_MARKER_LABEL),
    )?;
    store.update_cell(sheet, ORIGIN_MARKER_VALUE_CELL, CellValue::from(origin_cep))?;
    Ok(())
}

/// One per-root rollup row.
#[derive(Debug, Clone, PartialEq)]
pub struct RollupRow {
    pub root: String,
    pub mean_distance_km: f64,
    pub sample_count: usize,
    pub estimated_minutes: f64,
}

/// Groups detail rows by root and averages their distances, ascending
/// by mean distance.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn root_rollup(rows: &[DetailRow]) -> Vec<RollupRow> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(root, _)| *root == row.root) {
            Some((_, distances)) => distances.push(row.distance_km),
            None => groups.push((row.root.clone(), vec![row.distance_km])),
        }
    }

    let mut rollups: Vec<RollupRow> = groups
        .into_iter()
        .map(|(root, distances)| {
            let mean = round2(distances.iter().sum::<f64>() / distances.len() as f64);
            RollupRow {
                root,
                mean_distance_km: mean,
                sample_count: distances.len(),
                estimated_minutes: round1(mean * 2.0),
            }
        })
        .collect();
    rollups.sort_by(|a, b| a.mean_distance_km.total_cmp(&b.mean_distance_km));
    rollups
}

/// Writes a rollup sheet.
///
/// # Errors
///
/// Propagates [`StoreError`] from the underlying store.
pub fn write_rollup<S: TabularStore + ?Sized>(
    store: &mut S,
    sheet: &str,
    rollups: &[RollupRow],
) -> Result<(), StoreError> {
    let cells: Vec<Vec<CellValue>> = rollups
        .iter()
        .map(|rollup| {
            vec![
                CellValue::from(rollup.root.as_str()),
                CellValue::Number(rollup.mean_distance_km),
                int_cell(rollup.sample_count),
                CellValue::Number(rollup.estimated_minutes),
            ]
        })
        .collect();
    store.replace_sheet(sheet, &ROLLUP_HEADER, &cells)
}

/// Writes ranked zone summaries; absent distances render as the `-`
/// sentinel and absent coordinates as empty cells.
///
/// # Errors
///
/// Propagates [`StoreError`] from the underlying store.
pub fn write_summaries<S: TabularStore + ?Sized>(
    store: &mut S,
    sheet: &str,
    summaries: &[ZoneSummary],
) -> Result<(), StoreError> {
    let cells: Vec<Vec<CellValue>> = summaries.iter().map(summary_cells).collect();
    store.replace_sheet(sheet, &SUMMARY_HEADER, &cells)
}

fn summary_cells(summary: &ZoneSummary) -> Vec<CellValue> {
    vec![
        CellValue::from(summary.root.as_str()),
        CellValue::from(summary.neighborhood.as_str()),
        sentinel_number(summary.distance_km),
        sentinel_number(summary.estimated_minutes),
        int_cell(summary.sample_count),
        optional_text(summary.reference_postal_code.as_deref()),
        optional_number(summary.coordinate.map(|c| c.latitude)),
        optional_number(summary.coordinate.map(|c| c.longitude)),
    ]
}

/// Zero-based index of a header column; the route queue derives column
/// positions from here instead of hardcoding letters.
#[must_use]
pub fn header_index(header: &[&str], name: &str) -> Option<usize> {
    header.iter().position(|h| *h == name)
}

fn optional_text(value: Option<&str>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::from)
}

fn optional_number(value: Option<f64>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Number)
}

fn sentinel_number(value: Option<f64>) -> CellValue {
    value.map_or_else(|| CellValue::from(SENTINEL), CellValue::Number)
}

#[allow(clippy::cast_possible_wrap)]
fn int_cell(value: usize) -> CellValue {
    CellValue::Int(value as i64)
}
