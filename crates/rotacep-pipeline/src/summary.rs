//! Ranked per-root reports.

use rotacep_core::geo::{round1, round2, Coordinate};

use crate::aggregate::ZoneSample;

/// Synthetic-row label for the root-wide average.
pub const ROOT_AVERAGE_LABEL: &str = "ROOT OVERALL AVERAGE";

/// Synthetic-row label for the empty-result sentinel.
pub const NO_DATA_LABEL: &str = "NO VALID POSTAL CODE FOUND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// One neighborhood of the root.
    Zone,
    /// Synthetic first row averaging every raw sample of the run.
    RootAverage,
    /// Sentinel emitted when the run produced zero usable samples.
    NoData,
}

/// One row of a ranked report. Created once per aggregation run and
/// never mutated afterwards; `None` distance/time fields render as the
/// `-` sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSummary {
    pub root: String,
    pub neighborhood: String,
    pub coordinate: Option<Coordinate>,
    pub reference_postal_code: Option<String>,
    pub distance_km: Option<f64>,
    pub estimated_minutes: Option<f64>,
    pub sample_count: usize,
    pub kind: RowKind,
}

impl ZoneSummary {
    /// The sentinel row for a run that found nothing usable.
    #[must_use]
    pub fn no_data(root: &str) -> Self {
        Self {
            root: root.to_string(),
            neighborhood: NO_DATA_LABEL.to_string(),
            coordinate: None,
            reference_postal_code: None,
            distance_km: None,
            estimated_minutes: None,
            sample_count: 0,
            kind: RowKind::NoData,
        }
    }
}

/// Orders zone summaries into the final report for one root.
///
/// Zero zones produce exactly one [`RowKind::NoData`] row. Otherwise a
/// [`RowKind::RootAverage`] row leads: its distance is the mean over all
/// raw per-sample distances (not over zone representatives) and its
/// sample count is the raw usable-sample count. Zone rows follow in
/// ascending distance order; the sort is stable, so exact ties keep
/// their first-seen grouping order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_root_report(
    root: &str,
    mut zones: Vec<ZoneSummary>,
    raw_samples: &[ZoneSample],
) -> Vec<ZoneSummary> {
    if zones.is_empty() || raw_samples.is_empty() {
        return vec![ZoneSummary::no_data(root)];
    }

    zones.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::MAX);
        let db = b.distance_km.unwrap_or(f64::MAX);
        da.total_cmp(&db)
    });

    let mean = round2(
        raw_samples.iter().map(|s| s.distance_km).sum::<f64>() / raw_samples.len() as f64,
    );
    let average = ZoneSummary {
        root: root.to_string(),
        neighborhood: ROOT_AVERAGE_LABEL.to_string(),
        coordinate: None,
        reference_postal_code: None,
        distance_km: Some(mean),
        estimated_minutes: Some(round1(mean * 2.0)),
        sample_count: raw_samples.len(),
        kind: RowKind::RootAverage,
    };

    let mut report = Vec::with_capacity(zones.len() + 1);
    report.push(average);
    report.extend(zones);
    report
}
