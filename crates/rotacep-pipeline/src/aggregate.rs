//! Zone grouping and representative-point selection.
//!
//! Naive averaging over every sampled point in a neighborhood is
//! distorted by the occasional geocode that lands in the wrong district.
//! The two-pass mean → 3 km filter → re-mean step below tolerates a
//! minority of bad samples without manual curation, and the chosen
//! representative is always a real observed postal code, so every zone
//! distance stays traceable to an actual address.

use rotacep_core::geo::{haversine_km, round1, round2, Coordinate};
use rotacep_core::GeocodeRecord;

use crate::summary::{RowKind, ZoneSummary};

/// Bucket label for samples whose records carry no neighborhood.
pub const UNIDENTIFIED_NEIGHBORHOOD: &str = "Unidentified neighborhood";

/// Points farther than this from a group's preliminary mean are
/// distrusted during representative selection.
const TRUST_RADIUS_KM: f64 = 3.0;

/// One resolved point with its distance to the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSample {
    pub postal_code: String,
    pub coordinate: Coordinate,
    pub neighborhood: Option<String>,
    pub distance_km: f64,
}

impl ZoneSample {
    /// Builds a sample from a usable geocode record; `None` for records
    /// without a coordinate.
    #[must_use]
    pub fn from_record(origin: Coordinate, record: &GeocodeRecord) -> Option<Self> {
        let coordinate = record.coordinate?;
        Some(Self {
            postal_code: record.postal_code.clone(),
            coordinate,
            neighborhood: record.neighborhood.clone(),
            distance_km: round2(haversine_km(origin, coordinate)),
        })
    }
}

/// Groups samples by neighborhood and reduces each group to a single
/// [`RowKind::Zone`] summary.
///
/// Labels match case-sensitively after trimming; blank or absent labels
/// land in the [`UNIDENTIFIED_NEIGHBORHOOD`] bucket rather than being
/// dropped. Groups keep first-seen order.
#[must_use]
pub fn aggregate_zones(
    origin: Coordinate,
    root: &str,
    samples: &[ZoneSample],
) -> Vec<ZoneSummary> {
    let mut groups: Vec<(String, Vec<&ZoneSample>)> = Vec::new();
    for sample in samples {
        let label = sample
            .neighborhood
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(UNIDENTIFIED_NEIGHBORHOOD);
        match groups.iter_mut().find(|(name, _)| name.as_str() == label) {
            Some((_, members)) => members.push(sample),
            None => groups.push((label.to_string(), vec![sample])),
        }
    }

    groups
        .into_iter()
        .map(|(neighborhood, members)| zone_summary(origin, root, neighborhood, &members))
        .collect()
}

fn zone_summary(
    origin: Coordinate,
    root: &str,
    neighborhood: String,
    members: &[&ZoneSample],
) -> ZoneSummary {
    let trusted = trusted_subset(members);
    let center = mean_coordinate(&trusted.iter().map(|p| p.coordinate).collect::<Vec<_>>());
    let representative = trusted
        .iter()
        .copied()
        .min_by(|a, b| {
            haversine_km(a.coordinate, center).total_cmp(&haversine_km(b.coordinate, center))
        })
        .expect("zone groups are never empty");

    let distance_km = round2(haversine_km(origin, representative.coordinate));
    ZoneSummary {
        root: root.to_string(),
        neighborhood,
        coordinate: Some(representative.coordinate),
        reference_postal_code: Some(representative.postal_code.clone()),
        distance_km: Some(distance_km),
        estimated_minutes: Some(round1(distance_km * 2.0)),
        sample_count: trusted.len(),
        kind: RowKind::Zone,
    }
}

/// Representative-point pre-filter. Groups of ≤2 are trusted as-is.
/// Larger groups keep only the points within [`TRUST_RADIUS_KM`] of the
/// preliminary mean; a filter that empties the group (degenerate or
/// bimodal cluster) falls back to the full group rather than producing
/// an empty zone.
fn trusted_subset<'a>(members: &[&'a ZoneSample]) -> Vec<&'a ZoneSample> {
    if members.len() <= 2 {
        return members.to_vec();
    }
    let preliminary = mean_coordinate(&members.iter().map(|p| p.coordinate).collect::<Vec<_>>());
    let trusted: Vec<&ZoneSample> = members
        .iter()
        .copied()
        .filter(|p| haversine_km(p.coordinate, preliminary) < TRUST_RADIUS_KM)
        .collect();
    if trusted.is_empty() {
        members.to_vec()
    } else {
        trusted
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_coordinate(coordinates: &[Coordinate]) -> Coordinate {
    let n = coordinates.len() as f64;
    Coordinate::new(
        coordinates.iter().map(|c| c.latitude).sum::<f64>() / n,
        coordinates.iter().map(|c| c.longitude).sum::<f64>() / n,
    )
}

/// Fast single-row estimate for a root: the mean coordinate of the
/// sparse sample cloud, with no reference postal code (the centroid is
/// interpolated, not observed). Zero samples yield the no-data sentinel.
#[must_use]
pub fn quick_estimate(
    origin: Coordinate,
    root: &str,
    coordinates: &[Coordinate],
) -> Vec<ZoneSummary> {
    if coordinates.is_empty() {
        return vec![ZoneSummary::no_data(root)];
    }

    let center = mean_coordinate(coordinates);
    let distance_km = round2(haversine_km(origin, center));
    vec![ZoneSummary {
        root: root.to_string(),
        neighborhood: format!("Root {root} centroid ({} samples)", coordinates.len()),
        coordinate: Some(center),
        reference_postal_code: None,
        distance_km: Some(distance_km),
        estimated_minutes: Some(round1(distance_km * 2.0)),
        sample_count: coordinates.len(),
        kind: RowKind::Zone,
    }]
}
