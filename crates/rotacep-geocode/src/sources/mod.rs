//! One module per geocoding source. Each exposes a fetch function with
//! the same shape: given the shared HTTP client and a normalized 8-digit
//! CEP, return a full [`rotacep_core::GeocodeRecord`] or a
//! [`crate::SourceError`] describing why this source is unavailable.

pub(crate) mod awesomeapi;
pub(crate) mod brasilapi;
pub(crate) mod nominatim;
pub(crate) mod qualocep;
pub(crate) mod viacep;

/// Reads a JSON field that providers serve either as a number or as a
/// numeric string.
pub(crate) fn json_number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}
