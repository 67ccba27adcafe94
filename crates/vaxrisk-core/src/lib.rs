#![deny(missing_docs)]
#![doc = "Shared error types, deterministic seeding, result tables and provenance for the vaxrisk engine."]

pub mod errors;
pub mod provenance;
pub mod rng;
pub mod serde;
pub mod table;

pub use errors::{
    invalid_parameter, require_non_negative, require_positive, require_unit_interval, ErrorInfo,
    VaxError,
};
pub use provenance::{RunProvenance, SchemaVersion};
pub use rng::{derive_nested_seed, derive_substream_seed, RngHandle};
pub use crate::serde::{from_yaml_str, stable_hash_string, to_canonical_json_bytes};
pub use table::ResultTable;

/// Linear interpolation on an evenly spaced periodic day grid.
///
/// `values[i]` is the value at day `i`; the grid wraps with period `values.len()`.
/// Matches the behaviour of periodic `interp` on integer knots.
pub fn interp_periodic(values: &[f64], time: f64) -> f64 {
    assert!(time.is_finite(), "interpolation time must be finite");
    let period = values.len();
    assert!(period > 0, "interpolation grid must be non-empty");
    let wrapped = time.rem_euclid(period as f64);
    let lower = wrapped.floor();
    let frac = wrapped - lower;
    let lo = (lower as usize) % period;
    let hi = (lo + 1) % period;
    if frac == 0.0 {
        values[lo]
    } else {
        values[lo] * (1.0 - frac) + values[hi] * frac
    }
}
