// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Sentinel meaning "no value" for every index in the crate.
pub const INVALID_INDEX: usize = usize::MAX;

/// Lazily-initialized tolerance used when comparing floating point vertex attributes.
/// Defaults to `1e-5`, but can be overridden:
///  1) **Build-time**: set env var `MESHBUILDER_TOLERANCE` (e.g. `MESHBUILDER_TOLERANCE=1e-6 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before submitting any polygon
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    1e-5
}

/// Returns the current attribute comparison tolerance.
/// If not set yet, it tries `MESHBUILDER_TOLERANCE` (parsed as the active `Real`) and
/// falls back to `1e-5`.
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        if let Some(environment_variable) = option_env!("MESHBUILDER_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the tolerance programmatically once (subsequent calls are ignored).
/// Call near program start: `meshbuilder::float_types::set_tolerance(1e-6);`
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// `IsClose` style comparison: absolute for small magnitudes, relative for large ones.
#[inline]
pub fn is_close(a: Real, b: Real, tolerance: Real) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}
