//! Floating-point tolerances shared by every timeline operation.

/// Minimum separation between two split markers, in seconds.
///
/// Adding a marker closer than this to an existing one is rejected.
pub const MARKER_EPSILON: f64 = 0.1;

/// Tolerance used when matching a segment boundary back to the marker that
/// produced it, in seconds.
pub const BOUNDARY_EPSILON: f64 = 0.01;

/// Whether `a` and `b` are closer than `epsilon`.
#[inline]
pub fn within(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}
