// Provider shot locations to half-court feet.
//
// The provider reports LOC_X/LOC_Y in tenths of a foot relative to the hoop,
// with LOC_X running along the baseline and LOC_Y toward half court.

use crate::geometry::CourtGeometry;

/// Provider location units per foot.
pub const TENTHS_TO_FEET: f64 = 0.1;

/// Convert a raw provider location into the half-court frame.
///
/// Court x is measured from the baseline, so the hoop offset is added to the
/// provider's depth axis; the provider's lateral axis becomes court y.
pub fn to_court_xy(loc_x: f64, loc_y: f64) -> (f64, f64) {
    to_court_xy_with(&CourtGeometry::NBA, loc_x, loc_y)
}

/// As [`to_court_xy`], for an explicit court.
pub fn to_court_xy_with(geometry: &CourtGeometry, loc_x: f64, loc_y: f64) -> (f64, f64) {
    (
        geometry.hoop_x() + loc_y * TENTHS_TO_FEET,
        loc_x * TENTHS_TO_FEET,
    )
}
