// Half-court geometry.
//
// Frame: x is the distance from the baseline into the court (0..47 ft), y is
// the lateral offset from the court's long centerline (-25..+25 ft). Every
// classifier, grid and drawing routine works in this frame.

// ---------------------------------------------------------------------------
// Court geometry
// ---------------------------------------------------------------------------

/// Fixed court dimensions, in feet.
///
/// Constructed once (usually [`CourtGeometry::NBA`]) and passed by reference;
/// nothing mutates it after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourtGeometry {
    /// Baseline to half-court line.
    pub half_length: f64,
    /// Sideline to sideline.
    pub width: f64,
    pub rim_height: f64,
    pub rim_radius: f64,
    pub backboard_width: f64,
    pub backboard_height: f64,
    /// Backboard plane, measured from the baseline.
    pub backboard_x: f64,
    pub rim_to_backboard: f64,
    /// Lateral position of the hoop center.
    pub hoop_y: f64,
    pub three_point_radius: f64,
    /// Lateral distance of the straight corner three-point lines.
    pub three_point_corner: f64,
    pub paint_width: f64,
    /// Free-throw line, measured from the baseline.
    pub free_throw_line_x: f64,
    pub free_throw_circle_radius: f64,
    pub restricted_radius: f64,
}

impl CourtGeometry {
    /// Regulation NBA half court.
    pub const NBA: CourtGeometry = CourtGeometry {
        half_length: 47.0,
        width: 50.0,
        rim_height: 10.0,
        rim_radius: 0.75,
        backboard_width: 6.0,
        backboard_height: 3.5,
        backboard_x: 4.0,
        rim_to_backboard: 1.25,
        hoop_y: 0.0,
        three_point_radius: 23.75,
        three_point_corner: 22.0,
        paint_width: 16.0,
        free_throw_line_x: 19.0,
        free_throw_circle_radius: 6.0,
        restricted_radius: 4.0,
    };

    /// Hoop center, measured from the baseline (5.25 ft for NBA).
    pub fn hoop_x(&self) -> f64 {
        self.backboard_x + self.rim_to_backboard
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn half_paint_width(&self) -> f64 {
        self.paint_width / 2.0
    }

    /// Angle (radians, from the court's long axis) at which the three-point
    /// arc meets the straight corner lines: `asin(corner / radius)`.
    pub fn corner_meet_angle(&self) -> f64 {
        (self.three_point_corner / self.three_point_radius).asin()
    }

    /// x coordinate where the three-point arc joins the corner lines.
    pub fn corner_meet_x(&self) -> f64 {
        self.hoop_x() + self.three_point_radius * self.corner_meet_angle().cos()
    }

    /// Euclidean distance from the hoop center on the floor plane.
    pub fn distance_to_hoop(&self, x: f64, y: f64) -> f64 {
        (x - self.hoop_x()).hypot(y - self.hoop_y)
    }
}

impl Default for CourtGeometry {
    fn default() -> Self {
        Self::NBA
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn nba_hoop_sits_five_and_a_quarter_feet_from_baseline() {
        assert!(approx_eq(CourtGeometry::NBA.hoop_x(), 5.25, 1e-12));
    }

    #[test]
    fn corner_meet_point_lies_on_the_arc_at_the_corner_cutoff() {
        let g = CourtGeometry::NBA;
        let x = g.corner_meet_x();
        // The meet point is 22 ft to the side and exactly one arc radius away.
        assert!(approx_eq(g.distance_to_hoop(x, 22.0), g.three_point_radius, 1e-9));
        assert!(approx_eq(x, 5.25 + (23.75f64.powi(2) - 22.0f64.powi(2)).sqrt(), 1e-9));
    }

    #[test]
    fn default_is_nba() {
        assert_eq!(CourtGeometry::default(), CourtGeometry::NBA);
    }
}
