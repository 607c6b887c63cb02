// Shot-zone classification.
//
// Maps floor coordinates onto the stats provider's zone vocabulary: a "basic
// zone" (restricted area, paint, mid-range, corner threes, above-the-break
// three) and an "area lane" (five lateral bands). The same vocabulary is
// parsed back out of the provider's own per-shot labels, so classifier output
// and aggregated tables share one key type.

use std::fmt;

use crate::geometry::CourtGeometry;

// ---------------------------------------------------------------------------
// Basic zones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicZone {
    RestrictedArea,
    PaintNonRa,
    MidRange,
    LeftCorner3,
    RightCorner3,
    AboveBreak3,
    /// Heaves from beyond half court. Only appears in source labels; the
    /// classifier never produces it.
    Backcourt,
}

impl BasicZone {
    /// The provider's label text for this zone.
    pub fn label(&self) -> &'static str {
        match self {
            BasicZone::RestrictedArea => "Restricted Area",
            BasicZone::PaintNonRa => "In The Paint (Non-RA)",
            BasicZone::MidRange => "Mid-Range",
            BasicZone::LeftCorner3 => "Left Corner 3",
            BasicZone::RightCorner3 => "Right Corner 3",
            BasicZone::AboveBreak3 => "Above the Break 3",
            BasicZone::Backcourt => "Backcourt",
        }
    }

    /// Parse the provider's label text. Surrounding whitespace is ignored.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Restricted Area" => Some(BasicZone::RestrictedArea),
            "In The Paint (Non-RA)" => Some(BasicZone::PaintNonRa),
            "Mid-Range" => Some(BasicZone::MidRange),
            "Left Corner 3" => Some(BasicZone::LeftCorner3),
            "Right Corner 3" => Some(BasicZone::RightCorner3),
            "Above the Break 3" => Some(BasicZone::AboveBreak3),
            "Backcourt" => Some(BasicZone::Backcourt),
            _ => None,
        }
    }

    /// Restricted area and paint rows are always keyed to the center lane.
    pub fn is_paint(&self) -> bool {
        matches!(self, BasicZone::RestrictedArea | BasicZone::PaintNonRa)
    }
}

impl fmt::Display for BasicZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Area lanes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AreaLane {
    Left,
    LeftCenter,
    Center,
    RightCenter,
    Right,
    /// Beyond half court. Source labels only.
    BackCourt,
}

/// Lateral bands as `(lane, y_min, y_max)`. Half-open except the last band,
/// which also owns its right edge.
const LANES: [(AreaLane, f64, f64); 5] = [
    (AreaLane::Left, -25.0, -15.0),
    (AreaLane::LeftCenter, -15.0, -5.0),
    (AreaLane::Center, -5.0, 5.0),
    (AreaLane::RightCenter, 5.0, 15.0),
    (AreaLane::Right, 15.0, 25.0),
];

const LANE_MIN_Y: f64 = -25.0;
const LANE_MAX_Y: f64 = 25.0;

impl AreaLane {
    pub fn label(&self) -> &'static str {
        match self {
            AreaLane::Left => "Left Side(L)",
            AreaLane::LeftCenter => "Left Side Center(LC)",
            AreaLane::Center => "Center(C)",
            AreaLane::RightCenter => "Right Side Center(RC)",
            AreaLane::Right => "Right Side(R)",
            AreaLane::BackCourt => "Back Court(BC)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Left Side(L)" => Some(AreaLane::Left),
            "Left Side Center(LC)" => Some(AreaLane::LeftCenter),
            "Center(C)" => Some(AreaLane::Center),
            "Right Side Center(RC)" => Some(AreaLane::RightCenter),
            "Right Side(R)" => Some(AreaLane::Right),
            "Back Court(BC)" => Some(AreaLane::BackCourt),
            _ => None,
        }
    }

    /// Above-the-break lanes merge into left / center / right.
    pub fn collapse_above_break(self) -> Self {
        match self {
            AreaLane::Left | AreaLane::LeftCenter => AreaLane::Left,
            AreaLane::Right | AreaLane::RightCenter => AreaLane::Right,
            _ => AreaLane::Center,
        }
    }
}

impl fmt::Display for AreaLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a lateral offset (feet) onto its area lane. Values outside the court
/// are clamped onto the sidelines first.
pub fn classify_area_lane(y: f64) -> AreaLane {
    let y = y.clamp(LANE_MIN_Y, LANE_MAX_Y);
    LANES
        .iter()
        .find(|(_, y0, y1)| *y0 <= y && y < *y1)
        .map(|(lane, _, _)| *lane)
        .unwrap_or(AreaLane::Right)
}

// ---------------------------------------------------------------------------
// Zone key
// ---------------------------------------------------------------------------

/// Join key between player and league aggregates, and the grid lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey {
    pub basic: BasicZone,
    pub area: AreaLane,
}

impl ZoneKey {
    pub fn new(basic: BasicZone, area: AreaLane) -> Self {
        ZoneKey { basic, area }
    }

    /// Parse a pair of provider labels. `None` if either is unrecognized.
    pub fn from_labels(basic: &str, area: &str) -> Option<Self> {
        Some(ZoneKey {
            basic: BasicZone::from_label(basic)?,
            area: AreaLane::from_label(area)?,
        })
    }

    /// Apply the above-the-break lane collapse. Every other key is returned
    /// unchanged, which makes the transform idempotent.
    pub fn collapsed(self) -> Self {
        if self.basic == BasicZone::AboveBreak3 {
            ZoneKey {
                basic: self.basic,
                area: self.area.collapse_above_break(),
            }
        } else {
            self
        }
    }

    /// True for keys that have no place on a half-court heat display.
    pub fn is_backcourt(&self) -> bool {
        self.basic == BasicZone::Backcourt || self.area == AreaLane::BackCourt
    }
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.basic, self.area)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Geometric zone classifier with the arc/corner meet point precomputed.
#[derive(Debug, Clone, Copy)]
pub struct ZoneClassifier {
    geometry: CourtGeometry,
    hoop_x: f64,
    corner_meet_x: f64,
    half_paint: f64,
}

impl ZoneClassifier {
    pub fn new(geometry: &CourtGeometry) -> Self {
        ZoneClassifier {
            geometry: *geometry,
            hoop_x: geometry.hoop_x(),
            corner_meet_x: geometry.corner_meet_x(),
            half_paint: geometry.half_paint_width(),
        }
    }

    pub fn geometry(&self) -> &CourtGeometry {
        &self.geometry
    }

    pub fn corner_meet_x(&self) -> f64 {
        self.corner_meet_x
    }

    /// Classify a floor point into its basic zone.
    ///
    /// `pad_ft` grows the paint rectangle on every side so grid cells that
    /// straddle the lane lines are pulled into the paint instead of leaving
    /// gaps. The restricted circle and the three-point lines stay exact.
    ///
    /// Order matters: the restricted circle overlaps the paint, and the
    /// corner-three test has to run before the arc-distance test.
    pub fn classify_basic_zone(&self, x: f64, y: f64, pad_ft: f64) -> BasicZone {
        let g = &self.geometry;
        let dist = (x - self.hoop_x).hypot(y - g.hoop_y);

        if dist <= g.restricted_radius {
            return BasicZone::RestrictedArea;
        }

        let half_paint = self.half_paint + pad_ft;
        let x0 = -pad_ft;
        let x1 = g.free_throw_line_x + pad_ft;
        if x0 <= x && x <= x1 && y.abs() <= half_paint {
            return BasicZone::PaintNonRa;
        }

        if y.abs() >= g.three_point_corner && x <= self.corner_meet_x {
            return if y < 0.0 {
                BasicZone::LeftCorner3
            } else {
                BasicZone::RightCorner3
            };
        }

        if dist >= g.three_point_radius {
            return BasicZone::AboveBreak3;
        }

        BasicZone::MidRange
    }

    /// Key for an arbitrary floor point (grid cells, not shots).
    ///
    /// Paint and restricted-area points are keyed to the center lane to match
    /// the provider's tables; above-the-break lanes are collapsed.
    pub fn classify_key(&self, x: f64, y: f64, pad_ft: f64) -> ZoneKey {
        let basic = self.classify_basic_zone(x, y, pad_ft);
        let area = if basic.is_paint() {
            AreaLane::Center
        } else {
            classify_area_lane(y)
        };
        ZoneKey::new(basic, area).collapsed()
    }
}

impl Default for ZoneClassifier {
    fn default() -> Self {
        ZoneClassifier::new(&CourtGeometry::NBA)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classifier() -> ZoneClassifier {
        ZoneClassifier::default()
    }

    // -- Basic zones --

    #[test]
    fn hoop_center_is_restricted_area() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(5.25, 0.0, 0.0), BasicZone::RestrictedArea);
    }

    #[test]
    fn restricted_circle_edge_is_inclusive() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(9.25, 0.0, 0.0), BasicZone::RestrictedArea);
        assert_eq!(c.classify_basic_zone(9.26, 0.0, 0.0), BasicZone::PaintNonRa);
    }

    #[test]
    fn paint_rectangle_without_padding() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(15.0, 7.9, 0.0), BasicZone::PaintNonRa);
        assert_eq!(c.classify_basic_zone(19.0, -8.0, 0.0), BasicZone::PaintNonRa);
        assert_eq!(c.classify_basic_zone(15.0, 8.5, 0.0), BasicZone::MidRange);
        assert_eq!(c.classify_basic_zone(19.5, 0.0, 0.0), BasicZone::MidRange);
    }

    #[test]
    fn padding_pulls_lane_line_cells_into_the_paint() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(15.0, 8.5, 0.0), BasicZone::MidRange);
        assert_eq!(c.classify_basic_zone(15.0, 8.5, 1.0), BasicZone::PaintNonRa);
        assert_eq!(c.classify_basic_zone(19.5, 0.0, 1.0), BasicZone::PaintNonRa);
    }

    #[test]
    fn padding_never_moves_the_three_point_line() {
        let c = classifier();
        // Just inside the arc straight out from the hoop.
        let x = 5.25 + 23.7;
        assert_eq!(c.classify_basic_zone(x, 0.0, 0.0), BasicZone::MidRange);
        assert_eq!(c.classify_basic_zone(x, 0.0, 1.0), BasicZone::MidRange);
    }

    #[test]
    fn corner_threes_split_by_side() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(3.0, -23.0, 0.0), BasicZone::LeftCorner3);
        assert_eq!(c.classify_basic_zone(3.0, 23.0, 0.0), BasicZone::RightCorner3);
        assert_eq!(c.classify_basic_zone(3.0, 22.0, 0.0), BasicZone::RightCorner3);
        assert_eq!(c.classify_basic_zone(3.0, 21.9, 0.0), BasicZone::MidRange);
    }

    #[test]
    fn beyond_corner_meet_point_is_above_the_break() {
        let c = classifier();
        let past_meet = c.corner_meet_x() + 0.5;
        assert_eq!(c.classify_basic_zone(past_meet, 23.0, 0.0), BasicZone::AboveBreak3);
        assert_eq!(c.classify_basic_zone(35.0, 0.0, 0.0), BasicZone::AboveBreak3);
    }

    #[test]
    fn wedge_between_paint_and_arc_is_mid_range() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(20.0, 12.0, 0.0), BasicZone::MidRange);
        assert_eq!(c.classify_basic_zone(5.0, -15.0, 0.0), BasicZone::MidRange);
    }

    #[test]
    fn out_of_range_points_do_not_panic() {
        let c = classifier();
        assert_eq!(c.classify_basic_zone(60.0, 40.0, 0.0), BasicZone::AboveBreak3);
        assert_eq!(c.classify_basic_zone(-2.0, -30.0, 0.0), BasicZone::LeftCorner3);
    }

    // -- Area lanes --

    #[test]
    fn lane_bands_are_half_open() {
        assert_eq!(classify_area_lane(-25.0), AreaLane::Left);
        assert_eq!(classify_area_lane(-15.0), AreaLane::LeftCenter);
        assert_eq!(classify_area_lane(-5.0), AreaLane::Center);
        assert_eq!(classify_area_lane(4.999), AreaLane::Center);
        assert_eq!(classify_area_lane(5.0), AreaLane::RightCenter);
        assert_eq!(classify_area_lane(15.0), AreaLane::Right);
        assert_eq!(classify_area_lane(25.0), AreaLane::Right);
    }

    #[test]
    fn lanes_clamp_out_of_range_offsets() {
        assert_eq!(classify_area_lane(-40.0), AreaLane::Left);
        assert_eq!(classify_area_lane(99.0), AreaLane::Right);
    }

    // -- Labels and keys --

    #[test]
    fn labels_parse_back_to_the_same_variant() {
        for zone in [
            BasicZone::RestrictedArea,
            BasicZone::PaintNonRa,
            BasicZone::MidRange,
            BasicZone::LeftCorner3,
            BasicZone::RightCorner3,
            BasicZone::AboveBreak3,
            BasicZone::Backcourt,
        ] {
            assert_eq!(BasicZone::from_label(zone.label()), Some(zone));
        }
        assert_eq!(AreaLane::from_label(" Center(C) "), Some(AreaLane::Center));
        assert_eq!(AreaLane::from_label("None"), None);
    }

    #[test]
    fn key_display_joins_labels() {
        let key = ZoneKey::new(BasicZone::AboveBreak3, AreaLane::Left);
        assert_eq!(key.to_string(), "Above the Break 3_Left Side(L)");
    }

    #[test]
    fn collapse_only_touches_above_the_break() {
        let ab = ZoneKey::new(BasicZone::AboveBreak3, AreaLane::LeftCenter);
        assert_eq!(ab.collapsed().area, AreaLane::Left);
        let rc = ZoneKey::new(BasicZone::AboveBreak3, AreaLane::RightCenter);
        assert_eq!(rc.collapsed().area, AreaLane::Right);
        let mid = ZoneKey::new(BasicZone::MidRange, AreaLane::LeftCenter);
        assert_eq!(mid.collapsed(), mid);
    }

    #[test]
    fn paint_cells_are_keyed_to_center() {
        let c = classifier();
        let key = c.classify_key(12.0, -6.0, 1.0);
        assert_eq!(key, ZoneKey::new(BasicZone::PaintNonRa, AreaLane::Center));
        let key = c.classify_key(30.0, -12.0, 1.0);
        assert_eq!(key, ZoneKey::new(BasicZone::AboveBreak3, AreaLane::Left));
    }

    // -- Properties --

    proptest! {
        #[test]
        fn prop_restricted_circle_ignores_padding(
            r in 0.0..=4.0f64,
            theta in 0.0..std::f64::consts::TAU,
            pad in 0.0..5.0f64,
        ) {
            let c = classifier();
            let x = 5.25 + r * theta.cos();
            let y = r * theta.sin();
            // Stay a hair inside the circle so trig rounding cannot push us out.
            prop_assume!((x - 5.25).hypot(y) <= 4.0);
            prop_assert_eq!(c.classify_basic_zone(x, y, pad), BasicZone::RestrictedArea);
        }

        #[test]
        fn prop_lane_matches_clamped_lane(y in -100.0..100.0f64) {
            prop_assert_eq!(classify_area_lane(y), classify_area_lane(y.clamp(-25.0, 25.0)));
        }

        #[test]
        fn prop_collapse_is_idempotent(basic in 0usize..7, area in 0usize..6) {
            let basics = [
                BasicZone::RestrictedArea,
                BasicZone::PaintNonRa,
                BasicZone::MidRange,
                BasicZone::LeftCorner3,
                BasicZone::RightCorner3,
                BasicZone::AboveBreak3,
                BasicZone::Backcourt,
            ];
            let areas = [
                AreaLane::Left,
                AreaLane::LeftCenter,
                AreaLane::Center,
                AreaLane::RightCenter,
                AreaLane::Right,
                AreaLane::BackCourt,
            ];
            let key = ZoneKey::new(basics[basic], areas[area]);
            prop_assert_eq!(key.collapsed().collapsed(), key.collapsed());
        }

        #[test]
        fn prop_classifier_never_yields_backcourt(
            x in -10.0..60.0f64,
            y in -40.0..40.0f64,
            pad in 0.0..3.0f64,
        ) {
            let key = classifier().classify_key(x, y, pad);
            prop_assert!(!key.is_backcourt());
        }
    }
}
