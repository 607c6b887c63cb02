// Shot trajectories: one quadratic Bezier per shot, from the release point to
// the rim, peaking near a distance-dependent apex height.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use shotviz_core::geometry::CourtGeometry;
use shotviz_core::records::{columns, ShotRecord, ShotTable};
use shotviz_core::transform::to_court_xy_with;
use tracing::debug;

/// Seed for down-sampling large shot tables, so reruns draw the same shots.
pub const SAMPLE_SEED: u64 = 7;

pub const MAKE_COLOR: &str = "#2ca02c";
pub const MISS_COLOR: &str = "#d62728";
pub const NEUTRAL_COLOR: &str = "#666666";

// ---------------------------------------------------------------------------
// Apex model
// ---------------------------------------------------------------------------

/// Arc peak height as a clamped linear function of shot distance, in feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApexProfile {
    pub base: f64,
    /// Feet of height per foot of horizontal distance.
    pub slope: f64,
    pub lo: f64,
    pub hi: f64,
}

impl ApexProfile {
    pub const HEATMAP_OFF: ApexProfile = ApexProfile {
        base: 10.5,
        slope: 0.30,
        lo: 14.0,
        hi: 19.5,
    };

    /// Flatter arcs so the floor heatmap stays readable.
    pub const HEATMAP_ON: ApexProfile = ApexProfile {
        base: 10.0,
        slope: 0.28,
        lo: 13.0,
        hi: 18.5,
    };

    pub fn apex(&self, distance: f64) -> f64 {
        (self.base + self.slope * distance).clamp(self.lo, self.hi)
    }
}

impl Default for ApexProfile {
    fn default() -> Self {
        ApexProfile::HEATMAP_OFF
    }
}

/// Everything about an arc that changes with the heatmap toggle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcProfile {
    #[serde(flatten)]
    pub apex: ApexProfile,
    pub width: f64,
    pub opacity: f64,
}

impl ArcProfile {
    pub const HEATMAP_OFF: ArcProfile = ArcProfile {
        apex: ApexProfile::HEATMAP_OFF,
        width: 6.0,
        opacity: 0.55,
    };

    pub const HEATMAP_ON: ArcProfile = ArcProfile {
        apex: ApexProfile::HEATMAP_ON,
        width: 5.0,
        opacity: 0.40,
    };
}

// ---------------------------------------------------------------------------
// Curve
// ---------------------------------------------------------------------------

pub type Point3 = [f64; 3];

/// Height of the Bezier control point that makes the curve pass through
/// `apex` at t = 0.5.
pub fn control_height(z0: f64, z1: f64, apex: f64) -> f64 {
    2.0 * apex - 0.5 * (z0 + z1)
}

/// `n` evenly spaced samples (at least two) of the quadratic Bezier from
/// `start` to `end`, with the control point above their midpoint.
pub fn bezier_arc(start: Point3, end: Point3, apex: f64, n: usize) -> Vec<Point3> {
    let n = n.max(2);
    let [x0, y0, z0] = start;
    let [x1, y1, z1] = end;
    let (xm, ym) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let zm = control_height(z0, z1, apex);

    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            let a = (1.0 - t) * (1.0 - t);
            let b = 2.0 * (1.0 - t) * t;
            let c = t * t;
            [
                a * x0 + b * xm + c * x1,
                a * y0 + b * ym + c * y1,
                a * z0 + b * zm + c * z1,
            ]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Shot arcs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ArcColoring {
    ByResult { make: String, miss: String },
    Uniform { color: String },
}

impl ArcColoring {
    fn color_for(&self, made: bool) -> &str {
        match self {
            ArcColoring::ByResult { make, .. } if made => make,
            ArcColoring::ByResult { miss, .. } => miss,
            ArcColoring::Uniform { color } => color,
        }
    }
}

impl Default for ArcColoring {
    fn default() -> Self {
        ArcColoring::ByResult {
            make: MAKE_COLOR.to_string(),
            miss: MISS_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcOptions {
    /// Draw at most this many shots; larger tables are sampled.
    pub sample: Option<usize>,
    pub release_height_ft: f64,
    /// Extra apex height for made shots.
    pub make_bonus_ft: f64,
    pub samples_per_arc: usize,
    pub coloring: ArcColoring,
    pub profile: ArcProfile,
    pub geometry: CourtGeometry,
}

impl Default for ArcOptions {
    fn default() -> Self {
        ArcOptions {
            sample: Some(1000),
            release_height_ft: 0.0,
            make_bonus_ft: 0.0,
            samples_per_arc: 160,
            coloring: ArcColoring::default(),
            profile: ArcProfile::HEATMAP_OFF,
            geometry: CourtGeometry::NBA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotArc {
    pub points: Vec<Point3>,
    pub color: String,
    pub width: f64,
    pub opacity: f64,
    pub made: bool,
    pub hover: String,
}

fn hover_text(shot: &ShotRecord, x: f64, y: f64) -> String {
    format!(
        "({:.0},{:.0}) in → ({:.1},{:.1}) ft · {}",
        shot.loc_x,
        shot.loc_y,
        x,
        y,
        if shot.made { "MAKE" } else { "MISS" }
    )
}

/// Indices of the shots to draw, in table order.
fn sampled_indices(len: usize, sample: Option<usize>) -> Vec<usize> {
    match sample {
        Some(limit) if len > limit => {
            let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
            let mut picked = rand::seq::index::sample(&mut rng, len, limit).into_vec();
            picked.sort_unstable();
            picked
        }
        _ => (0..len).collect(),
    }
}

pub fn shot_arc(shot: &ShotRecord, options: &ArcOptions) -> ShotArc {
    let g = &options.geometry;
    let (x0, y0) = to_court_xy_with(g, shot.loc_x, shot.loc_y);
    let (x1, y1) = (g.hoop_x(), g.hoop_y);

    let distance = (x1 - x0).hypot(y1 - y0);
    let bonus = if shot.made { options.make_bonus_ft } else { 0.0 };
    let apex = options.profile.apex.apex(distance) + bonus;

    ShotArc {
        points: bezier_arc(
            [x0, y0, options.release_height_ft],
            [x1, y1, g.rim_height],
            apex,
            options.samples_per_arc,
        ),
        color: options.coloring.color_for(shot.made).to_string(),
        width: options.profile.width,
        opacity: options.profile.opacity,
        made: shot.made,
        hover: hover_text(shot, x0, y0),
    }
}

/// One arc per shot (after sampling). Tables without locations draw nothing.
pub fn build_arcs(table: &ShotTable, options: &ArcOptions) -> Vec<ShotArc> {
    if table.is_empty() || table.require_columns("shot", &[columns::LOC_X, columns::LOC_Y]).is_err() {
        return Vec::new();
    }

    let records = table.records();
    let arcs: Vec<ShotArc> = sampled_indices(records.len(), options.sample)
        .into_iter()
        .map(|i| shot_arc(&records[i], options))
        .collect();
    debug!("built {} arcs from {} shots", arcs.len(), records.len());
    arcs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
