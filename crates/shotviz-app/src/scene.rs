// Request pipeline: filter the loaded shots, build the differential heatmap
// and its zone outlines, draw the arcs, and package everything the renderer
// needs into one serializable scene.

use serde::{Deserialize, Serialize};
use shotviz_core::boundary::{extract_boundaries, median_spacing, BoundarySegment};
use shotviz_core::geometry::CourtGeometry;
use shotviz_core::grid::{
    build_differential_grid, DifferentialGrid, GridError, GridOptions, MissingLeaguePolicy,
};
use shotviz_core::records::{LeagueTable, ShotTable};
use shotviz_core::tables::league_zone_table;
use thiserror::Error;
use tracing::{info, warn};

use crate::arcs::{
    build_arcs, ArcColoring, ArcOptions, ArcProfile, Point3, ShotArc, MAKE_COLOR, MISS_COLOR,
    NEUTRAL_COLOR,
};
use crate::court::{
    backboard_face, court_lines, floor_surface, BackboardFace, CourtLine, FloorSurface,
};
use crate::filters::{filter_shots, FilterOptions, FilterState, ResultFilter};

/// Height gap between a boundary's halo and the line drawn over it.
pub const BOUNDARY_LIFT: f64 = 0.005;

const BOUNDARY_WIDTH: f64 = 3.0;
const HALO_EXTRA_WIDTH: f64 = 3.0;
const BOUNDARY_COLOR: &str = "black";
const HALO_COLOR: &str = "white";

/// Hover markers float just above the heatmap surface.
pub const HOVER_MARKER_Z: f64 = 0.011;
/// Satellite markers sit this fraction of a bin away from the cell center.
const HOVER_SPREAD: f64 = 0.33;
const HOVER_MARKER_SIZE: f64 = 14.0;
const HOVER_MARKER_OPACITY: f64 = 0.02;

/// Diverging scale for the differential: cold blue, neutral white, hot red.
pub const HEATMAP_COLORSCALE: [(f64, &str); 3] = [(0.0, "blue"), (0.5, "white"), (1.0, "red")];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    pub enabled: bool,
    pub bin_ft: f64,
    /// Symmetric color limit, as a fraction (0.15 = +/-15 FG% points).
    pub vlim: f64,
    /// Height of the heatmap surface above the floor.
    pub z_lift: f64,
    pub boundary_z: f64,
    pub missing_league: MissingLeaguePolicy,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        HeatmapOptions {
            enabled: false,
            bin_ft: 2.0,
            vlim: 0.15,
            z_lift: 0.01,
            boundary_z: 0.09,
            missing_league: MissingLeaguePolicy::PlayerFallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ArcSettings {
    /// Draw at most this many arcs. Absent means the default cap.
    pub sample: Option<usize>,
    pub release_height_ft: f64,
    pub make_bonus_ft: f64,
    pub samples_per_arc: usize,
    /// Red/green by result; otherwise every arc uses `uniform_color`.
    pub color_by_result: bool,
    pub uniform_color: String,
    pub make_color: String,
    pub miss_color: String,
    pub heatmap_off: ArcProfile,
    pub heatmap_on: ArcProfile,
}

impl Default for ArcSettings {
    fn default() -> Self {
        ArcSettings {
            sample: Some(1000),
            release_height_ft: 0.0,
            make_bonus_ft: 0.0,
            samples_per_arc: 160,
            color_by_result: true,
            uniform_color: NEUTRAL_COLOR.to_string(),
            make_color: MAKE_COLOR.to_string(),
            miss_color: MISS_COLOR.to_string(),
            heatmap_off: ArcProfile::HEATMAP_OFF,
            heatmap_on: ArcProfile::HEATMAP_ON,
        }
    }
}

impl ArcSettings {
    fn options(&self, heatmap: bool, geometry: CourtGeometry) -> ArcOptions {
        let coloring = if self.color_by_result {
            ArcColoring::ByResult {
                make: self.make_color.clone(),
                miss: self.miss_color.clone(),
            }
        } else {
            ArcColoring::Uniform {
                color: self.uniform_color.clone(),
            }
        };
        ArcOptions {
            sample: self.sample,
            release_height_ft: self.release_height_ft,
            make_bonus_ft: self.make_bonus_ft,
            samples_per_arc: self.samples_per_arc,
            coloring,
            profile: if heatmap { self.heatmap_on } else { self.heatmap_off },
            geometry,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneOptions {
    pub heatmap: HeatmapOptions,
    pub arcs: ArcSettings,
    pub geometry: CourtGeometry,
    pub full_three_semicircle: bool,
    pub floor_opacity: f64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        SceneOptions {
            heatmap: HeatmapOptions::default(),
            arcs: ArcSettings::default(),
            geometry: CourtGeometry::NBA,
            full_three_semicircle: false,
            floor_opacity: 0.55,
        }
    }
}

// ---------------------------------------------------------------------------
// Scene types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to build zone heatmap: {0}")]
    Grid(#[from] GridError),
}

/// Conditions the user should see alongside the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    LeagueDataMissing,
    NoShots,
    HeatmapRequiresAllResults,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::LeagueDataMissing => "League averages missing; cannot render hot/cold zones.",
            Notice::NoShots => "No shots to display. Try different filters.",
            Notice::HeatmapRequiresAllResults => {
                "Hot/cold zones can only be computed when the result filter is All."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapLayer {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub zdiff: Vec<Vec<f64>>,
    pub labels: Vec<Vec<String>>,
    pub hover: Option<Vec<Vec<String>>>,
    /// Near-invisible points carrying the hover text; the surface itself
    /// does not hover.
    pub hover_markers: Option<HoverMarkers>,
    pub vlim: f64,
    pub z_lift: f64,
    pub colorscale: [(f64, &'static str); 3],
}

impl HeatmapLayer {
    fn from_grid(grid: &DifferentialGrid, options: &HeatmapOptions) -> Self {
        HeatmapLayer {
            x: grid.x_matrix(),
            y: grid.y_matrix(),
            zdiff: grid.zdiff_matrix(),
            labels: grid.label_matrix(),
            hover: grid.hover_matrix(),
            hover_markers: HoverMarkers::from_grid(grid),
            vlim: options.vlim,
            z_lift: options.z_lift,
            colorscale: HEATMAP_COLORSCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverMarkers {
    pub points: Vec<Point3>,
    pub text: Vec<String>,
    pub size: f64,
    pub opacity: f64,
    pub color: &'static str,
}

impl HoverMarkers {
    /// Five markers per cell: the center, then east, west, north and south
    /// of it. Each pass covers every cell in row-major order before the next.
    /// `None` when the grid was built without hover text.
    pub fn from_grid(grid: &DifferentialGrid) -> Option<Self> {
        let dx = median_spacing(grid.x_centers()) * HOVER_SPREAD;
        let dy = median_spacing(grid.y_centers()) * HOVER_SPREAD;
        let offsets = [(0.0, 0.0), (dx, 0.0), (-dx, 0.0), (0.0, dy), (0.0, -dy)];

        let (xs, ys) = (grid.x_centers(), grid.y_centers());
        let cells = grid.cells();
        let mut points = Vec::with_capacity(cells.len() * offsets.len());
        let mut text = Vec::with_capacity(cells.len() * offsets.len());
        for (ox, oy) in offsets {
            for (i, cell) in cells.iter().enumerate() {
                let hover = cell.hover.as_ref()?;
                let (x, y) = (xs[i % xs.len()], ys[i / xs.len()]);
                points.push([x + ox, y + oy, HOVER_MARKER_Z]);
                text.push(hover.clone());
            }
        }
        Some(HoverMarkers {
            points,
            text,
            size: HOVER_MARKER_SIZE,
            opacity: HOVER_MARKER_OPACITY,
            color: "black",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryLine {
    pub points: [Point3; 2],
    pub width: f64,
    pub color: &'static str,
}

/// Each segment as a wide white halo with the black outline just above it.
pub fn boundary_lines(segments: &[BoundarySegment], z: f64) -> Vec<BoundaryLine> {
    let mut lines = Vec::with_capacity(segments.len() * 2);
    for s in segments {
        lines.push(BoundaryLine {
            points: [[s.x0, s.y0, z], [s.x1, s.y1, z]],
            width: BOUNDARY_WIDTH + HALO_EXTRA_WIDTH,
            color: HALO_COLOR,
        });
        let top = z + BOUNDARY_LIFT;
        lines.push(BoundaryLine {
            points: [[s.x0, s.y0, top], [s.x1, s.y1, top]],
            width: BOUNDARY_WIDTH,
            color: BOUNDARY_COLOR,
        });
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub floor: FloorSurface,
    pub court: Vec<CourtLine>,
    pub backboard: BackboardFace,
    pub heatmap: Option<HeatmapLayer>,
    pub boundaries: Vec<BoundaryLine>,
    pub arcs: Vec<ShotArc>,
    /// Shots left after filtering.
    pub shots_matched: usize,
    /// Arcs actually drawn (after sampling).
    pub shots_rendered: usize,
    pub notices: Vec<Notice>,
    pub filter_options: FilterOptions,
}

/// The scene plus what it was built from, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneDocument {
    pub player: String,
    pub seasons: Vec<String>,
    pub filters: FilterState,
    pub scene: Scene,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub fn build_scene(
    shots: &ShotTable,
    league: &LeagueTable,
    filters: &FilterState,
    options: &SceneOptions,
) -> Result<Scene, SceneError> {
    let geometry = options.geometry;
    let mut notices = Vec::new();

    let mut heatmap_on = options.heatmap.enabled;
    if heatmap_on && filters.result != ResultFilter::All {
        notices.push(Notice::HeatmapRequiresAllResults);
        heatmap_on = false;
    }

    let filter_options = FilterOptions::from_table(shots);
    let filtered = filter_shots(shots, filters);

    let mut scene = Scene {
        floor: floor_surface(&geometry, options.floor_opacity),
        court: court_lines(&geometry, options.full_three_semicircle),
        backboard: backboard_face(&geometry),
        heatmap: None,
        boundaries: Vec::new(),
        arcs: Vec::new(),
        shots_matched: filtered.len(),
        shots_rendered: 0,
        notices,
        filter_options,
    };

    if filtered.is_empty() {
        scene.notices.push(Notice::NoShots);
        log_notices(&scene.notices);
        return Ok(scene);
    }

    if heatmap_on {
        // Rows whose zone labels are all unrecognised count as missing too.
        if league_zone_table(league).without_backcourt().is_empty() {
            scene.notices.push(Notice::LeagueDataMissing);
        } else {
            let grid_options = GridOptions {
                bin_ft: options.heatmap.bin_ft,
                with_hover: true,
                missing_league: options.heatmap.missing_league,
                geometry,
            };
            let grid = build_differential_grid(&filtered, league, &grid_options)?;
            let segments = extract_boundaries(&grid);
            scene.boundaries = boundary_lines(&segments, options.heatmap.boundary_z);
            scene.heatmap = Some(HeatmapLayer::from_grid(&grid, &options.heatmap));
        }
    }

    let arc_options = options.arcs.options(heatmap_on, geometry);
    scene.arcs = build_arcs(&filtered, &arc_options);
    scene.shots_rendered = scene.arcs.len();

    info!(
        "scene: {} of {} shots matched, {} rendered, heatmap {}",
        scene.shots_matched,
        shots.len(),
        scene.shots_rendered,
        if scene.heatmap.is_some() { "on" } else { "off" }
    );
    log_notices(&scene.notices);
    Ok(scene)
}

fn log_notices(notices: &[Notice]) {
    for notice in notices {
        warn!("{}", notice.message());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
