// Player-vs-league differential grid over the half court.
//
// Zone tables come from the provider's labels; every grid cell is then
// classified geometrically and looks its differential up by key, so cells
// that share a zone always share a value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::geometry::CourtGeometry;
use crate::records::{LeagueTable, SchemaError, ShotTable};
use crate::tables::{league_zone_table, player_zone_table};
use crate::zones::{ZoneClassifier, ZoneKey};

// ---------------------------------------------------------------------------
// Options and errors
// ---------------------------------------------------------------------------

/// What to do with a player zone the league table has no entry for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLeaguePolicy {
    /// Use the player's own percentage as the league value (zero differential).
    #[default]
    PlayerFallback,
    /// Leave the zone out of the differential table.
    Omit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    pub bin_ft: f64,
    pub with_hover: bool,
    pub missing_league: MissingLeaguePolicy,
    pub geometry: CourtGeometry,
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions {
            bin_ft: 2.0,
            with_hover: true,
            missing_league: MissingLeaguePolicy::default(),
            geometry: CourtGeometry::NBA,
        }
    }
}

#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("bin size must be a positive, finite number of feet (got {0})")]
    InvalidBinSize(f64),

    #[error("bin size {bin_ft} ft would need {cells} cells (limit {limit})", limit = MAX_GRID_CELLS)]
    TooManyCells { bin_ft: f64, cells: f64 },
}

/// Upper bound on grid cells. A 0.1 ft bin over the NBA half court needs
/// about 235,000.
pub const MAX_GRID_CELLS: usize = 250_000;

// ---------------------------------------------------------------------------
// Grid types
// ---------------------------------------------------------------------------

/// Joined player and league numbers for one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneDiff {
    pub player_pct: f64,
    pub league_pct: f64,
    pub diff: f64,
    pub attempts: u64,
    pub makes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub key: ZoneKey,
    pub diff: f64,
    pub hover: Option<String>,
}

/// Regular grid of classified cells, row-major with y outer and x inner.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialGrid {
    x_centers: Vec<f64>,
    y_centers: Vec<f64>,
    cells: Vec<GridCell>,
    diffs: BTreeMap<ZoneKey, ZoneDiff>,
}

impl DifferentialGrid {
    pub fn x_centers(&self) -> &[f64] {
        &self.x_centers
    }

    pub fn y_centers(&self) -> &[f64] {
        &self.y_centers
    }

    pub fn rows(&self) -> usize {
        self.y_centers.len()
    }

    pub fn cols(&self) -> usize {
        self.x_centers.len()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        if row < self.rows() && col < self.cols() {
            self.cells.get(row * self.cols() + col)
        } else {
            None
        }
    }

    /// Per-zone differential table the cells were filled from.
    pub fn diff_table(&self) -> &BTreeMap<ZoneKey, ZoneDiff> {
        &self.diffs
    }

    /// `X` as a `rows x cols` matrix (meshgrid layout).
    pub fn x_matrix(&self) -> Vec<Vec<f64>> {
        vec![self.x_centers.clone(); self.rows()]
    }

    pub fn y_matrix(&self) -> Vec<Vec<f64>> {
        self.y_centers
            .iter()
            .map(|y| vec![*y; self.cols()])
            .collect()
    }

    pub fn zdiff_matrix(&self) -> Vec<Vec<f64>> {
        self.matrix(|cell| cell.diff)
    }

    /// Zone labels (`"{basic}_{area}"`) per cell.
    pub fn label_matrix(&self) -> Vec<Vec<String>> {
        self.matrix(|cell| cell.key.to_string())
    }

    /// Hover text per cell, if the grid was built with hover text.
    pub fn hover_matrix(&self) -> Option<Vec<Vec<String>>> {
        if self.cells.iter().any(|c| c.hover.is_none()) {
            return None;
        }
        Some(self.matrix(|cell| cell.hover.clone().unwrap_or_default()))
    }

    fn matrix<T>(&self, f: impl Fn(&GridCell) -> T) -> Vec<Vec<T>> {
        let cols = self.cols().max(1);
        self.cells
            .chunks(cols)
            .map(|row| row.iter().map(&f).collect())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// `start, start + step, ...` strictly below `stop`.
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = arange_len(start, stop, step);
    if n <= 0.0 {
        return Vec::new();
    }
    (0..n as usize).map(|i| start + i as f64 * step).collect()
}

/// Element count of `arange`, as a float so huge counts cannot overflow.
fn arange_len(start: f64, stop: f64, step: f64) -> f64 {
    let n = ((stop - start) / step).ceil();
    if n.is_nan() || n <= 0.0 {
        0.0
    } else {
        n
    }
}

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}%", v * 100.0),
        _ => "n/a".to_string(),
    }
}

fn hover_text(key: &ZoneKey, entry: Option<&ZoneDiff>, diff: f64) -> String {
    format!(
        "<b>{}</b> · {}<br>Player FG%: {}<br>League FG%: {}<br>Diff: {:+.1}%",
        key.basic,
        key.area,
        pct(entry.map(|e| e.player_pct)),
        pct(entry.map(|e| e.league_pct)),
        diff * 100.0
    )
}

/// Join player and league zone tables after dropping backcourt rows and
/// collapsing above-the-break lanes.
pub fn zone_differentials(
    shots: &ShotTable,
    league: &LeagueTable,
    policy: MissingLeaguePolicy,
) -> Result<BTreeMap<ZoneKey, ZoneDiff>, SchemaError> {
    let player = player_zone_table(shots)?
        .without_backcourt()
        .collapse_above_break();
    let league = league_zone_table(league)
        .without_backcourt()
        .collapse_above_break();

    let mut diffs = BTreeMap::new();
    for (key, stat) in player.iter() {
        let player_pct = stat.percentage();
        let league_pct = match (league.percentage(key), policy) {
            (Some(pct), _) => pct,
            (None, MissingLeaguePolicy::PlayerFallback) => player_pct,
            (None, MissingLeaguePolicy::Omit) => continue,
        };
        let diff = player_pct - league_pct;
        diffs.insert(
            *key,
            ZoneDiff {
                player_pct,
                league_pct,
                diff: if diff.is_finite() { diff } else { 0.0 },
                attempts: stat.attempts,
                makes: stat.makes,
            },
        );
    }
    Ok(diffs)
}

/// Build the hot/cold differential grid for one player against the league.
pub fn build_differential_grid(
    shots: &ShotTable,
    league: &LeagueTable,
    options: &GridOptions,
) -> Result<DifferentialGrid, GridError> {
    let bin = options.bin_ft;
    if !bin.is_finite() || bin <= 0.0 {
        return Err(GridError::InvalidBinSize(bin));
    }

    let geometry = &options.geometry;
    let half_width = geometry.half_width();
    let cell_count = arange_len(bin / 2.0, geometry.half_length, bin)
        * arange_len(-half_width + bin / 2.0, half_width, bin);
    if cell_count > MAX_GRID_CELLS as f64 {
        return Err(GridError::TooManyCells {
            bin_ft: bin,
            cells: cell_count,
        });
    }

    let diffs = zone_differentials(shots, league, options.missing_league)?;

    let classifier = ZoneClassifier::new(geometry);
    let x_centers = arange(bin / 2.0, geometry.half_length, bin);
    let y_centers = arange(-half_width + bin / 2.0, half_width, bin);

    let mut cells = Vec::with_capacity(x_centers.len() * y_centers.len());
    for &y in &y_centers {
        for &x in &x_centers {
            let key = classifier.classify_key(x, y, bin / 2.0);
            let entry = diffs.get(&key);
            let diff = entry.map(|e| e.diff).filter(|d| d.is_finite()).unwrap_or(0.0);
            let hover = options.with_hover.then(|| hover_text(&key, entry, diff));
            cells.push(GridCell { key, diff, hover });
        }
    }

    debug!(
        "differential grid: {}x{} cells, {} zones with data",
        y_centers.len(),
        x_centers.len(),
        diffs.len()
    );

    Ok(DifferentialGrid {
        x_centers,
        y_centers,
        cells,
        diffs,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
