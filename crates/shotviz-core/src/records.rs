// Shot and league-average tables as delivered by the stats provider.
//
// Player shots arrive one row per attempt. League averages arrive in one of
// several shapes depending on the endpoint; the shape is resolved once, here,
// when the table is read, so the aggregation code only ever sees a tagged
// variant.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub mod columns {
    pub const LOC_X: &str = "LOC_X";
    pub const LOC_Y: &str = "LOC_Y";
    pub const SHOT_MADE_FLAG: &str = "SHOT_MADE_FLAG";
    pub const PERIOD: &str = "PERIOD";
    pub const TEAM_ID: &str = "TEAM_ID";
    pub const HTM: &str = "HTM";
    pub const VTM: &str = "VTM";
    pub const ACTION_TYPE: &str = "ACTION_TYPE";
    pub const SHOT_DISTANCE: &str = "SHOT_DISTANCE";
    pub const SHOT_ZONE_BASIC: &str = "SHOT_ZONE_BASIC";
    pub const SHOT_ZONE_AREA: &str = "SHOT_ZONE_AREA";
    pub const GAME_ID: &str = "GAME_ID";
    pub const VENUE: &str = "VENUE";
    pub const OPPONENT: &str = "OPPONENT";
    pub const SEASON: &str = "SEASON";
    pub const FGM: &str = "FGM";
    pub const FGA: &str = "FGA";
    pub const FG_PCT: &str = "FG_PCT";

    /// Zone label columns every aggregation needs.
    pub const ZONE_LABELS: [&str; 2] = [SHOT_ZONE_BASIC, SHOT_ZONE_AREA];

    /// Columns of a fully populated shot table.
    pub const SHOT_COLUMNS: [&str; 15] = [
        LOC_X,
        LOC_Y,
        SHOT_MADE_FLAG,
        PERIOD,
        TEAM_ID,
        HTM,
        VTM,
        ACTION_TYPE,
        SHOT_DISTANCE,
        SHOT_ZONE_BASIC,
        SHOT_ZONE_AREA,
        GAME_ID,
        VENUE,
        OPPONENT,
        SEASON,
    ];
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A table is missing columns an operation cannot work without.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{table} table missing required columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub table: &'static str,
    pub missing: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ---------------------------------------------------------------------------
// Shot records
// ---------------------------------------------------------------------------

/// Which side of the matchup the shooter's team was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Home,
    Away,
    Unknown,
}

impl Venue {
    pub fn label(&self) -> &'static str {
        match self {
            Venue::Home => "Home",
            Venue::Away => "Away",
            Venue::Unknown => "Unknown",
        }
    }

    fn from_label(label: &str) -> Venue {
        match label.trim() {
            "Home" => Venue::Home,
            "Away" => Venue::Away,
            _ => Venue::Unknown,
        }
    }
}

/// One field-goal attempt.
///
/// `loc_x`/`loc_y` stay in the provider's encoding (hoop-centered, tenths of
/// a foot); see [`crate::transform::to_court_xy`]. Zone labels are the
/// provider's own and are trusted as-is by the aggregation tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotRecord {
    pub loc_x: f64,
    pub loc_y: f64,
    pub made: bool,
    pub period: Option<u8>,
    pub team_id: Option<u64>,
    pub home_team: Option<String>,
    pub visitor_team: Option<String>,
    pub action_type: Option<String>,
    pub shot_distance: Option<f64>,
    pub zone_basic: String,
    pub zone_area: String,
    pub game_id: Option<String>,
    pub venue: Option<Venue>,
    pub opponent: Option<String>,
    pub season: Option<String>,
}

impl ShotRecord {
    /// A shot with just its zone labels and result; everything else default.
    pub fn in_zone(zone_basic: &str, zone_area: &str, made: bool) -> Self {
        ShotRecord {
            zone_basic: zone_basic.to_string(),
            zone_area: zone_area.to_string(),
            made,
            ..ShotRecord::default()
        }
    }

    /// Builder-style setter for the raw provider location.
    pub fn at(mut self, loc_x: f64, loc_y: f64) -> Self {
        self.loc_x = loc_x;
        self.loc_y = loc_y;
        self
    }
}

/// Raw CSV row. Every column is optional so one struct can read exports with
/// any subset of columns; [`ShotTable`] remembers which ones were present.
#[derive(Debug, Deserialize)]
struct RawShotRow {
    #[serde(rename = "LOC_X", default, deserialize_with = "csv::invalid_option")]
    loc_x: Option<f64>,
    #[serde(rename = "LOC_Y", default, deserialize_with = "csv::invalid_option")]
    loc_y: Option<f64>,
    #[serde(rename = "SHOT_MADE_FLAG", default, deserialize_with = "csv::invalid_option")]
    shot_made_flag: Option<u8>,
    #[serde(rename = "PERIOD", default, deserialize_with = "csv::invalid_option")]
    period: Option<u8>,
    #[serde(rename = "TEAM_ID", default, deserialize_with = "csv::invalid_option")]
    team_id: Option<u64>,
    #[serde(rename = "HTM", default)]
    htm: Option<String>,
    #[serde(rename = "VTM", default)]
    vtm: Option<String>,
    #[serde(rename = "ACTION_TYPE", default)]
    action_type: Option<String>,
    #[serde(rename = "SHOT_DISTANCE", default, deserialize_with = "csv::invalid_option")]
    shot_distance: Option<f64>,
    #[serde(rename = "SHOT_ZONE_BASIC", default)]
    shot_zone_basic: Option<String>,
    #[serde(rename = "SHOT_ZONE_AREA", default)]
    shot_zone_area: Option<String>,
    #[serde(rename = "GAME_ID", default)]
    game_id: Option<String>,
    #[serde(rename = "VENUE", default)]
    venue: Option<String>,
    #[serde(rename = "OPPONENT", default)]
    opponent: Option<String>,
    #[serde(rename = "SEASON", default)]
    season: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Shot table
// ---------------------------------------------------------------------------

/// Shot records plus the set of columns the source actually carried.
///
/// Column presence matters: schema checks fail on missing zone labels, and
/// filters only apply when their column exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotTable {
    columns: BTreeSet<String>,
    records: Vec<ShotRecord>,
}

impl ShotTable {
    pub fn new<I, S>(columns: I, records: Vec<ShotRecord>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ShotTable {
            columns: columns.into_iter().map(Into::into).collect(),
            records,
        }
    }

    /// Table with every standard shot column present.
    pub fn from_records(records: Vec<ShotRecord>) -> Self {
        ShotTable::new(columns::SHOT_COLUMNS, records)
    }

    pub fn records(&self) -> &[ShotRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ShotRecord> {
        self.records
    }

    pub fn records_mut(&mut self) -> &mut [ShotRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn add_column(&mut self, name: &str) {
        self.columns.insert(name.to_string());
    }

    /// Same columns, different rows.
    pub fn with_records(&self, records: Vec<ShotRecord>) -> Self {
        ShotTable {
            columns: self.columns.clone(),
            records,
        }
    }

    /// Fail with a [`SchemaError`] naming every absent column.
    pub fn require_columns(&self, table: &'static str, required: &[&str]) -> Result<(), SchemaError> {
        require_columns(&self.columns, table, required)
    }

    /// Stack tables in order. The result carries the union of columns.
    pub fn concat(tables: impl IntoIterator<Item = ShotTable>) -> ShotTable {
        let mut out = ShotTable::default();
        for table in tables {
            out.columns.extend(table.columns);
            out.records.extend(table.records);
        }
        out
    }
}

fn require_columns(
    present: &BTreeSet<String>,
    table: &'static str,
    required: &[&str],
) -> Result<(), SchemaError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !present.contains(**c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { table, missing })
    }
}

fn header_set(reader: &mut csv::Reader<impl Read>) -> Result<BTreeSet<String>, csv::Error> {
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

/// Read a shot table from CSV. Malformed rows are skipped with a warning.
pub fn read_shot_table<R: Read>(rdr: R) -> Result<ShotTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);
    let present = header_set(&mut reader)?;
    let has_location = present.contains(columns::LOC_X) && present.contains(columns::LOC_Y);

    let mut records = Vec::new();
    for (line, result) in reader.deserialize::<RawShotRow>().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed shot row {}: {}", line + 1, e);
                continue;
            }
        };

        let (loc_x, loc_y) = match (raw.loc_x, raw.loc_y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
            _ if has_location => {
                warn!("skipping shot row {}: missing or non-finite LOC_X/LOC_Y", line + 1);
                continue;
            }
            _ => (0.0, 0.0),
        };

        records.push(ShotRecord {
            loc_x,
            loc_y,
            made: raw.shot_made_flag.is_some_and(|f| f != 0),
            period: raw.period,
            team_id: raw.team_id,
            home_team: non_empty(raw.htm),
            visitor_team: non_empty(raw.vtm),
            action_type: non_empty(raw.action_type),
            shot_distance: raw.shot_distance.filter(|d| d.is_finite()),
            zone_basic: raw.shot_zone_basic.unwrap_or_default().trim().to_string(),
            zone_area: raw.shot_zone_area.unwrap_or_default().trim().to_string(),
            game_id: non_empty(raw.game_id),
            venue: non_empty(raw.venue).map(|v| Venue::from_label(&v)),
            opponent: non_empty(raw.opponent),
            season: non_empty(raw.season),
        });
    }

    debug!("read {} shot rows ({} columns)", records.len(), present.len());
    Ok(ShotTable {
        columns: present,
        records,
    })
}

/// Load a shot table from a CSV file.
pub fn load_shot_table(path: &Path) -> Result<ShotTable, RecordError> {
    let file = std::fs::File::open(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_shot_table(file).map_err(|e| RecordError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// League tables
// ---------------------------------------------------------------------------

/// Pre-aggregated makes and attempts for one zone row.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRow {
    pub zone_basic: String,
    pub zone_area: String,
    pub makes: f64,
    pub attempts: f64,
}

/// A pre-computed percentage, optionally with the attempts behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentageRow {
    pub zone_basic: String,
    pub zone_area: String,
    pub percentage: f64,
    pub attempts: Option<f64>,
}

/// One league shot with its result.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagRow {
    pub zone_basic: String,
    pub zone_area: String,
    pub made: bool,
}

/// League reference data, resolved to a single shape at load time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LeagueTable {
    /// `FGM` + `FGA` columns.
    Aggregated(Vec<CountRow>),
    /// `FG_PCT` column. `weighted` is true when `FGA` was present too.
    Percentage { rows: Vec<PercentageRow>, weighted: bool },
    /// `SHOT_MADE_FLAG` column, one row per shot.
    PerShot(Vec<FlagRow>),
    /// No rows, or no column combination we know how to read.
    #[default]
    Unresolved,
}

/// Which league shape a set of columns supports, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueShape {
    Aggregated,
    Percentage { weighted: bool },
    PerShot,
    Unresolved,
}

impl LeagueShape {
    pub fn from_columns(present: &BTreeSet<String>) -> LeagueShape {
        let has = |c: &str| present.contains(c);
        if has(columns::FGM) && has(columns::FGA) {
            LeagueShape::Aggregated
        } else if has(columns::FG_PCT) {
            LeagueShape::Percentage {
                weighted: has(columns::FGA),
            }
        } else if has(columns::SHOT_MADE_FLAG) {
            LeagueShape::PerShot
        } else {
            LeagueShape::Unresolved
        }
    }
}

impl LeagueTable {
    pub fn shape(&self) -> LeagueShape {
        match self {
            LeagueTable::Aggregated(_) => LeagueShape::Aggregated,
            LeagueTable::Percentage { weighted, .. } => LeagueShape::Percentage {
                weighted: *weighted,
            },
            LeagueTable::PerShot(_) => LeagueShape::PerShot,
            LeagueTable::Unresolved => LeagueShape::Unresolved,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LeagueTable::Aggregated(rows) => rows.len(),
            LeagueTable::Percentage { rows, .. } => rows.len(),
            LeagueTable::PerShot(rows) => rows.len(),
            LeagueTable::Unresolved => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stack per-season league tables. Empty tables are ignored; a table
    /// whose shape differs from the first non-empty one is dropped with a
    /// warning since the two cannot be pooled.
    pub fn concat(tables: impl IntoIterator<Item = LeagueTable>) -> LeagueTable {
        let mut out = LeagueTable::Unresolved;
        for table in tables {
            if table.is_empty() {
                continue;
            }
            out = match (out, table) {
                (LeagueTable::Unresolved, t) => t,
                (LeagueTable::Aggregated(mut a), LeagueTable::Aggregated(b)) => {
                    a.extend(b);
                    LeagueTable::Aggregated(a)
                }
                (
                    LeagueTable::Percentage { rows: mut a, weighted: wa },
                    LeagueTable::Percentage { rows: b, weighted: wb },
                ) => {
                    a.extend(b);
                    LeagueTable::Percentage {
                        rows: a,
                        weighted: wa && wb,
                    }
                }
                (LeagueTable::PerShot(mut a), LeagueTable::PerShot(b)) => {
                    a.extend(b);
                    LeagueTable::PerShot(a)
                }
                (kept, dropped) => {
                    warn!(
                        "dropping {} league rows: shape {:?} does not match {:?}",
                        dropped.len(),
                        dropped.shape(),
                        kept.shape()
                    );
                    kept
                }
            };
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct RawLeagueRow {
    #[serde(rename = "SHOT_ZONE_BASIC", default)]
    shot_zone_basic: Option<String>,
    #[serde(rename = "SHOT_ZONE_AREA", default)]
    shot_zone_area: Option<String>,
    #[serde(rename = "FGM", default, deserialize_with = "csv::invalid_option")]
    fgm: Option<f64>,
    #[serde(rename = "FGA", default, deserialize_with = "csv::invalid_option")]
    fga: Option<f64>,
    #[serde(rename = "FG_PCT", default, deserialize_with = "csv::invalid_option")]
    fg_pct: Option<f64>,
    #[serde(rename = "SHOT_MADE_FLAG", default, deserialize_with = "csv::invalid_option")]
    shot_made_flag: Option<u8>,
}

/// Read a league table from CSV, resolving its shape from the header row.
///
/// A file with no data rows is [`LeagueTable::Unresolved`]. A file with rows
/// but without the zone label columns is a [`SchemaError`]. Rows missing a
/// value the resolved shape needs are skipped with a warning.
pub fn read_league_table<R: Read>(rdr: R) -> Result<LeagueTable, RecordError> {
    let csv_err = |e| RecordError::Csv {
        path: "<league>".into(),
        source: e,
    };
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);
    let present = header_set(&mut reader).map_err(csv_err)?;

    let mut raw_rows = Vec::new();
    for (line, result) in reader.deserialize::<RawLeagueRow>().enumerate() {
        match result {
            Ok(raw) => raw_rows.push(raw),
            Err(e) => warn!("skipping malformed league row {}: {}", line + 1, e),
        }
    }

    if raw_rows.is_empty() {
        return Ok(LeagueTable::Unresolved);
    }
    require_columns(&present, "league", &columns::ZONE_LABELS)?;

    let shape = LeagueShape::from_columns(&present);
    let labels = |raw: &RawLeagueRow| {
        (
            raw.shot_zone_basic.clone().unwrap_or_default().trim().to_string(),
            raw.shot_zone_area.clone().unwrap_or_default().trim().to_string(),
        )
    };

    let table = match shape {
        LeagueShape::Aggregated => LeagueTable::Aggregated(
            raw_rows
                .iter()
                .filter_map(|raw| match (raw.fgm, raw.fga) {
                    (Some(makes), Some(attempts)) if makes.is_finite() && attempts.is_finite() => {
                        let (zone_basic, zone_area) = labels(raw);
                        Some(CountRow {
                            zone_basic,
                            zone_area,
                            makes,
                            attempts,
                        })
                    }
                    _ => {
                        warn!("skipping league row without finite FGM/FGA");
                        None
                    }
                })
                .collect(),
        ),
        LeagueShape::Percentage { weighted } => LeagueTable::Percentage {
            rows: raw_rows
                .iter()
                .filter_map(|raw| match raw.fg_pct {
                    Some(pct) if pct.is_finite() => {
                        let (zone_basic, zone_area) = labels(raw);
                        Some(PercentageRow {
                            zone_basic,
                            zone_area,
                            percentage: pct,
                            attempts: raw.fga.filter(|a| a.is_finite()),
                        })
                    }
                    _ => {
                        warn!("skipping league row without finite FG_PCT");
                        None
                    }
                })
                .collect(),
            weighted,
        },
        LeagueShape::PerShot => LeagueTable::PerShot(
            raw_rows
                .iter()
                .map(|raw| {
                    let (zone_basic, zone_area) = labels(raw);
                    FlagRow {
                        zone_basic,
                        zone_area,
                        made: raw.shot_made_flag.is_some_and(|f| f != 0),
                    }
                })
                .collect(),
        ),
        LeagueShape::Unresolved => {
            warn!(
                "league table has {} rows but no FGM/FGA, FG_PCT or SHOT_MADE_FLAG column",
                raw_rows.len()
            );
            LeagueTable::Unresolved
        }
    };

    debug!("read {} league rows as {:?}", table.len(), table.shape());
    Ok(table)
}

/// Load a league table from a CSV file.
pub fn load_league_table(path: &Path) -> Result<LeagueTable, RecordError> {
    let file = std::fs::File::open(path).map_err(|e| RecordError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    read_league_table(file).map_err(|e| match e {
        RecordError::Csv { source, .. } => RecordError::Csv {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
