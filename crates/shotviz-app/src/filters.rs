// Shot filters: the state a user picks and the AND-conjunction that applies it.
//
// Every filter is skipped when its column is absent from the table, so
// partial exports (no VENUE, no ACTION_TYPE, ...) still render.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shotviz_core::records::{columns, ShotRecord, ShotTable, Venue};
use tracing::debug;

/// Sentinel for "no restriction" in the opponent and action-type filters.
pub const ALL: &str = "All";

/// Overtime periods are folded into period 5.
pub const OVERTIME_PERIOD: u8 = 5;

// ---------------------------------------------------------------------------
// Filter enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResultFilter {
    #[default]
    All,
    Makes,
    Misses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VenueFilter {
    #[default]
    All,
    Home,
    Away,
}

/// Shot-distance buckets offered by the UI, in feet, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistancePreset {
    All,
    UpTo4,
    From5To10,
    From11To16,
    From17To23,
    From24To29,
    From30,
}

impl DistancePreset {
    pub const PRESETS: [DistancePreset; 7] = [
        DistancePreset::All,
        DistancePreset::UpTo4,
        DistancePreset::From5To10,
        DistancePreset::From11To16,
        DistancePreset::From17To23,
        DistancePreset::From24To29,
        DistancePreset::From30,
    ];

    pub fn range(&self) -> (f64, f64) {
        match self {
            DistancePreset::All => (0.0, 100.0),
            DistancePreset::UpTo4 => (0.0, 4.0),
            DistancePreset::From5To10 => (5.0, 10.0),
            DistancePreset::From11To16 => (11.0, 16.0),
            DistancePreset::From17To23 => (17.0, 23.0),
            DistancePreset::From24To29 => (24.0, 29.0),
            DistancePreset::From30 => (30.0, 100.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DistancePreset::All => "all",
            DistancePreset::UpTo4 => "0-4",
            DistancePreset::From5To10 => "5-10",
            DistancePreset::From11To16 => "11-16",
            DistancePreset::From17To23 => "17-23",
            DistancePreset::From24To29 => "24-29",
            DistancePreset::From30 => "30+",
        }
    }
}

impl fmt::Display for DistancePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DistancePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        DistancePreset::PRESETS
            .into_iter()
            .find(|p| p.label() == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = DistancePreset::PRESETS.iter().map(|p| p.label()).collect();
                format!("unknown distance `{s}` (expected one of: {})", labels.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    /// Periods to keep; 5 stands for any overtime. Empty keeps everything.
    pub periods: Vec<u8>,
    pub result: ResultFilter,
    pub venue: VenueFilter,
    /// Opponent full name, or `"All"`.
    pub opponent: String,
    /// Provider action type (e.g. "Jump Shot"), or `"All"`.
    pub action_type: String,
    /// Inclusive shot-distance window in feet.
    pub shot_distance: Option<(f64, f64)>,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            periods: vec![1, 2, 3, 4],
            result: ResultFilter::All,
            venue: VenueFilter::All,
            opponent: ALL.to_string(),
            action_type: ALL.to_string(),
            shot_distance: None,
        }
    }
}

impl FilterState {
    pub fn with_distance_preset(mut self, preset: DistancePreset) -> Self {
        self.shot_distance = match preset {
            DistancePreset::All => None,
            other => Some(other.range()),
        };
        self
    }

    /// Why this state cannot be applied, as `(field, message)`.
    pub fn problems(&self) -> Option<(&'static str, String)> {
        if let Some(p) = self
            .periods
            .iter()
            .find(|p| !(1..=OVERTIME_PERIOD).contains(*p))
        {
            return Some(("periods", format!("must be between 1 and 5, got {p}")));
        }
        if let Some((lo, hi)) = self.shot_distance {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Some((
                    "shot_distance",
                    format!("must be a finite [lo, hi] window with lo <= hi, got [{lo}, {hi}]"),
                ));
            }
        }
        None
    }

    fn keep(&self, shot: &ShotRecord, table: &ShotTable) -> bool {
        if !self.periods.is_empty() && table.has_column(columns::PERIOD) {
            let in_periods = shot
                .period
                .is_some_and(|p| self.periods.contains(&p.min(OVERTIME_PERIOD)));
            if !in_periods {
                return false;
            }
        }

        if table.has_column(columns::SHOT_MADE_FLAG) {
            match self.result {
                ResultFilter::Makes if !shot.made => return false,
                ResultFilter::Misses if shot.made => return false,
                _ => {}
            }
        }

        if table.has_column(columns::VENUE) {
            let wanted = match self.venue {
                VenueFilter::All => None,
                VenueFilter::Home => Some(Venue::Home),
                VenueFilter::Away => Some(Venue::Away),
            };
            if wanted.is_some() && shot.venue != wanted {
                return false;
            }
        }

        if is_restricted(&self.opponent)
            && table.has_column(columns::OPPONENT)
            && shot.opponent.as_deref() != Some(self.opponent.as_str())
        {
            return false;
        }

        if is_restricted(&self.action_type)
            && table.has_column(columns::ACTION_TYPE)
            && shot.action_type.as_deref() != Some(self.action_type.as_str())
        {
            return false;
        }

        if let Some((lo, hi)) = self.shot_distance {
            if table.has_column(columns::SHOT_DISTANCE)
                && !shot.shot_distance.is_some_and(|d| lo <= d && d <= hi)
            {
                return false;
            }
        }

        true
    }
}

fn is_restricted(value: &str) -> bool {
    !value.is_empty() && value != ALL
}

/// Apply every active filter. Row order and columns are preserved.
pub fn filter_shots(table: &ShotTable, state: &FilterState) -> ShotTable {
    let kept: Vec<ShotRecord> = table
        .records()
        .iter()
        .filter(|shot| state.keep(shot, table))
        .cloned()
        .collect();
    debug!("filters kept {} of {} shots", kept.len(), table.len());
    table.with_records(kept)
}

// ---------------------------------------------------------------------------
// Filter choices
// ---------------------------------------------------------------------------

/// Values a UI can offer for the free-text filters, each list led by `"All"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub action_types: Vec<String>,
    pub opponents: Vec<String>,
}

impl FilterOptions {
    pub fn from_table(table: &ShotTable) -> Self {
        FilterOptions {
            action_types: distinct_values(table, columns::ACTION_TYPE, |s| s.action_type.as_ref()),
            opponents: distinct_values(table, columns::OPPONENT, |s| s.opponent.as_ref()),
        }
    }
}

fn distinct_values<'a>(
    table: &'a ShotTable,
    column: &str,
    value: impl Fn(&'a ShotRecord) -> Option<&'a String>,
) -> Vec<String> {
    let mut out = vec![ALL.to_string()];
    if table.has_column(column) {
        let set: BTreeSet<&String> = table.records().iter().filter_map(value).collect();
        out.extend(set.into_iter().cloned());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
