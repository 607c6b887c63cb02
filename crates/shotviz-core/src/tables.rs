// Zone-level field-goal tables for a player and for the league.
//
// Both tables are keyed by `ZoneKey` parsed from the provider's own per-shot
// labels; nothing here runs the geometric classifier.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::records::{columns, LeagueTable, SchemaError, ShotTable};
use crate::zones::ZoneKey;

// ---------------------------------------------------------------------------
// Ratios
// ---------------------------------------------------------------------------

/// `numer / denom`, or 0.0 when the denominator is not positive.
pub fn safe_ratio(numer: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        numer / denom
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Player table
// ---------------------------------------------------------------------------

/// Attempts and makes for one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneStat {
    pub attempts: u64,
    pub makes: u64,
}

impl ZoneStat {
    pub fn new(attempts: u64, makes: u64) -> Self {
        ZoneStat { attempts, makes }
    }

    /// Field-goal percentage in [0, 1]; 0.0 for a zone with no attempts.
    pub fn percentage(&self) -> f64 {
        safe_ratio(self.makes as f64, self.attempts as f64)
    }

    fn merge(&mut self, other: ZoneStat) {
        self.attempts += other.attempts;
        self.makes += other.makes;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneTable {
    stats: BTreeMap<ZoneKey, ZoneStat>,
}

impl ZoneTable {
    pub fn get(&self, key: &ZoneKey) -> Option<&ZoneStat> {
        self.stats.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZoneKey, &ZoneStat)> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn total_attempts(&self) -> u64 {
        self.stats.values().map(|s| s.attempts).sum()
    }

    /// Add one attempt to `key`.
    pub fn record(&mut self, key: ZoneKey, made: bool) {
        self.add(key, ZoneStat::new(1, u64::from(made)));
    }

    pub fn add(&mut self, key: ZoneKey, stat: ZoneStat) {
        self.stats.entry(key).or_default().merge(stat);
    }

    /// Drop backcourt rows, which have no place on a half-court display.
    pub fn without_backcourt(&self) -> ZoneTable {
        ZoneTable {
            stats: self
                .stats
                .iter()
                .filter(|(key, _)| !key.is_backcourt())
                .map(|(key, stat)| (*key, *stat))
                .collect(),
        }
    }

    /// Rewrite every key through the above-the-break collapse and re-sum.
    pub fn collapse_above_break(&self) -> ZoneTable {
        let mut out = ZoneTable::default();
        for (key, stat) in &self.stats {
            out.add(key.collapsed(), *stat);
        }
        out
    }
}

impl FromIterator<(ZoneKey, ZoneStat)> for ZoneTable {
    fn from_iter<T: IntoIterator<Item = (ZoneKey, ZoneStat)>>(iter: T) -> Self {
        let mut out = ZoneTable::default();
        for (key, stat) in iter {
            out.add(key, stat);
        }
        out
    }
}

/// Aggregate a player's shots by their source zone labels.
///
/// Requires the zone label columns. A table without `SHOT_MADE_FLAG` counts
/// every attempt as a miss. Shots whose labels are not part of the zone
/// vocabulary are skipped.
pub fn player_zone_table(shots: &ShotTable) -> Result<ZoneTable, SchemaError> {
    shots.require_columns("player", &columns::ZONE_LABELS)?;
    let has_flag = shots.has_column(columns::SHOT_MADE_FLAG);

    let mut table = ZoneTable::default();
    let mut unrecognized = 0usize;
    for shot in shots.records() {
        match ZoneKey::from_labels(&shot.zone_basic, &shot.zone_area) {
            Some(key) => table.record(key, has_flag && shot.made),
            None => unrecognized += 1,
        }
    }

    if unrecognized > 0 {
        warn!("{} player shots had unrecognized zone labels", unrecognized);
    }
    debug!(
        "player zone table: {} zones from {} shots",
        table.len(),
        shots.len()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// League table
// ---------------------------------------------------------------------------

/// League percentage for one zone, plus attempts when the source had them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeagueZoneStat {
    pub percentage: f64,
    pub attempts: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueZoneTable {
    stats: BTreeMap<ZoneKey, LeagueZoneStat>,
}

impl LeagueZoneTable {
    pub fn get(&self, key: &ZoneKey) -> Option<&LeagueZoneStat> {
        self.stats.get(key)
    }

    pub fn percentage(&self, key: &ZoneKey) -> Option<f64> {
        self.stats.get(key).map(|s| s.percentage)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZoneKey, &LeagueZoneStat)> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn insert(&mut self, key: ZoneKey, stat: LeagueZoneStat) {
        self.stats.insert(key, stat);
    }

    pub fn without_backcourt(&self) -> LeagueZoneTable {
        LeagueZoneTable {
            stats: self
                .stats
                .iter()
                .filter(|(key, _)| !key.is_backcourt())
                .map(|(key, stat)| (*key, *stat))
                .collect(),
        }
    }

    /// Rewrite keys through the above-the-break collapse and re-aggregate.
    ///
    /// Merged rows are averaged by attempts when every one of them carries
    /// an attempt count, otherwise by a plain mean.
    pub fn collapse_above_break(&self) -> LeagueZoneTable {
        let mut groups: BTreeMap<ZoneKey, Vec<LeagueZoneStat>> = BTreeMap::new();
        for (key, stat) in &self.stats {
            groups.entry(key.collapsed()).or_default().push(*stat);
        }
        LeagueZoneTable {
            stats: groups
                .into_iter()
                .map(|(key, group)| (key, pool_percentages(&group)))
                .collect(),
        }
    }
}

/// Pool several league percentages into one.
fn pool_percentages(group: &[LeagueZoneStat]) -> LeagueZoneStat {
    let weights: Option<Vec<f64>> = group.iter().map(|s| s.attempts).collect();
    match weights {
        Some(weights) => {
            let total: f64 = weights.iter().sum();
            let weighted: f64 = group
                .iter()
                .zip(&weights)
                .map(|(s, w)| s.percentage * w)
                .sum();
            LeagueZoneStat {
                percentage: weighted / total.max(1.0),
                attempts: Some(total),
            }
        }
        None => LeagueZoneStat {
            percentage: mean(group.iter().map(|s| s.percentage)),
            attempts: None,
        },
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    safe_ratio(sum, n as f64)
}

/// Parse a label pair, counting failures.
fn parse_key(basic: &str, area: &str, unrecognized: &mut usize) -> Option<ZoneKey> {
    let key = ZoneKey::from_labels(basic, area);
    if key.is_none() {
        *unrecognized += 1;
    }
    key
}

/// Aggregate league reference rows into one percentage per zone.
///
/// An unresolved or empty league table yields an empty result and a warning;
/// downstream differentials then fall back to zero instead of failing.
pub fn league_zone_table(league: &LeagueTable) -> LeagueZoneTable {
    let mut unrecognized = 0usize;
    let mut out = LeagueZoneTable::default();

    match league {
        LeagueTable::Aggregated(rows) => {
            let mut sums: BTreeMap<ZoneKey, (f64, f64)> = BTreeMap::new();
            for row in rows {
                if let Some(key) = parse_key(&row.zone_basic, &row.zone_area, &mut unrecognized) {
                    let entry = sums.entry(key).or_default();
                    entry.0 += row.makes;
                    entry.1 += row.attempts;
                }
            }
            for (key, (makes, attempts)) in sums {
                out.insert(
                    key,
                    LeagueZoneStat {
                        percentage: safe_ratio(makes, attempts),
                        attempts: Some(attempts),
                    },
                );
            }
        }
        LeagueTable::Percentage { rows, weighted } => {
            let mut groups: BTreeMap<ZoneKey, Vec<LeagueZoneStat>> = BTreeMap::new();
            for row in rows {
                if let Some(key) = parse_key(&row.zone_basic, &row.zone_area, &mut unrecognized) {
                    let attempts = if *weighted {
                        Some(row.attempts.unwrap_or(0.0))
                    } else {
                        None
                    };
                    groups.entry(key).or_default().push(LeagueZoneStat {
                        percentage: row.percentage,
                        attempts,
                    });
                }
            }
            for (key, group) in groups {
                out.insert(key, pool_percentages(&group));
            }
        }
        LeagueTable::PerShot(rows) => {
            let mut counts = ZoneTable::default();
            for row in rows {
                if let Some(key) = parse_key(&row.zone_basic, &row.zone_area, &mut unrecognized) {
                    counts.record(key, row.made);
                }
            }
            for (key, stat) in counts.iter() {
                out.insert(
                    *key,
                    LeagueZoneStat {
                        percentage: stat.percentage(),
                        attempts: Some(stat.attempts as f64),
                    },
                );
            }
        }
        LeagueTable::Unresolved => {
            warn!("league averages are empty or unreadable; zone differentials default to zero");
        }
    }

    if unrecognized > 0 {
        warn!("{} league rows had unrecognized zone labels", unrecognized);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{CountRow, FlagRow, PercentageRow, ShotRecord};
    use crate::zones::{AreaLane, BasicZone};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn shots(specs: &[(&str, &str, usize, usize)]) -> ShotTable {
        let mut records = Vec::new();
        for (basic, area, attempts, makes) in specs {
            for i in 0..*attempts {
                records.push(ShotRecord::in_zone(basic, area, i < *makes));
            }
        }
        ShotTable::from_records(records)
    }

    fn key(basic: BasicZone, area: AreaLane) -> ZoneKey {
        ZoneKey::new(basic, area)
    }

    // -- safe_ratio --

    #[test]
    fn safe_ratio_zero_denominator_is_zero() {
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(5.0, 0.0), 0.0);
        assert_eq!(safe_ratio(5.0, -1.0), 0.0);
    }

    #[test]
    fn safe_ratio_divides_otherwise() {
        for a in 1..20u32 {
            for m in 0..=a {
                let r = safe_ratio(f64::from(m), f64::from(a));
                assert!(approx_eq(r, f64::from(m) / f64::from(a), 1e-15));
                assert!((0.0..=1.0).contains(&r));
            }
        }
    }

    // -- Player table --

    #[test]
    fn player_table_counts_attempts_and_makes() {
        let table = player_zone_table(&shots(&[("Restricted Area", "Center(C)", 10, 7)])).unwrap();
        let stat = table.get(&key(BasicZone::RestrictedArea, AreaLane::Center)).unwrap();
        assert_eq!(stat.attempts, 10);
        assert_eq!(stat.makes, 7);
        assert!(approx_eq(stat.percentage(), 0.7, 1e-12));
    }

    #[test]
    fn player_table_requires_zone_labels() {
        let table = ShotTable::new(["LOC_X", "LOC_Y", "SHOT_MADE_FLAG"], vec![]);
        let err = player_zone_table(&table).unwrap_err();
        assert_eq!(err.missing, vec!["SHOT_ZONE_BASIC", "SHOT_ZONE_AREA"]);
    }

    #[test]
    fn player_table_without_flag_column_counts_misses() {
        let table = ShotTable::new(
            ["SHOT_ZONE_BASIC", "SHOT_ZONE_AREA"],
            vec![ShotRecord::in_zone("Mid-Range", "Center(C)", true)],
        );
        let zones = player_zone_table(&table).unwrap();
        let stat = zones.get(&key(BasicZone::MidRange, AreaLane::Center)).unwrap();
        assert_eq!((stat.attempts, stat.makes), (1, 0));
    }

    #[test]
    fn player_table_skips_unknown_labels() {
        let table = player_zone_table(&shots(&[
            ("Mid-Range", "Center(C)", 2, 1),
            ("Somewhere", "Center(C)", 3, 3),
        ]))
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.total_attempts(), 2);
    }

    #[test]
    fn collapse_merges_above_the_break_side_lanes() {
        let table = player_zone_table(&shots(&[
            ("Above the Break 3", "Left Side(L)", 4, 1),
            ("Above the Break 3", "Left Side Center(LC)", 6, 3),
            ("Mid-Range", "Left Side Center(LC)", 5, 2),
        ]))
        .unwrap()
        .collapse_above_break();

        let left = table.get(&key(BasicZone::AboveBreak3, AreaLane::Left)).unwrap();
        assert_eq!(left.attempts, 10);
        assert_eq!(left.makes, 4);
        assert!(approx_eq(left.percentage(), 0.4, 1e-12));
        assert!(table.get(&key(BasicZone::AboveBreak3, AreaLane::LeftCenter)).is_none());
        // Mid-range keeps its five lanes.
        assert!(table.get(&key(BasicZone::MidRange, AreaLane::LeftCenter)).is_some());
    }

    #[test]
    fn collapse_is_idempotent_on_tables() {
        let table = player_zone_table(&shots(&[
            ("Above the Break 3", "Right Side Center(RC)", 3, 1),
            ("Above the Break 3", "Right Side(R)", 2, 2),
            ("Above the Break 3", "Center(C)", 4, 1),
        ]))
        .unwrap();
        let once = table.collapse_above_break();
        assert_eq!(once.collapse_above_break(), once);
    }

    #[test]
    fn backcourt_rows_are_dropped() {
        let table = player_zone_table(&shots(&[
            ("Backcourt", "Back Court(BC)", 2, 0),
            ("Above the Break 3", "Back Court(BC)", 1, 0),
            ("Mid-Range", "Center(C)", 1, 1),
        ]))
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.without_backcourt().len(), 1);
    }

    // -- League table --

    fn count_row(basic: &str, area: &str, makes: f64, attempts: f64) -> CountRow {
        CountRow {
            zone_basic: basic.into(),
            zone_area: area.into(),
            makes,
            attempts,
        }
    }

    fn pct_row(basic: &str, area: &str, pct: f64, attempts: Option<f64>) -> PercentageRow {
        PercentageRow {
            zone_basic: basic.into(),
            zone_area: area.into(),
            percentage: pct,
            attempts,
        }
    }

    #[test]
    fn league_counts_are_summed_before_dividing() {
        let league = LeagueTable::Aggregated(vec![
            count_row("Mid-Range", "Center(C)", 30.0, 100.0),
            count_row("Mid-Range", "Center(C)", 50.0, 100.0),
        ]);
        let table = league_zone_table(&league);
        let stat = table.get(&key(BasicZone::MidRange, AreaLane::Center)).unwrap();
        assert!(approx_eq(stat.percentage, 0.4, 1e-12));
        assert_eq!(stat.attempts, Some(200.0));
    }

    #[test]
    fn league_percentages_weighted_by_attempts() {
        let league = LeagueTable::Percentage {
            rows: vec![
                pct_row("Mid-Range", "Center(C)", 0.5, Some(30.0)),
                pct_row("Mid-Range", "Center(C)", 0.3, Some(10.0)),
            ],
            weighted: true,
        };
        let pct = league_zone_table(&league)
            .percentage(&key(BasicZone::MidRange, AreaLane::Center))
            .unwrap();
        assert!(approx_eq(pct, 0.45, 1e-12));
    }

    #[test]
    fn league_weighted_mean_guards_zero_attempts() {
        let league = LeagueTable::Percentage {
            rows: vec![pct_row("Mid-Range", "Center(C)", 0.5, Some(0.0))],
            weighted: true,
        };
        let pct = league_zone_table(&league)
            .percentage(&key(BasicZone::MidRange, AreaLane::Center))
            .unwrap();
        assert_eq!(pct, 0.0);
        assert!(pct.is_finite());
    }

    #[test]
    fn league_percentages_plain_mean_without_attempts() {
        let league = LeagueTable::Percentage {
            rows: vec![
                pct_row("Mid-Range", "Center(C)", 0.5, None),
                pct_row("Mid-Range", "Center(C)", 0.3, None),
            ],
            weighted: false,
        };
        let stat = *league_zone_table(&league)
            .get(&key(BasicZone::MidRange, AreaLane::Center))
            .unwrap();
        assert!(approx_eq(stat.percentage, 0.4, 1e-12));
        assert_eq!(stat.attempts, None);
    }

    #[test]
    fn league_per_shot_rows() {
        let flag = |made| FlagRow {
            zone_basic: "Restricted Area".into(),
            zone_area: "Center(C)".into(),
            made,
        };
        let league = LeagueTable::PerShot(vec![flag(true), flag(false), flag(true), flag(true)]);
        let pct = league_zone_table(&league)
            .percentage(&key(BasicZone::RestrictedArea, AreaLane::Center))
            .unwrap();
        assert!(approx_eq(pct, 0.75, 1e-12));
    }

    #[test]
    fn unresolved_league_is_empty() {
        assert!(league_zone_table(&LeagueTable::Unresolved).is_empty());
    }

    #[test]
    fn league_collapse_weights_by_attempts_when_known() {
        let league = LeagueTable::Aggregated(vec![
            count_row("Above the Break 3", "Left Side(L)", 10.0, 40.0),
            count_row("Above the Break 3", "Left Side Center(LC)", 30.0, 60.0),
        ]);
        let table = league_zone_table(&league).collapse_above_break();
        let stat = table.get(&key(BasicZone::AboveBreak3, AreaLane::Left)).unwrap();
        // (0.25 * 40 + 0.5 * 60) / 100
        assert!(approx_eq(stat.percentage, 0.40, 1e-12));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn league_collapse_plain_mean_without_attempts() {
        let league = LeagueTable::Percentage {
            rows: vec![
                pct_row("Above the Break 3", "Right Side(R)", 0.30, None),
                pct_row("Above the Break 3", "Right Side Center(RC)", 0.40, None),
            ],
            weighted: false,
        };
        let table = league_zone_table(&league).collapse_above_break();
        let pct = table.percentage(&key(BasicZone::AboveBreak3, AreaLane::Right)).unwrap();
        assert!(approx_eq(pct, 0.35, 1e-12));
        assert_eq!(table.collapse_above_break(), table);
    }
}
