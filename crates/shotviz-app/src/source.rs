// Where shot tables come from.
//
// `ShotSource` is the seam to the stats provider. The shipped implementation
// reads provider exports laid out on disk as
// `<data_dir>/<player-slug>/<season>/{shots.csv,league.csv}`.

use std::path::{Path, PathBuf};

use shotviz_core::records::{
    columns, load_league_table, load_shot_table, LeagueTable, RecordError, ShotTable,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::seasons::Season;
use crate::teams::attach_venue_and_opponent;

pub const SHOTS_FILE: &str = "shots.csv";
pub const LEAGUE_FILE: &str = "league.csv";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no shot data for player `{player}` (looked in {dir})")]
    PlayerNotFound { player: String, dir: PathBuf },

    #[error("failed to list {dir}: {source}")]
    Io {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// A provider of one player's shots and the league reference for a season.
pub trait ShotSource {
    fn load(&self, player: &str, season: Season) -> Result<(ShotTable, LeagueTable), SourceError>;
}

/// Directory name for a player: lowercase, with every run of
/// non-alphanumeric characters replaced by one `_`.
pub fn player_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

// ---------------------------------------------------------------------------
// CSV directory source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvShotSource {
    data_dir: PathBuf,
}

impl CsvShotSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        CsvShotSource {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn player_dir(&self, player: &str) -> PathBuf {
        self.data_dir.join(player_slug(player))
    }

    /// Player directory names under the data directory, sorted.
    pub fn players(&self) -> Result<Vec<String>, SourceError> {
        let io_err = |source| SourceError::Io {
            dir: self.data_dir.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ShotSource for CsvShotSource {
    /// A missing season directory or league file yields empty tables rather
    /// than an error; only a missing player directory fails.
    fn load(&self, player: &str, season: Season) -> Result<(ShotTable, LeagueTable), SourceError> {
        let player_dir = self.player_dir(player);
        if !player_dir.is_dir() {
            return Err(SourceError::PlayerNotFound {
                player: player.to_string(),
                dir: player_dir,
            });
        }

        let season_dir = player_dir.join(season.to_string());
        let shots_path = season_dir.join(SHOTS_FILE);
        let mut shots = if shots_path.is_file() {
            load_shot_table(&shots_path)?
        } else {
            warn!("no shot file for {} {} at {}", player, season, shots_path.display());
            ShotTable::default()
        };
        attach_venue_and_opponent(&mut shots);

        let league_path = season_dir.join(LEAGUE_FILE);
        let league = if league_path.is_file() {
            load_league_table(&league_path)?
        } else {
            warn!("no league file for {} at {}", season, league_path.display());
            LeagueTable::Unresolved
        };

        info!(
            "loaded {} shots and {} league rows for {} {}",
            shots.len(),
            league.len(),
            player,
            season
        );
        Ok((shots, league))
    }
}

// ---------------------------------------------------------------------------
// Multi-season loading
// ---------------------------------------------------------------------------

/// Load several seasons and stack them in order.
///
/// Every shot is tagged with its season. Seasons with no shots contribute
/// nothing; league tables are pooled the same way.
pub fn load_multi<S: ShotSource + ?Sized>(
    source: &S,
    player: &str,
    seasons: &[Season],
) -> Result<(ShotTable, LeagueTable), SourceError> {
    let mut shot_tables = Vec::with_capacity(seasons.len());
    let mut league_tables = Vec::with_capacity(seasons.len());

    for season in seasons {
        let (mut shots, league) = source.load(player, *season)?;
        if !shots.is_empty() {
            let label = season.to_string();
            for shot in shots.records_mut() {
                shot.season = Some(label.clone());
            }
            shots.add_column(columns::SEASON);
            shot_tables.push(shots);
        }
        if !league.is_empty() {
            league_tables.push(league);
        }
    }

    Ok((ShotTable::concat(shot_tables), LeagueTable::concat(league_tables)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use shotviz_core::records::{CountRow, ShotRecord};

    #[test]
    fn slug_lowercases_and_collapses_separators() {
        assert_eq!(player_slug("Stephen Curry"), "stephen_curry");
        assert_eq!(player_slug("Shai Gilgeous-Alexander"), "shai_gilgeous_alexander");
        assert_eq!(player_slug("  D'Angelo  Russell "), "d_angelo_russell");
        assert_eq!(player_slug("Nikola Jokić"), "nikola_jokić");
    }

    /// In-memory source keyed by season.
    struct FakeSource {
        seasons: HashMap<Season, (ShotTable, LeagueTable)>,
    }

    impl ShotSource for FakeSource {
        fn load(&self, _player: &str, season: Season) -> Result<(ShotTable, LeagueTable), SourceError> {
            Ok(self.seasons.get(&season).cloned().unwrap_or_default())
        }
    }

    fn league(makes: f64) -> LeagueTable {
        LeagueTable::Aggregated(vec![CountRow {
            zone_basic: "Mid-Range".into(),
            zone_area: "Center(C)".into(),
            makes,
            attempts: 100.0,
        }])
    }

    #[test]
    fn load_multi_tags_seasons_and_skips_empty_ones() {
        let shots = |n: usize| {
            ShotTable::new(
                ["SHOT_ZONE_BASIC", "SHOT_ZONE_AREA"],
                (0..n)
                    .map(|_| ShotRecord::in_zone("Mid-Range", "Center(C)", true))
                    .collect(),
            )
        };
        let source = FakeSource {
            seasons: HashMap::from([
                (Season::new(2018), (shots(2), league(40.0))),
                (Season::new(2019), (ShotTable::default(), LeagueTable::Unresolved)),
                (Season::new(2020), (shots(3), league(45.0))),
            ]),
        };
        let seasons = [Season::new(2018), Season::new(2019), Season::new(2020)];
        let (table, league) = load_multi(&source, "Anyone", &seasons).unwrap();

        assert_eq!(table.len(), 5);
        assert!(table.has_column("SEASON"));
        let tags: Vec<_> = table.records().iter().map(|r| r.season.clone().unwrap()).collect();
        assert_eq!(tags, vec!["2018-19", "2018-19", "2020-21", "2020-21", "2020-21"]);
        assert_eq!(league.len(), 2);
    }

    #[test]
    fn load_multi_of_nothing_is_empty() {
        let source = FakeSource {
            seasons: HashMap::new(),
        };
        let (table, league) = load_multi(&source, "Anyone", &[Season::new(2020)]).unwrap();
        assert!(table.is_empty());
        assert!(league.is_empty());
    }

    #[test]
    fn missing_player_directory_is_an_error() {
        let tmp = std::env::temp_dir().join("shotviz_source_missing_player");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let source = CsvShotSource::new(&tmp);
        let err = source.load("Nobody Here", Season::new(2020)).unwrap_err();
        assert!(matches!(err, SourceError::PlayerNotFound { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
