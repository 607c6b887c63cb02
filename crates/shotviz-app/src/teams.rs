// Static NBA franchise table and the venue/opponent columns derived from it.

use shotviz_core::records::{columns, ShotTable, Venue};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub abbreviation: &'static str,
    pub full_name: &'static str,
}

const fn team(id: u64, abbreviation: &'static str, full_name: &'static str) -> Team {
    Team {
        id,
        abbreviation,
        full_name,
    }
}

/// The thirty current franchises, keyed by the stats provider's team ids.
pub const TEAMS: [Team; 30] = [
    team(1610612737, "ATL", "Atlanta Hawks"),
    team(1610612738, "BOS", "Boston Celtics"),
    team(1610612739, "CLE", "Cleveland Cavaliers"),
    team(1610612740, "NOP", "New Orleans Pelicans"),
    team(1610612741, "CHI", "Chicago Bulls"),
    team(1610612742, "DAL", "Dallas Mavericks"),
    team(1610612743, "DEN", "Denver Nuggets"),
    team(1610612744, "GSW", "Golden State Warriors"),
    team(1610612745, "HOU", "Houston Rockets"),
    team(1610612746, "LAC", "LA Clippers"),
    team(1610612747, "LAL", "Los Angeles Lakers"),
    team(1610612748, "MIA", "Miami Heat"),
    team(1610612749, "MIL", "Milwaukee Bucks"),
    team(1610612750, "MIN", "Minnesota Timberwolves"),
    team(1610612751, "BKN", "Brooklyn Nets"),
    team(1610612752, "NYK", "New York Knicks"),
    team(1610612753, "ORL", "Orlando Magic"),
    team(1610612754, "IND", "Indiana Pacers"),
    team(1610612755, "PHI", "Philadelphia 76ers"),
    team(1610612756, "PHX", "Phoenix Suns"),
    team(1610612757, "POR", "Portland Trail Blazers"),
    team(1610612758, "SAC", "Sacramento Kings"),
    team(1610612759, "SAS", "San Antonio Spurs"),
    team(1610612760, "OKC", "Oklahoma City Thunder"),
    team(1610612761, "TOR", "Toronto Raptors"),
    team(1610612762, "UTA", "Utah Jazz"),
    team(1610612763, "MEM", "Memphis Grizzlies"),
    team(1610612764, "WAS", "Washington Wizards"),
    team(1610612765, "DET", "Detroit Pistons"),
    team(1610612766, "CHA", "Charlotte Hornets"),
];

pub fn team_by_id(id: u64) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.id == id)
}

pub fn team_by_abbreviation(abbreviation: &str) -> Option<&'static Team> {
    TEAMS.iter().find(|t| t.abbreviation == abbreviation)
}

/// Fill `venue` and `opponent` on every shot.
///
/// The shooter's team is Home when its abbreviation matches `HTM` and Away
/// when it matches `VTM`; anything else (including an unknown team id) is
/// Unknown with no opponent. Tables without the team columns are left as-is.
pub fn attach_venue_and_opponent(table: &mut ShotTable) {
    if table.is_empty() {
        return;
    }
    let needed = [columns::TEAM_ID, columns::HTM, columns::VTM];
    if let Err(e) = table.require_columns("shot", &needed) {
        debug!("not deriving venue/opponent: {}", e);
        return;
    }

    for shot in table.records_mut() {
        let own = shot.team_id.and_then(team_by_id).map(|t| t.abbreviation);
        let home = shot.home_team.as_deref();
        let visitor = shot.visitor_team.as_deref();

        let (venue, opponent_abbr) = match own {
            Some(abbr) if Some(abbr) == home => (Venue::Home, visitor),
            Some(abbr) if Some(abbr) == visitor => (Venue::Away, home),
            _ => (Venue::Unknown, None),
        };

        shot.venue = Some(venue);
        shot.opponent = opponent_abbr
            .and_then(team_by_abbreviation)
            .map(|t| t.full_name.to_string());
    }

    table.add_column(columns::VENUE);
    table.add_column(columns::OPPONENT);
}
