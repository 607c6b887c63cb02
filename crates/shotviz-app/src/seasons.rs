// NBA season identifiers ("2016-17") and season ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// First month of a new season; games before it belong to the previous one.
const SEASON_START_MONTH: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeasonError {
    #[error("invalid season `{0}`: expected the form 2016-17")]
    Malformed(String),

    #[error("invalid season `{text}`: second year should be {expected:02}")]
    YearMismatch { text: String, expected: i32 },
}

/// A season, identified by the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Season { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn next(&self) -> Season {
        Season::new(self.start_year + 1)
    }

    /// The season in progress (or most recently finished) on `date`.
    pub fn containing(date: NaiveDate) -> Season {
        if date.month() >= SEASON_START_MONTH {
            Season::new(date.year())
        } else {
            Season::new(date.year() - 1)
        }
    }

    /// The season for today's local date.
    pub fn latest() -> Season {
        Season::containing(chrono::Local::now().date_naive())
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, (self.start_year + 1).rem_euclid(100))
    }
}

impl FromStr for Season {
    type Err = SeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let malformed = || SeasonError::Malformed(text.to_string());

        let (start, end) = text.split_once('-').ok_or_else(malformed)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(malformed());
        }
        let start_year: i32 = start.parse().map_err(|_| malformed())?;
        let end_suffix: i32 = end.parse().map_err(|_| malformed())?;

        let expected = (start_year + 1).rem_euclid(100);
        if end_suffix != expected {
            return Err(SeasonError::YearMismatch {
                text: text.to_string(),
                expected,
            });
        }
        Ok(Season::new(start_year))
    }
}

impl TryFrom<String> for Season {
    type Error = SeasonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

/// Seasons starting in `start..end` (end exclusive).
pub fn available_seasons(start: i32, end: i32) -> Vec<Season> {
    (start..end).map(Season::new).collect()
}

/// Every season from `a` to `b` inclusive. Reversed bounds are swapped.
pub fn season_range(a: Season, b: Season) -> Vec<Season> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo.start_year..=hi.start_year).map(Season::new).collect()
}
