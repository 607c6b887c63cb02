// Library root for the shot-zone engine: court geometry, zone classification,
// zone aggregation, the player-vs-league differential grid, and the helpers
// that turn those into render-ready data.

pub mod boundary;
pub mod geometry;
pub mod grid;
pub mod records;
pub mod tables;
pub mod transform;
pub mod zones;
