// Library root: re-exports all modules so integration tests and the binary
// share the crate's public API.

pub mod arcs;
pub mod config;
pub mod court;
pub mod filters;
pub mod scene;
pub mod seasons;
pub mod source;
pub mod teams;
