// Configuration loading and parsing (shotviz.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use shotviz_core::geometry::CourtGeometry;

use crate::filters::FilterState;
use crate::scene::{ArcSettings, HeatmapOptions, SceneOptions};
use crate::seasons::{season_range, Season};

pub const CONFIG_FILE: &str = "shotviz.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// shotviz.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub filters: FilterState,
    #[serde(default)]
    pub heatmap: HeatmapOptions,
    #[serde(default)]
    pub arcs: ArcSettings,
    #[serde(default)]
    pub court: CourtConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Root of the `<player>/<season>/` CSV tree, relative to the working
    /// directory unless absolute.
    pub dir: PathBuf,
    pub player: String,
    #[serde(default)]
    pub seasons: SeasonBounds,
}

/// Either bound may be left out. With neither, the latest season is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SeasonBounds {
    pub min: Option<Season>,
    pub max: Option<Season>,
}

impl SeasonBounds {
    pub fn resolve(&self, latest: Season) -> Vec<Season> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => season_range(min, max),
            (Some(min), None) => season_range(min, latest),
            (None, Some(max)) => vec![max],
            (None, None) => vec![latest],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    pub full_three_semicircle: bool,
    pub floor_opacity: f64,
}

impl Default for CourtConfig {
    fn default() -> Self {
        CourtConfig {
            full_three_semicircle: false,
            floor_opacity: 0.55,
        }
    }
}

impl Config {
    /// Seasons to load, resolving open bounds against today's date.
    pub fn seasons(&self) -> Vec<Season> {
        self.data.seasons.resolve(Season::latest())
    }

    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            heatmap: self.heatmap,
            arcs: self.arcs.clone(),
            geometry: CourtGeometry::NBA,
            full_three_semicircle: self.court.full_three_semicircle,
            floor_opacity: self.court.floor_opacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `config/shotviz.toml` relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // Never overwrite a user's edits.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Smallest heatmap bin accepted. Finer bins blow past the grid cell limit.
pub const MIN_BIN_FT: f64 = 0.1;
/// Largest heatmap bin accepted: one bin spans the half-court width.
pub const MAX_BIN_FT: f64 = 25.0;

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.player.trim().is_empty() {
        return Err(invalid("data.player", "must not be empty"));
    }
    if config.data.dir.as_os_str().is_empty() {
        return Err(invalid("data.dir", "must not be empty"));
    }

    if let Some((field, message)) = config.filters.problems() {
        return Err(invalid(&format!("filters.{field}"), message));
    }

    let h = &config.heatmap;
    let positive_fields: &[(&str, f64)] = &[("heatmap.bin_ft", h.bin_ft), ("heatmap.vlim", h.vlim)];
    for (name, val) in positive_fields {
        if !val.is_finite() || *val <= 0.0 {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }
    if !(MIN_BIN_FT..=MAX_BIN_FT).contains(&h.bin_ft) {
        return Err(invalid(
            "heatmap.bin_ft",
            format!("must be between {MIN_BIN_FT} and {MAX_BIN_FT} feet, got {}", h.bin_ft),
        ));
    }
    if !h.z_lift.is_finite() || !h.boundary_z.is_finite() {
        return Err(invalid("heatmap.z_lift", "heights must be finite"));
    }

    let a = &config.arcs;
    if a.sample == Some(0) {
        return Err(invalid("arcs.sample", "must be > 0 when set"));
    }
    if a.samples_per_arc < 2 {
        return Err(invalid(
            "arcs.samples_per_arc",
            format!("must be at least 2, got {}", a.samples_per_arc),
        ));
    }
    for (name, profile) in [("arcs.heatmap_off", &a.heatmap_off), ("arcs.heatmap_on", &a.heatmap_on)] {
        if profile.apex.lo > profile.apex.hi {
            return Err(invalid(
                name,
                format!("apex lo ({}) must not exceed hi ({})", profile.apex.lo, profile.apex.hi),
            ));
        }
        if !(0.0..=1.0).contains(&profile.opacity) {
            return Err(invalid(
                name,
                format!("opacity must be between 0.0 and 1.0 inclusive, got {}", profile.opacity),
            ));
        }
    }

    let opacity = config.court.floor_opacity;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(invalid(
            "court.floor_opacity",
            format!("must be between 0.0 and 1.0 inclusive, got {opacity}"),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use shotviz_core::grid::MissingLeaguePolicy;

    use crate::filters::{ResultFilter, ALL};

    /// Helper: returns the path to the shotviz-app crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").join(CONFIG_FILE).exists() {
            cwd
        } else if cwd.join("crates/shotviz-app/defaults").exists() {
            cwd.join("crates/shotviz-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Write `text` as the config of a fresh temp project named `name`.
    fn temp_project(name: &str, text: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), text).unwrap();
        tmp
    }

    fn expect_validation_error(name: &str, text: &str, expected_field: &str) {
        let tmp = temp_project(name, text);
        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => {
                assert_eq!(field, expected_field);
            }
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    const MINIMAL: &str = r#"
[data]
dir = "data"
player = "Stephen Curry"
"#;

    #[test]
    fn load_defaults_through_ensure_config_files() {
        let tmp = std::env::temp_dir().join("shotviz_config_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        let copied = ensure_config_files(&tmp).expect("should copy default configs");
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);

        let config = load_config_from(&tmp).expect("should load valid config");
        assert_eq!(config.data.player, "Stephen Curry");
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(
            config.data.seasons,
            SeasonBounds {
                min: Some(Season::new(2015)),
                max: Some(Season::new(2015)),
            }
        );
        assert_eq!(config.filters, FilterState::default());
        assert!(config.heatmap.enabled);
        assert_eq!(config.heatmap.bin_ft, 2.0);
        assert_eq!(config.heatmap.vlim, 0.15);
        assert_eq!(config.heatmap.missing_league, MissingLeaguePolicy::PlayerFallback);
        assert_eq!(config.arcs.sample, Some(1000));
        assert_eq!(config.arcs.heatmap_on.width, 5.0);
        assert_eq!(config.arcs.heatmap_off.apex.hi, 19.5);
        assert_eq!(config.court.floor_opacity, 0.55);

        // Second run leaves the existing copy alone.
        let again = ensure_config_files(&tmp).unwrap();
        assert!(again.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_skips_example_templates() {
        let tmp = std::env::temp_dir().join("shotviz_config_examples");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join("local.toml.example"), "x = 1").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        assert!(!tmp.join("config").join("local.toml.example").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_dirs_errors() {
        let tmp = std::env::temp_dir().join("shotviz_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn minimal_config_takes_defaults() {
        let tmp = temp_project("shotviz_config_minimal", MINIMAL);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.filters.periods, vec![1, 2, 3, 4]);
        assert_eq!(config.filters.opponent, ALL);
        assert!(!config.heatmap.enabled);
        assert!(config.arcs.color_by_result);
        assert_eq!(config.data.seasons, SeasonBounds::default());

        let options = config.scene_options();
        assert_eq!(options.floor_opacity, 0.55);
        assert_eq!(options.geometry, CourtGeometry::NBA);
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn filter_section_parses() {
        let text = format!(
            "{MINIMAL}\n[filters]\nperiods = [4, 5]\nresult = \"Makes\"\nshot_distance = [24.0, 29.0]\n"
        );
        let tmp = temp_project("shotviz_config_filters", &text);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.filters.periods, vec![4, 5]);
        assert_eq!(config.filters.result, ResultFilter::Makes);
        assert_eq!(config.filters.shot_distance, Some((24.0, 29.0)));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn season_bounds_resolve() {
        let latest = Season::new(2024);
        let both = SeasonBounds {
            min: Some(Season::new(2022)),
            max: Some(Season::new(2020)),
        };
        assert_eq!(both.resolve(latest).len(), 3);
        let open_max = SeasonBounds {
            min: Some(Season::new(2023)),
            max: None,
        };
        assert_eq!(open_max.resolve(latest), vec![Season::new(2023), Season::new(2024)]);
        assert_eq!(SeasonBounds::default().resolve(latest), vec![latest]);
    }

    #[test]
    fn rejects_empty_player() {
        expect_validation_error(
            "shotviz_config_empty_player",
            "[data]\ndir = \"data\"\nplayer = \"  \"\n",
            "data.player",
        );
    }

    #[test]
    fn rejects_out_of_range_period() {
        let text = format!("{MINIMAL}\n[filters]\nperiods = [0]\n");
        expect_validation_error("shotviz_config_bad_period", &text, "filters.periods");
    }

    #[test]
    fn rejects_zero_bin_size() {
        let text = format!("{MINIMAL}\n[heatmap]\nbin_ft = 0.0\n");
        expect_validation_error("shotviz_config_bad_bin", &text, "heatmap.bin_ft");
    }

    #[test]
    fn rejects_bin_sizes_outside_supported_range() {
        let tiny = format!("{MINIMAL}\n[heatmap]\nbin_ft = 0.001\n");
        expect_validation_error("shotviz_config_tiny_bin", &tiny, "heatmap.bin_ft");
        let huge = format!("{MINIMAL}\n[heatmap]\nbin_ft = 40.0\n");
        expect_validation_error("shotviz_config_huge_bin", &huge, "heatmap.bin_ft");
    }

    #[test]
    fn rejects_inverted_apex_bounds() {
        let text = format!(
            "{MINIMAL}\n[arcs.heatmap_on]\nbase = 10.0\nslope = 0.3\nlo = 20.0\nhi = 12.0\nwidth = 5.0\nopacity = 0.4\n"
        );
        expect_validation_error("shotviz_config_bad_apex", &text, "arcs.heatmap_on");
    }

    #[test]
    fn rejects_zero_sample() {
        let text = format!("{MINIMAL}\n[arcs]\nsample = 0\n");
        expect_validation_error("shotviz_config_zero_sample", &text, "arcs.sample");
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = std::env::temp_dir().join("shotviz_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::FileNotFound { path } => {
                assert!(path.ends_with(CONFIG_FILE));
            }
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_names_the_file() {
        let tmp = temp_project("shotviz_config_parse_error", "[data\nplayer = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
        let _ = fs::remove_dir_all(&tmp);
    }
}
