// shotviz entry point.
//
// Startup sequence:
// 1. Parse CLI flags
// 2. Initialize tracing (log to file unless --log-stderr)
// 3. Load config, copying defaults on first run, then apply CLI overrides
// 4. Load the player's shots and the league reference for each season
// 5. Build the scene and write it as JSON

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use shotviz_app::config::{self, Config, SeasonBounds};
use shotviz_app::filters::DistancePreset;
use shotviz_app::scene::{build_scene, SceneDocument};
use shotviz_app::seasons::Season;
use shotviz_app::source::{load_multi, CsvShotSource};

#[derive(Debug, Parser)]
#[command(name = "shotviz", about = "Build a 3D shot chart scene with hot/cold zones")]
struct Cli {
    /// Player name, e.g. "Stephen Curry"
    #[arg(long)]
    player: Option<String>,

    /// First season to load, e.g. 2015-16
    #[arg(long)]
    season_min: Option<Season>,

    /// Last season to load (inclusive)
    #[arg(long)]
    season_max: Option<Season>,

    /// Draw the hot/cold zone heatmap
    #[arg(long, overrides_with = "no_heatmap")]
    heatmap: bool,

    /// Skip the hot/cold zone heatmap
    #[arg(long, overrides_with = "heatmap")]
    no_heatmap: bool,

    /// Shot-distance bucket: all, 0-4, 5-10, 11-16, 17-23, 24-29, 30+
    #[arg(long)]
    distance: Option<DistancePreset>,

    /// Draw every matching shot instead of a sample
    #[arg(long)]
    all_shots: bool,

    /// Override the data directory from the config
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Where to write the scene JSON; `-` for stdout
    #[arg(long, short, default_value = "-")]
    output: PathBuf,

    /// Log to stderr instead of logs/shotviz.log
    #[arg(long)]
    log_stderr: bool,

    /// Print the players available in the data directory and exit
    #[arg(long)]
    list_players: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_stderr)?;
    info!("shotviz starting up");

    let mut config = config::load_config().context("failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    config::validate(&config).context("invalid configuration after applying CLI flags")?;

    let source = CsvShotSource::new(&config.data.dir);

    if cli.list_players {
        let players = source
            .players()
            .with_context(|| format!("failed to list players in {}", config.data.dir.display()))?;
        for player in players {
            println!("{player}");
        }
        return Ok(());
    }

    let seasons = config.seasons();
    let player = config.data.player.clone();
    info!(
        "loading {} for {} season(s) from {}",
        player,
        seasons.len(),
        source.data_dir().display()
    );

    let started = Instant::now();
    let (shots, league) = load_multi(&source, &player, &seasons)
        .with_context(|| format!("failed to load shot data for {player}"))?;
    info!("loaded {} shots in {:?}", shots.len(), started.elapsed());

    let started = Instant::now();
    let scene = build_scene(&shots, &league, &config.filters, &config.scene_options())
        .context("failed to build scene")?;
    info!(
        "built scene with {} arcs in {:?}",
        scene.shots_rendered,
        started.elapsed()
    );

    for notice in &scene.notices {
        eprintln!("note: {}", notice.message());
    }

    let document = SceneDocument {
        player,
        seasons: seasons.iter().map(Season::to_string).collect(),
        filters: config.filters.clone(),
        scene,
    };
    write_document(&document, &cli.output)
        .with_context(|| format!("failed to write scene to {}", cli.output.display()))?;

    info!("shotviz done");
    Ok(())
}

/// CLI flags win over the config file.
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(player) = &cli.player {
        config.data.player = player.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.data.dir = dir.clone();
    }
    // A single bound on the command line selects just that season.
    if cli.season_min.is_some() || cli.season_max.is_some() {
        config.data.seasons = SeasonBounds {
            min: cli.season_min.or(cli.season_max),
            max: cli.season_max.or(cli.season_min),
        };
    }
    if cli.heatmap {
        config.heatmap.enabled = true;
    }
    if cli.no_heatmap {
        config.heatmap.enabled = false;
    }
    if let Some(preset) = cli.distance {
        config.filters = config.filters.clone().with_distance_preset(preset);
    }
    if cli.all_shots {
        config.arcs.sample = None;
    }
}

fn write_document(document: &SceneDocument, output: &Path) -> anyhow::Result<()> {
    if output == Path::new("-") {
        let stdout = std::io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        serde_json::to_writer_pretty(&mut writer, document)?;
        writeln!(writer)?;
        writer.flush()?;
    } else {
        let file = std::fs::File::create(output)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writeln!(writer)?;
        writer.flush()?;
        info!("wrote scene to {}", output.display());
    }
    Ok(())
}

/// Initialize file-based tracing. Logs go to `logs/shotviz.log` so JSON on
/// stdout stays clean; `--log-stderr` sends them to the terminal instead.
fn init_tracing(to_stderr: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("shotviz=info,warn"));

    if to_stderr {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .finish();
        return tracing::subscriber::set_global_default(subscriber)
            .context("failed to set tracing subscriber");
    }

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("shotviz.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn base_config() -> Config {
        toml::from_str("[data]\ndir = \"data\"\nplayer = \"Stephen Curry\"\n").unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn single_season_flag_selects_one_season() {
        let cli = Cli::try_parse_from(["shotviz", "--season-min", "2018-19"]).unwrap();
        let mut config = base_config();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.seasons(), vec![Season::new(2018)]);
    }

    #[test]
    fn overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "shotviz",
            "--player",
            "Kevin Durant",
            "--season-min",
            "2016-17",
            "--season-max",
            "2018-19",
            "--heatmap",
            "--distance",
            "24-29",
            "--all-shots",
        ])
        .unwrap();
        let mut config = base_config();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.data.player, "Kevin Durant");
        assert_eq!(config.seasons().len(), 3);
        assert!(config.heatmap.enabled);
        assert_eq!(config.filters.shot_distance, Some((24.0, 29.0)));
        assert_eq!(config.arcs.sample, None);
        assert_eq!(cli.output, PathBuf::from("-"));
    }

    #[test]
    fn last_heatmap_flag_wins() {
        let cli = Cli::try_parse_from(["shotviz", "--heatmap", "--no-heatmap"]).unwrap();
        let mut config = base_config();
        config.heatmap.enabled = true;
        apply_overrides(&mut config, &cli);
        assert!(!config.heatmap.enabled);
    }

    #[test]
    fn bad_season_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["shotviz", "--season-min", "2018-20"]).is_err());
    }
}
