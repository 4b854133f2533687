use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pairslide::{
    controller::{MoveAttempt, PuzzleController, PuzzleEvent},
    grid::Direction,
    level::LevelDescriptor,
    progress::ProgressStore,
    settings::{PuzzleSettings, SettingsStore},
    transit::TransitClock,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "levelctl")]
#[command(about = "Inspect and play pairslide levels headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a level and check that it builds.
    Validate { level: String },
    /// Print a level's layout.
    Show {
        level: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Apply a move string such as `RUL` and print each outcome.
    Play {
        level: String,
        #[arg(long)]
        moves: String,
        #[arg(long)]
        level_id: Option<u32>,
        #[arg(long)]
        progress: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        record: bool,
    },
    /// Print or reset stored progress.
    Progress {
        #[arg(long)]
        progress: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        reset: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = SettingsStore::from_env().load();

    match cli.command {
        Commands::Validate { level } => cmd_validate(&settings, &level),
        Commands::Show { level, json } => cmd_show(&settings, &level, json),
        Commands::Play {
            level,
            moves,
            level_id,
            progress,
            record,
        } => cmd_play(&settings, &level, &moves, level_id, progress.as_deref(), record),
        Commands::Progress { progress, reset } => cmd_progress(&settings, progress.as_deref(), reset),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// A level argument is a file path, or a bare number looked up in `levels_dir`.
fn resolve_level(settings: &PuzzleSettings, arg: &str) -> Result<(u32, PathBuf)> {
    if let Ok(id) = arg.parse::<u32>() {
        let Some(path) = settings.level_path(id) else {
            bail!("level {id} given by number but no levels_dir is configured");
        };
        return Ok((id, path));
    }
    Ok((1, PathBuf::from(arg)))
}

fn load_controller(settings: &PuzzleSettings, arg: &str, level_id: Option<u32>) -> Result<PuzzleController> {
    let (default_id, path) = resolve_level(settings, arg)?;
    let descriptor = LevelDescriptor::load(&path)
        .with_context(|| format!("failed to load level {}", path.display()))?;
    PuzzleController::new(level_id.unwrap_or(default_id), descriptor)
        .with_context(|| format!("invalid level {}", path.display()))
}

fn cmd_validate(settings: &PuzzleSettings, arg: &str) -> Result<()> {
    let controller = load_controller(settings, arg, None)?;
    let level = controller.descriptor();
    let grid = controller.grid();
    println!(
        "OK: {:?} {}x{}, par heavy {} light {}, {} breakable tiles",
        level.name,
        grid.width(),
        grid.height(),
        level.heavy_par,
        level.light_par,
        controller.breakables().intact().len()
    );
    Ok(())
}

fn cmd_show(settings: &PuzzleSettings, arg: &str, json: bool) -> Result<()> {
    let controller = load_controller(settings, arg, None)?;
    if json {
        let text = serde_json::to_string_pretty(&controller.snapshot())
            .context("failed to serialize snapshot")?;
        println!("{text}");
        return Ok(());
    }

    println!("{}", controller.descriptor().name);
    for row in controller.render_rows() {
        println!("{row}");
    }
    Ok(())
}

fn parse_moves(text: &str) -> Result<Vec<Direction>> {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            c.to_string()
                .parse::<Direction>()
                .with_context(|| format!("invalid move {c:?}"))
        })
        .collect()
}

fn describe(event: &PuzzleEvent) -> String {
    match event {
        PuzzleEvent::Blocked => "blocked".to_string(),
        PuzzleEvent::Squeezed { pushed } => format!("squeeze ({} pushed)", pushed.label()),
        PuzzleEvent::TileBroken(pos) => format!("broke {pos}"),
        PuzzleEvent::FinishReached(who) => format!("{} finished", who.label()),
        PuzzleEvent::Won(report) => format!("won level {} score {}", report.level_id, report.score.total),
    }
}

fn cmd_play(
    settings: &PuzzleSettings,
    arg: &str,
    moves: &str,
    level_id: Option<u32>,
    progress_path: Option<&Path>,
    record: bool,
) -> Result<()> {
    let mut controller = load_controller(settings, arg, level_id)?;
    let moves = parse_moves(moves)?;
    let mut win = None;

    for (i, direction) in moves.iter().copied().enumerate() {
        let outcome = match controller.apply_move(direction) {
            MoveAttempt::Applied(outcome) => outcome,
            MoveAttempt::Finished => {
                warn!("level already won; ignoring {} remaining moves", moves.len() - i);
                break;
            }
            MoveAttempt::InTransit => bail!("move {} arrived while the previous one was in transit", i + 1),
        };

        let clock = TransitClock::for_outcome(&outcome, &settings.transit);
        let positions = controller.positions();
        let events: Vec<String> = outcome.events.iter().map(describe).collect();
        println!(
            "{:>3} {}: heavy {} light {} ({} ms) {}",
            i + 1,
            direction.letter(),
            positions.heavy,
            positions.light,
            clock.duration().as_millis(),
            events.join(", ")
        );

        if outcome.win.is_some() {
            win = outcome.win;
        }
        controller.finish_transit();
    }

    for row in controller.render_rows() {
        println!("{row}");
    }

    let Some(report) = win else {
        println!("not solved");
        return Ok(());
    };
    println!(
        "solved: score {} (heavy par {}, light par {}, simultaneous {})",
        report.score.total,
        report.score.heavy_under_par,
        report.score.light_under_par,
        report.score.simultaneous
    );

    if record {
        let store = progress_store(progress_path);
        let mut progress = store.load(settings.level_count);
        let change = store
            .record_win(&mut progress, &report)
            .with_context(|| format!("failed to save progress to {}", store.path().display()))?;
        info!(
            improved = change.improved,
            unlocked = ?change.newly_unlocked,
            "recorded level {}",
            report.level_id
        );
    }
    Ok(())
}

fn progress_store(path: Option<&Path>) -> ProgressStore {
    match path {
        Some(path) => ProgressStore::at(path),
        None => ProgressStore::from_env(),
    }
}

fn cmd_progress(settings: &PuzzleSettings, path: Option<&Path>, reset: bool) -> Result<()> {
    let store = progress_store(path);
    let mut progress = store.load(settings.level_count);

    if reset {
        progress.reset();
        store
            .save(&progress)
            .with_context(|| format!("failed to save progress to {}", store.path().display()))?;
        info!("progress reset at {}", store.path().display());
    }

    for record in progress.levels() {
        let state = if record.unlocked { "open" } else { "locked" };
        println!("level {:>2}  {:<6}  {}/3", record.level, state, record.score);
    }
    println!("total stars: {}", progress.total_stars());
    Ok(())
}
