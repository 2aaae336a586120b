use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use equestrian_lib::game_server::{GameServer, InputSource, Pacing, RaceEnd, RhythmTapper};
use equestrian_lib::performance::SvgChartExporter;
use equestrian_lib::storage::{HistoryStore, JsonFileStore, ProgressStore};
use equestrian_lib::{Breed, ClimateChoice, GameConfig, Sex};

#[derive(Debug, Parser)]
#[command(name = "equestrian", version)]
#[command(about = "Headless horse races with persisted rider progress")]
struct Args {
    /// Directory holding progress, history and the performance chart
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    /// JSON file overriding the default tuning values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one race with an automatic rhythm tapper
    Race(RaceArgs),
    /// Print the race history, newest last
    History {
        /// Only show the most recent entries
        #[arg(long)]
        last: Option<usize>,
    },
    /// Print the saved progress record
    Progress,
}

#[derive(Debug, clap::Args)]
struct RaceArgs {
    /// RNG seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Rider name (defaults to the last rider)
    #[arg(long)]
    rider: Option<String>,

    /// Horse name (defaults to the last horse)
    #[arg(long)]
    horse: Option<String>,

    /// thoroughbred, criollo, arabian, quarter-horse or percheron
    #[arg(long)]
    breed: Option<Breed>,

    /// mare or stallion
    #[arg(long)]
    sex: Option<Sex>,

    /// sunny, rainy, windy, muddy or random
    #[arg(long)]
    climate: Option<ClimateChoice>,

    /// Taps per second for the automatic rider (at most 30)
    #[arg(long, default_value_t = 4.0)]
    tap_rate: f32,

    /// Drink water when energy falls below this level
    #[arg(long)]
    water_below: Option<f32>,

    /// Pace ticks against the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = GameConfig::load(args.config.as_deref()).context("loading game config")?;
    let store = JsonFileStore::in_dir(&args.data_dir, config.history_cap);

    match args.command {
        Command::Race(race) => run_race(config, store, &args.data_dir, race),
        Command::History { last } => print_history(&store, last),
        Command::Progress => {
            let progress = store.load_progress();
            println!(
                "{}",
                serde_json::to_string_pretty(&progress).context("encoding progress")?
            );
            Ok(())
        }
    }
}

fn run_race(config: GameConfig, store: JsonFileStore, data_dir: &Path, args: RaceArgs) -> Result<()> {
    if !args.tap_rate.is_finite() || args.tap_rate < 0.0 {
        bail!("--tap-rate must be a non-negative number (got {})", args.tap_rate);
    }
    let exporter = Box::new(SvgChartExporter::in_dir(data_dir));
    let mut server = GameServer::new(config, store, exporter);

    let mut selection = server.enter_menu();
    if let Some(rider) = args.rider {
        selection.rider_name = rider;
    }
    if let Some(horse) = args.horse {
        selection.horse_name = horse;
    }
    if let Some(breed) = args.breed {
        selection.breed = breed;
    }
    if let Some(sex) = args.sex {
        selection.sex = sex;
    }
    if let Some(climate) = args.climate {
        selection.climate = climate;
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("Using seed {}", seed);
    server.start_race(&selection, seed).context("starting race")?;

    let mut tapper = RhythmTapper::new(args.tap_rate);
    if let Some(limit) = args.water_below {
        tapper = tapper.with_water_below(limit);
    }
    log::debug!("Input source: {}", tapper.name());

    let pacing = if args.realtime { Pacing::Realtime } else { Pacing::Fixed };
    match server.run_race(&mut tapper, pacing) {
        RaceEnd::Completed(report) => {
            println!(
                "{} {} on {} in {} weather: {:.2}s",
                report.rider.name,
                if report.outcome.won { "won" } else { "lost" },
                report.horse_name,
                report.weather,
                report.outcome.elapsed_time
            );
            for line in &report.ranking_lines {
                println!("  {line}");
            }
            println!("Points: {}", report.rider.points);
            match report.best_time {
                Some(best) => println!("Best time: {best:.2}s"),
                None => println!("Best time: -"),
            }
            if let Some(chart) = &report.chart {
                println!("Chart: {}", chart.display());
            }
            Ok(())
        }
        RaceEnd::ReturnedToMenu | RaceEnd::Quit => Ok(()),
        RaceEnd::Abandoned(reason) => bail!("race abandoned: {reason}"),
    }
}

fn print_history(store: &JsonFileStore, last: Option<usize>) -> Result<()> {
    let history = store.load_history();
    let skip = last.map_or(0, |n| history.len().saturating_sub(n));
    if history.is_empty() {
        println!("No races recorded in {}", store.history_path().display());
        return Ok(());
    }
    for entry in history.iter().skip(skip) {
        println!(
            "{}  {:<12} {:<12} {:<14} {:<6} {:>7.2}s  {:<4} {:>5} pts",
            entry.timestamp.as_deref().unwrap_or("-"),
            entry.player,
            entry.horse,
            entry.breed,
            entry.climate,
            entry.time,
            if entry.won { "win" } else { "loss" },
            entry.points
        );
    }
    Ok(())
}
