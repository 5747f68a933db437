use anyhow::{Context, Result};
use clap::Parser;
use replay::{ReplayConfig, Replayer};
use sink::ArenaSink;
use std::path::{Path, PathBuf};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(
    name = "replayer",
    about = "Replay a recorded session headlessly and print the resulting tree",
    version
)]
struct Cli {
    /// Recorded session, a JSON array of timed events.
    recording: PathBuf,

    /// TOML file with replay tunables.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback offset in milliseconds from the first event. Defaults to the
    /// end of the recording.
    #[arg(long)]
    offset: Option<f64>,

    /// Print the tree as JSON instead of an outline.
    #[arg(long)]
    json: bool,

    /// Log to stderr; repeat for more detail. `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// RUST_LOG wins over the -v count, e.g. RUST_LOG=replay.mutation=debug.
fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter(verbose)))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ReplayConfig> {
    match path {
        Some(path) => Ok(ReplayConfig::load(path)?),
        None => Ok(ReplayConfig::default()),
    }
}

fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;
    let data = std::fs::read(&cli.recording)
        .with_context(|| format!("reading {}", cli.recording.display()))?;
    let events = snapshot::parse_events(&data)
        .with_context(|| format!("parsing {}", cli.recording.display()))?;

    let mut player = Replayer::new(events, ArenaSink::new(), config);
    let offset = cli.offset.unwrap_or_else(|| player.metadata().total_time);
    player.play(offset);
    // events stamped exactly at the offset are scheduled with zero delay
    player.tick();
    player.pause(None);

    let outline = player.sink().outline();
    if cli.json {
        let value = serde_json::json!({
            "offset": offset,
            "state": player.state().as_str(),
            "metadata": {
                "start_time": player.metadata().start_time,
                "end_time": player.metadata().end_time,
                "total_time": player.metadata().total_time,
            },
            "outline": outline,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(outline.join("\n"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    println!("{}", run(&cli)?);
    Ok(())
}
