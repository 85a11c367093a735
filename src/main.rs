/// Replay host: feeds a bar file through the exporter lifecycle
///
/// Usage: barexport <config.toml> <bars.csv> [history_bars]
///
/// The first `history_bars` bars (default: half the file) plus one forming bar
/// are visible at start; the rest arrive one at a time as new bars.
use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use barexport::{
    config::load_config,
    data::load_bars_csv,
    host::{replay, ExportRobot},
};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        let program = args.first().map(String::as_str).unwrap_or("barexport");
        bail!("usage: {} <config.toml> <bars.csv> [history_bars]", program);
    }

    let config = load_config(&args[1]).context("loading config")?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let all_bars = load_bars_csv(&args[2], config.tz()?).context("loading bars")?;
    let history = match args.get(3) {
        Some(n) => n.parse::<usize>().context("history_bars must be a number")?,
        None => all_bars.len() / 2,
    };

    let mut robot = ExportRobot::new(config)?;

    // An aborted export still stops the robot, then exits non-zero
    replay(&mut robot, &all_bars, history).context("export aborted")?;

    info!(state = robot.state().as_str(), path = %robot.output_path().display(), "Replay finished");
    println!("{}", serde_json::to_string_pretty(&robot.stats())?);

    Ok(())
}
