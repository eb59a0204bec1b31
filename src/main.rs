use std::path::PathBuf;

use clap::Parser;

use tictac_zero::config::ZeroConfig;
use tictac_zero::logging::setup_logging;
use tictac_zero::training::session::run_configured;

#[derive(Parser, Debug)]
#[command(name = "tictac_zero", version, about = "AlphaZero self-play training for tic-tac-toe")]
struct Cli {
    /// Load every knob from a JSON file instead of the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long, default_value_t = false)]
    dump_config: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write rotating log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    zero: ZeroConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ZeroConfig::from_json_file(path)?,
        None => cli.zero.clone(),
    };

    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let _logger = setup_logging(&cli.log_level, cli.log_dir.as_deref())?;
    log::info!("🎮 {} v{} on {}", tictac_zero::NAME, tictac_zero::VERSION, config.game);

    let report = run_configured(config)?;
    log::info!(
        "✅ {} iterations, {} promotions, last arena score {}",
        report.iterations,
        report.promotions,
        report
            .last_score
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    Ok(())
}
