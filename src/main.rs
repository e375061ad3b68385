use clap::{Parser, Subcommand};
use statwalk::data::{loader, MarketSnapshot};
use statwalk::discovery::BacktestConfig;
use statwalk::walkforward::{candidate_pairs, generate_windows, WalkForwardOrchestrator};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "statwalk",
    version,
    about = "Walk-forward statistical arbitrage backtester for cointegrated equity pairs"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full walk-forward backtest
    Run {
        /// Long-format universe CSV (date,symbol,close)
        #[arg(long)]
        prices: PathBuf,

        /// Volatility index CSV (date,close)
        #[arg(long)]
        vix: PathBuf,

        /// JSON config file; missing fields take their defaults
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the full report as pretty-printed JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pairs to show in the ranking table
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// Print the generated walk-forward windows and exit
    Windows {
        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        vix: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print candidate sector-mate pairs and exit
    Pairs {
        #[arg(long)]
        prices: PathBuf,

        #[arg(long)]
        vix: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "statwalk=info",
        1 => "statwalk=debug",
        _ => "statwalk=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_snapshot(prices: &Path, vix: &Path) -> Result<MarketSnapshot, Box<dyn Error>> {
    let universe = loader::load_universe(prices)?;
    let index = loader::load_index(vix, "VIX")?;
    Ok(MarketSnapshot::build(universe, index)?)
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => BacktestConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            prices,
            vix,
            config,
            output,
            top,
        } => {
            let snapshot = load_snapshot(&prices, &vix)?;
            let config = load_config(config.as_deref())?;
            let orchestrator = WalkForwardOrchestrator::new(&snapshot, &config);
            let report = orchestrator.run()?;

            println!(
                "Walk-forward complete: {} windows, {} pair-window results, {} pairs ranked",
                report.windows.len(),
                report.results.len(),
                report.rankings.len()
            );
            println!();
            println!(
                "{:<12} {:>8} {:>12} {:>12} {:>10}",
                "pair", "windows", "mean sharpe", "persistence", "score"
            );
            for ranking in report.rankings.iter().take(top) {
                println!(
                    "{:<12} {:>8} {:>12.3} {:>12.2} {:>10.3}",
                    ranking.pair.to_string(),
                    ranking.windows_traded,
                    ranking.mean_sharpe,
                    ranking.persistence_rate,
                    ranking.composite_score
                );
            }

            if let Some(path) = output {
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
                info!(path = %path.display(), "Report written");
            }
        }
        Command::Windows {
            prices,
            vix,
            config,
        } => {
            let snapshot = load_snapshot(&prices, &vix)?;
            let config = load_config(config.as_deref())?;
            let windows =
                generate_windows(snapshot.first_date(), snapshot.last_date(), &config)?;
            println!(
                "{:<4} {:>12} {:>12} {:>12} {:>12}",
                "id", "train start", "train end", "test start", "test end"
            );
            for w in windows {
                println!(
                    "{:<4} {:>12} {:>12} {:>12} {:>12}",
                    w.id, w.train_start, w.train_end, w.test_start, w.test_end
                );
            }
        }
        Command::Pairs { prices, vix } => {
            let snapshot = load_snapshot(&prices, &vix)?;
            let pairs = candidate_pairs(&snapshot);
            println!("{} candidate pairs", pairs.len());
            for pair in pairs {
                println!("{:<12} {:?}", pair.to_string(), pair.sector);
            }
        }
    }
    Ok(())
}
