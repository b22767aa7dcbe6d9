use std::time::Duration;

use clap::Parser;

use riptide_keeper::{create_example_config, KeeperConfig, Runner};

#[derive(Parser, Debug)]
#[command(name = "riptide-keeper")]
#[command(about = "Riptide fee-policy keeper: drives the fee engine from a price feed")]
struct Args {
    /// Path to keeper configuration file
    #[arg(short, long, default_value = "keeper.toml")]
    config: String,

    /// Write an example configuration file to the config path and exit
    #[arg(long)]
    init_config: bool,

    /// Override the tick interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Stop after this many ticks (runs until feed exhaustion if absent)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Dry run mode - estimate volatility but skip the trade cycle
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.init_config {
        create_example_config(&args.config)?;
        log::info!("Wrote example configuration to {}", args.config);
        return Ok(());
    }

    let mut config = KeeperConfig::load(&args.config)?;
    if let Some(interval) = args.interval {
        config.interval_secs = interval;
    }

    log::info!("Starting Riptide keeper");
    log::info!("Tick interval: {}s", config.interval_secs);
    log::info!("Quoting {} pools", config.enabled_pools().len());

    if args.dry_run {
        log::warn!("Running in DRY RUN mode - no trade cycle");
    }

    let mut runner = Runner::new(&config, args.dry_run)?;
    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
    let mut remaining = args.max_ticks;

    loop {
        if remaining == Some(0) {
            break;
        }
        ticker.tick().await;

        let now = chrono::Utc::now().timestamp();
        if !runner.run_tick(now)? {
            log::info!("Feed exhausted");
            break;
        }

        if let Some(left) = remaining.as_mut() {
            *left -= 1;
        }
    }

    log::info!(
        "Processed {} ticks, issued {} quotes",
        runner.ticks_processed(),
        runner.quotes_issued()
    );

    Ok(())
}
