use clap::Parser;
use statarb_sim::cli::{Cli, Commands};
use statarb_sim::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    statarb_sim::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Initial capital: {}", config.sim.initial_capital);
            println!(
                "  Risk: InitPos={}%, MaxPos={}%",
                config.risk.initial_position_pct * rust_decimal_macros::dec!(100),
                config.risk.max_position_pct * rust_decimal_macros::dec!(100)
            );
            println!("  Margin mode: {:?}", config.risk.margin_mode);
        }
    }

    Ok(())
}
