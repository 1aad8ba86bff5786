mod cli;
mod fetch;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use vfsbox::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch(args) => {
            let config = match &args.config {
                Some(path) => Config::load_from_path(path.clone())?,
                None => Config::load()?,
            };

            // RUST_LOG wins over the configured level
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_level));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();

            fetch::run(args, config).await?
        }
    }

    Ok(())
}
