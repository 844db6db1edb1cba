mod args;
mod commands;

use args::{Cli, Commands};
use clap::Parser;
use commands::Stores;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tstats::{clienv, completions};

const DEFAULT_LOG_FILTER: &str = "warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config_dir = cli.config_dir.unwrap_or_else(clienv::config_dir);
    let stores = Stores::open(&config_dir);

    match cli.command {
        Commands::Update(args) => commands::update::cmd_update(&stores, args).await?,
        Commands::Debug => commands::debug::cmd_debug(&stores)?,
        Commands::Locales { query } => commands::locales::cmd_locales(query.as_deref())?,
        Commands::Inspect { file } => commands::inspect::cmd_inspect(&file)?,
        Commands::Cache { command } => commands::cache::cmd_cache(&stores, command)?,
        Commands::Completions { shell } => {
            completions::write_completions::<Cli>(shell, "tstats", &mut std::io::stdout())
        }
    }

    Ok(())
}

/// Logs go to stderr, filtered by $TSTATS_LOG.
fn init_tracing() {
    let filter = clienv::log_filter()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
