use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tstats::completions::CompletionShell;
use tstats::ProjectKind;

#[derive(Parser)]
#[command(name = "tstats")]
#[command(version)]
#[command(about = "Download, compile and inspect WordPress translation files", long_about = None)]
pub(crate) struct Cli {
    /// Settings directory. Can also be set via TSTATS_CONFIG_DIR env var.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Download translations and compile .mo and .json files
    Update(UpdateArgs),

    /// Show runtime, settings and cache information
    Debug,

    /// List known locales
    Locales {
        /// Filter by locale code or name (e.g., "pt", "German")
        query: Option<String>,
    },

    /// Show the contents of a .po or .mo file
    Inspect {
        /// Path to the file
        file: PathBuf,
    },

    /// Manage cached entries
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(clap::Args)]
pub(crate) struct UpdateArgs {
    /// Project slug (e.g., akismet). Updates every enabled project from settings if omitted.
    pub project: Option<String>,

    /// WordPress locale (e.g., pt_PT). Can also be set via TSTATS_LOCALE env var.
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Directory receiving the translation files
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Project type
    #[arg(long, value_enum)]
    pub kind: Option<ProjectKind>,

    /// Text domain used as file name prefix; pass "" for none
    #[arg(long)]
    pub domain: Option<String>,

    /// Plugin sub-project (stable or dev)
    #[arg(long)]
    pub subproject: Option<String>,

    /// Translation service URL. Can also be set via TSTATS_API_URL env var.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Give up on a project after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show debug information when done
    #[arg(long)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub(crate) enum CacheCommands {
    /// List cached entries
    List,

    /// Remove all cached entries
    Clear,
}
