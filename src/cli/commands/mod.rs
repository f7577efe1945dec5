//! Argument parsing and command dispatch.
//!
//! Commands stay thin: they parse flags, wire up the pipeline or
//! repository, and print results. No scraping or enhancement logic
//! lives here.

mod articles;
mod init;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "blogforge")]
#[command(about = "Blog article scraping and LLM-assisted rewriting")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing blogforge.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file to use instead of auto-discovery
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative config paths against the working directory
    #[arg(long, global = true)]
    cwd: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Scrape the latest articles from the blog listing
    Scrape {
        /// Number of articles to scrape (default: from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Blog listing URL (overrides config)
        #[arg(long)]
        url: Option<String>,
    },

    /// Rewrite stored originals that have no enhanced copy yet
    Enhance {
        /// Maximum number of articles to enhance (default: from config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Enhance one specific article (id, id prefix, or URL)
        #[arg(long, value_name = "ID")]
        article_id: Option<String>,
    },

    /// Scrape the latest articles, then enhance them in one pass
    Run {
        /// Number of articles to scrape (default: from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        /// Blog listing URL (overrides config)
        #[arg(long)]
        url: Option<String>,
        /// Maximum number of articles to enhance (default: from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List stored articles
    Ls {
        /// Only show enhanced copies
        #[arg(long)]
        updated: bool,
        /// Only show original articles
        #[arg(long)]
        originals: bool,
        /// Maximum number of rows to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output format: table, json, or ids
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show a single article by id or URL
    Show {
        /// Article id (full or prefix) or article URL
        id: String,
    },

    /// Show database and pipeline status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings, &config).await,
        Commands::Scrape { count, url } => {
            pipeline::cmd_scrape(&settings, &config, count, url.as_deref()).await
        }
        Commands::Enhance { limit, article_id } => {
            pipeline::cmd_enhance(&settings, &config, limit, article_id.as_deref()).await
        }
        Commands::Run { count, url, limit } => {
            pipeline::cmd_run(&settings, &config, count, url.as_deref(), limit).await
        }
        Commands::Ls {
            updated,
            originals,
            limit,
            format,
        } => articles::cmd_ls(&settings, updated, originals, limit, &format).await,
        Commands::Show { id } => articles::cmd_show(&settings, &id).await,
        Commands::Status { json } => articles::cmd_status(&settings, &config, json).await,
    }
}
