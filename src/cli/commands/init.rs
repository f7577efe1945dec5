//! Initialize command.

use console::style;

use crate::config::{Config, Settings};
use crate::repository::ArticleRepository;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings, config: &Config) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    // Opening the repository creates the schema if it is missing.
    let repo = ArticleRepository::new(&settings.database_path())?;
    let (originals, enhanced) = repo.count_by_kind()?;
    if originals + enhanced > 0 {
        println!(
            "  {} Existing database: {} originals, {} enhanced",
            style("→").cyan(),
            originals,
            enhanced
        );
    }

    if !config.enhancer.has_any_provider() {
        println!(
            "{} No LLM provider credentials configured",
            style("!").yellow()
        );
        println!("  Set GROQ_API_KEY or HUGGINGFACE_API_KEY to enable the enhance command");
    }

    println!(
        "{} Initialized BlogForge in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
