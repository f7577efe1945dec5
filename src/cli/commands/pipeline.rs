//! Scrape, enhance, and combined run commands.
//!
//! These commands share one browser session for everything that loads a
//! page. The session is closed on every path, including after a pipeline
//! error, so a dead Chrome process is never left behind.

use std::sync::Arc;

use anyhow::Context;
use console::style;

use crate::config::{Config, Settings};
use crate::llm::EnhancementClient;
use crate::pipeline::{EnhanceResult, Pipeline, PipelineConfig, ScrapeResult};
use crate::repository::ArticleRepository;
use crate::scrapers::{BrowserSession, BrowserSessionConfig};
use crate::search::SearchClient;

/// Scrape the latest articles from the blog listing.
pub async fn cmd_scrape(
    settings: &Settings,
    config: &Config,
    count: Option<usize>,
    url: Option<&str>,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let count = count.unwrap_or(settings.article_count);

    let session = launch_session(settings).await?;
    let pipeline = build_pipeline(settings, config, Arc::clone(&session), url)?;

    println!(
        "{} Scraping up to {} articles from {}",
        style("→").cyan(),
        count,
        url.unwrap_or(&settings.blog_url)
    );

    let outcome = pipeline.scrape_latest(count).await;
    session.close().await;
    let result = outcome?;

    print_scrape_result(&result);
    Ok(())
}

/// Enhance stored originals that have no enhanced copy yet.
pub async fn cmd_enhance(
    settings: &Settings,
    config: &Config,
    limit: Option<usize>,
    article_id: Option<&str>,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    if let Some(id) = article_id {
        return enhance_single(settings, config, id).await;
    }

    let limit = limit.unwrap_or(settings.article_count);

    warn_if_no_provider(config);

    let session = launch_session(settings).await?;
    let pipeline = build_pipeline(settings, config, Arc::clone(&session), None)?;

    println!(
        "{} Enhancing up to {} pending articles",
        style("→").cyan(),
        limit
    );

    let outcome = pipeline.enhance_pending(limit).await;
    session.close().await;
    let result = outcome?;

    print_enhance_result(&result);
    Ok(())
}

/// Enhance one explicitly chosen original.
///
/// Unlike the batch path, a failure here propagates so the exit code
/// reflects it.
async fn enhance_single(settings: &Settings, config: &Config, id: &str) -> anyhow::Result<()> {
    let repo = ArticleRepository::new(&settings.database_path())?;

    let original = match super::articles::find_article(&repo, id)? {
        Some(article) => article,
        None => {
            println!("{} Article not found: {}", style("✗").red(), id);
            return Ok(());
        }
    };

    if original.is_updated {
        println!(
            "{} '{}' is already an enhanced copy",
            style("✗").red(),
            original.title
        );
        return Ok(());
    }
    if let Some(existing) = repo.enhanced_of(&original.id)? {
        println!(
            "{} Article already has an enhanced copy: {}",
            style("!").yellow(),
            existing.id
        );
        return Ok(());
    }

    warn_if_no_provider(config);

    let session = launch_session(settings).await?;
    let pipeline = build_pipeline(settings, config, Arc::clone(&session), None)?;

    println!("{} Enhancing '{}'", style("→").cyan(), original.title);

    let outcome = pipeline.enhance_article(&original).await;
    session.close().await;
    outcome?;

    println!("{} Enhanced '{}'", style("✓").green(), original.title);
    Ok(())
}

/// Scrape the latest articles, then enhance the pending queue.
pub async fn cmd_run(
    settings: &Settings,
    config: &Config,
    count: Option<usize>,
    url: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    settings.ensure_directories()?;
    let count = count.unwrap_or(settings.article_count);
    let limit = limit.unwrap_or(settings.article_count);

    warn_if_no_provider(config);

    let session = launch_session(settings).await?;
    let pipeline = build_pipeline(settings, config, Arc::clone(&session), url)?;

    println!(
        "{} Running scrape and enhance against {}",
        style("→").cyan(),
        url.unwrap_or(&settings.blog_url)
    );

    let outcome = pipeline.run(count, limit).await;
    session.close().await;
    let result = outcome?;

    print_scrape_result(&result.scrape);
    print_enhance_result(&result.enhance);
    Ok(())
}

/// Launch the shared browser session. A launch failure is fatal.
async fn launch_session(settings: &Settings) -> anyhow::Result<Arc<BrowserSession>> {
    let browser_config = BrowserSessionConfig {
        navigation_timeout: settings.navigation_timeout,
        settle_ms: settings.settle_ms,
        user_agent: settings.user_agent.clone(),
        ..Default::default()
    };

    let session = BrowserSession::launch(browser_config)
        .await
        .context("failed to launch browser session")?;

    Ok(Arc::new(session))
}

/// Wire the repository, search client, and enhancement client into a pipeline.
fn build_pipeline(
    settings: &Settings,
    config: &Config,
    session: Arc<BrowserSession>,
    blog_url: Option<&str>,
) -> anyhow::Result<Pipeline> {
    let repo = Arc::new(ArticleRepository::new(&settings.database_path())?);
    let search = SearchClient::new(Arc::clone(&session));
    let enhancer = Arc::new(EnhancementClient::new(config.enhancer.clone()));

    let pipeline_config = PipelineConfig {
        blog_url: blog_url
            .map(str::to_string)
            .unwrap_or_else(|| settings.blog_url.clone()),
        reference_limit: settings.reference_limit,
        step_delay: settings.step_delay(),
    };

    Ok(Pipeline::new(session, repo, search, enhancer, pipeline_config))
}

fn warn_if_no_provider(config: &Config) {
    if !config.enhancer.has_any_provider() {
        println!(
            "{} No LLM provider credentials configured; every enhancement will fail",
            style("!").yellow()
        );
        println!("  Set GROQ_API_KEY or HUGGINGFACE_API_KEY");
    }
}

fn print_scrape_result(result: &ScrapeResult) {
    println!(
        "{} Scraped {} new articles",
        style("✓").green(),
        result.scraped
    );
    if result.skipped > 0 {
        println!("  {} {} already stored", style("→").dim(), result.skipped);
    }
    if result.failed > 0 {
        println!("  {} {} failed", style("✗").red(), result.failed);
    }
}

fn print_enhance_result(result: &EnhanceResult) {
    println!(
        "{} Enhanced {} of {} articles",
        style("✓").green(),
        result.succeeded,
        result.attempted
    );
    if result.failed > 0 {
        println!(
            "  {} {} failed and remain pending",
            style("✗").red(),
            result.failed
        );
    }
}
