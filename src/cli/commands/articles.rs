//! Article listing and inspection commands.

use chrono::Local;
use console::style;

use crate::config::{Config, Settings};
use crate::content::sanitize::{excerpt, truncate_chars};
use crate::models::ArticleRecord;
use crate::repository::{ArticleFilter, ArticleRepository};

/// List stored articles.
pub async fn cmd_ls(
    settings: &Settings,
    updated: bool,
    originals: bool,
    limit: usize,
    format: &str,
) -> anyhow::Result<()> {
    let repo = match open_repo(settings)? {
        Some(repo) => repo,
        None => return Ok(()),
    };

    let filter = match (updated, originals) {
        (true, false) => ArticleFilter::Enhanced,
        (false, true) => ArticleFilter::Originals,
        _ => ArticleFilter::All,
    };
    let articles = repo.list(filter, Some(limit))?;

    if articles.is_empty() {
        println!("{} No articles found", style("!").yellow());
        return Ok(());
    }

    match format {
        "json" => {
            let output: Vec<_> = articles
                .iter()
                .map(|article| {
                    serde_json::json!({
                        "id": article.id,
                        "title": article.title,
                        "url": article.url,
                        "author": article.author,
                        "is_updated": article.is_updated,
                        "original_article_id": article.original_article_id,
                        "word_count": article.metadata.word_count,
                        "reading_time_minutes": article.metadata.reading_time_minutes,
                        "created_at": article.created_at.to_rfc3339(),
                        "updated_at": article.updated_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "ids" => {
            // Just IDs (for piping)
            for article in &articles {
                println!("{}", article.id);
            }
        }
        _ => {
            println!(
                "\n{:<10}  {:<40}  {:<9}  {:>7}  Created",
                "ID", "Title", "Kind", "Words"
            );
            println!("{}", "-".repeat(90));

            for article in &articles {
                println!(
                    "{:<10}  {:<40}  {:<9}  {:>7}  {}",
                    short_id(&article.id),
                    truncate(&article.title, 40),
                    article.kind(),
                    article.metadata.word_count,
                    article.created_at.format("%Y-%m-%d %H:%M")
                );
            }

            println!("\n{} articles", articles.len());
        }
    }

    Ok(())
}

/// Show a single article's details and an excerpt of its content.
pub async fn cmd_show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let repo = match open_repo(settings)? {
        Some(repo) => repo,
        None => return Ok(()),
    };

    let article = match find_article(&repo, id)? {
        Some(article) => article,
        None => {
            println!("{} Article not found: {}", style("✗").red(), id);
            return Ok(());
        }
    };

    println!("\n{}", style("Article").bold());
    println!("{}", "=".repeat(60));
    println!("{:<12} {}", "ID:", article.id);
    println!("{:<12} {}", "Title:", article.title);
    println!("{:<12} {}", "URL:", article.url);
    println!("{:<12} {}", "Kind:", article.kind());
    println!("{:<12} {}", "Author:", article.author);
    println!("{:<12} {}", "Date:", article.date.format("%Y-%m-%d"));
    println!(
        "{:<12} {} words, {} min read",
        "Length:",
        article.metadata.word_count,
        article.metadata.reading_time_minutes
    );
    println!(
        "{:<12} {}",
        "Scraped:",
        article.metadata.scraped_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(enhanced_at) = article.metadata.enhanced_at {
        println!(
            "{:<12} {}",
            "Enhanced:",
            enhanced_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    if let Some(original_id) = &article.original_article_id {
        println!("{:<12} {}", "Original:", original_id);
    }
    if article.is_original() {
        if let Some(rewrite) = repo.enhanced_of(&article.id)? {
            println!("{:<12} {}", "Rewrite:", rewrite.id);
        }
    }

    if !article.references.is_empty() {
        println!("\n{}", style("References").bold());
        println!("{}", "-".repeat(60));
        for reference in &article.references {
            println!("  {} ({})", reference.title, reference.url);
        }
    }

    println!("\n{}", style("Excerpt").bold());
    println!("{}", "-".repeat(60));
    println!("{}", excerpt(&article.content, 400));

    Ok(())
}

/// Show overall system status.
pub async fn cmd_status(settings: &Settings, config: &Config, json: bool) -> anyhow::Result<()> {
    let repo = match open_repo(settings)? {
        Some(repo) => repo,
        None => return Ok(()),
    };

    let (original_count, enhanced_count) = repo.count_by_kind()?;
    let total = repo.count()?;
    let pending = repo.count_awaiting_enhancement()?;

    let db_path = settings.database_path();
    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let mut providers = Vec::new();
    if config.enhancer.groq_api_key.is_some() {
        providers.push("groq");
    }
    if config.enhancer.hf_api_key.is_some() {
        providers.push("huggingface");
    }

    if json {
        let output = serde_json::json!({
            "database": db_path.display().to_string(),
            "database_bytes": db_size,
            "articles": {
                "total": total,
                "originals": original_count,
                "enhanced": enhanced_count,
                "awaiting_enhancement": pending,
            },
            "blog_url": settings.blog_url,
            "providers": providers,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let now = Local::now();
    let separator = "─".repeat(70);

    println!();
    println!(
        "{:<50} Last updated: {}",
        style("blogforge status").bold(),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    println!("{}", separator);

    println!(
        "Database: {} ({})",
        db_path.display(),
        format_bytes(db_size)
    );
    println!("Blog URL: {}", settings.blog_url);
    println!();

    println!("{}", style("ARTICLES").cyan().bold());
    println!("  {:<22} {:>10}", "Total:", format_number(total));
    println!(
        "  {:<22} {:>10}",
        "Originals:",
        format_number(original_count)
    );
    println!(
        "  {:<22} {:>10}",
        "Enhanced:",
        format_number(enhanced_count)
    );
    println!(
        "  {:<22} {:>10} pending",
        "Enhancement queue:",
        format_number(pending)
    );
    println!();

    println!("{}", style("PROVIDERS").cyan().bold());
    if providers.is_empty() {
        println!("  {} none configured", style("!").yellow());
    } else {
        for provider in &providers {
            println!("  {} {}", style("✓").green(), provider);
        }
    }

    println!("{}", separator);

    Ok(())
}

/// Open the repository, or print a hint when the database is missing.
fn open_repo(settings: &Settings) -> anyhow::Result<Option<ArticleRepository>> {
    if !settings.database_exists() {
        println!(
            "{} No database yet. Run 'blogforge init' first.",
            style("!").yellow()
        );
        return Ok(None);
    }
    Ok(Some(ArticleRepository::new(&settings.database_path())?))
}

/// Resolve an article by exact id, URL, or unique id prefix.
pub(super) fn find_article(
    repo: &ArticleRepository,
    id: &str,
) -> anyhow::Result<Option<ArticleRecord>> {
    if let Some(article) = repo.get(id)? {
        return Ok(Some(article));
    }
    if let Some(article) = repo.get_by_url(id)? {
        return Ok(Some(article));
    }
    Ok(repo.find_by_id_prefix(id)?)
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Truncate a string for table display, appending an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", truncate_chars(s, max_len.saturating_sub(3)))
    }
}

/// Format a number with thousand separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();
    let chunks: Vec<_> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();
    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.2} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.2} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} bytes", bytes)
    }
}
