//! Sequential scrape-and-enhance orchestration.
//!
//! A run walks the blog listing, scrapes the newest articles, then
//! rewrites each stored original with the help of web references: search
//! for the title, fetch the top hits, hand everything to the enhancement
//! provider chain, and persist the rewrite alongside its source.
//!
//! Every page load, search query, and provider call happens strictly in
//! sequence over one shared browser session, with a fixed delay between
//! steps. Failures on a single article are tallied and logged, never
//! fatal; only a listing page that will not load aborts a run.

mod references;

pub use references::collect_references;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::content::extract::extract;
use crate::llm::{EnhanceError, EnhancementClient};
use crate::models::{ArticleRecord, ReferenceDocument, ReferenceMeta};
use crate::repository::ArticleRepository;
use crate::scrapers::{BrowserError, BrowserSession, PageLoadOptions, PageView};
use crate::search::SearchClient;

/// Listing-page selectors tried in order; the first with any matches wins.
const CANDIDATE_SELECTORS: &[&str] = &[
    "article",
    ".blog-post",
    ".post",
    ".article-card",
    "[class*=\"article\"]",
    "[class*=\"post\"]",
    "a[href*=\"/blogs/\"]",
];

/// Page navigation seam, so orchestration can run against canned pages.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load_page(
        &self,
        url: &str,
        options: &PageLoadOptions,
    ) -> Result<PageView, BrowserError>;
}

#[async_trait]
impl PageLoader for BrowserSession {
    async fn load_page(
        &self,
        url: &str,
        options: &PageLoadOptions,
    ) -> Result<PageView, BrowserError> {
        self.load_with(url, options).await
    }
}

/// Enhancement seam mirroring [`EnhancementClient::enhance`].
#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(
        &self,
        original_html: &str,
        references: &[ReferenceDocument],
    ) -> Result<String, EnhanceError>;
}

#[async_trait]
impl Enhancer for EnhancementClient {
    async fn enhance(
        &self,
        original_html: &str,
        references: &[ReferenceDocument],
    ) -> Result<String, EnhanceError> {
        EnhancementClient::enhance(self, original_html, references).await
    }
}

/// Tunables for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Blog listing page articles are discovered from.
    pub blog_url: String,
    /// Search results fetched as references per article.
    pub reference_limit: usize,
    /// Pause between consecutive page loads and provider calls.
    pub step_delay: Duration,
}

/// Outcome counts for a scrape pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeResult {
    /// New articles saved.
    pub scraped: usize,
    /// Candidates skipped because their URL was already stored.
    pub skipped: usize,
    /// Candidates that failed to load, extract, or save.
    pub failed: usize,
}

/// Outcome counts for an enhancement pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnhanceResult {
    /// Originals pulled from the queue.
    pub attempted: usize,
    /// Enhanced articles persisted.
    pub succeeded: usize,
    /// Originals whose enhancement failed and stayed queued.
    pub failed: usize,
}

/// Combined outcome of a full scrape-then-enhance run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    pub scrape: ScrapeResult,
    pub enhance: EnhanceResult,
}

/// Orchestrates scraping and enhancement over shared resources.
pub struct Pipeline {
    loader: Arc<dyn PageLoader>,
    repo: Arc<ArticleRepository>,
    search: SearchClient,
    enhancer: Arc<dyn Enhancer>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        loader: Arc<dyn PageLoader>,
        repo: Arc<ArticleRepository>,
        search: SearchClient,
        enhancer: Arc<dyn Enhancer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            loader,
            repo,
            search,
            enhancer,
            config,
        }
    }

    /// Scrape the latest `count` articles from the blog listing.
    ///
    /// Takes the trailing `count` candidate links, assuming the listing
    /// renders oldest first. That holds for the supported blog layout but
    /// is a heuristic, not a guarantee; a reordered listing silently
    /// yields older articles instead.
    ///
    /// A listing page that fails to load is an error. Individual
    /// candidates that fail to load or save are logged and counted,
    /// and the pass continues.
    pub async fn scrape_latest(&self, count: usize) -> anyhow::Result<ScrapeResult> {
        info!(url = %self.config.blog_url, count, "scraping latest articles");

        let listing = self
            .loader
            .load_page(&self.config.blog_url, &PageLoadOptions::default())
            .await
            .with_context(|| format!("failed to load blog listing {}", self.config.blog_url))?;

        let candidates = collect_candidate_urls(&listing.html, &self.config.blog_url);
        if candidates.is_empty() {
            warn!("no article links found on the listing page");
            return Ok(ScrapeResult::default());
        }

        let latest = &candidates[candidates.len().saturating_sub(count)..];
        info!(
            found = candidates.len(),
            taking = latest.len(),
            "collected candidate links"
        );

        let mut result = ScrapeResult::default();
        for (i, url) in latest.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.step_delay).await;
            }
            match self.scrape_original(url).await {
                Ok(Some(article)) => {
                    info!(title = %article.title, url = %url, "saved article");
                    result.scraped += 1;
                }
                Ok(None) => {
                    info!(url = %url, "already stored, skipping");
                    result.skipped += 1;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to scrape article");
                    result.failed += 1;
                }
            }
        }

        info!(
            scraped = result.scraped,
            skipped = result.skipped,
            failed = result.failed,
            "scrape pass finished"
        );
        Ok(result)
    }

    /// Scrape one article page, or return `None` when its URL is already
    /// stored. The duplicate check runs before navigation so known
    /// articles cost nothing.
    async fn scrape_original(&self, url: &str) -> anyhow::Result<Option<ArticleRecord>> {
        if self.repo.exists_by_url(url)? {
            return Ok(None);
        }

        let view = self
            .loader
            .load_page(url, &PageLoadOptions::article())
            .await
            .with_context(|| format!("failed to load {url}"))?;

        let doc = extract(&view.html, url);
        let article = ArticleRecord::new_original(
            doc.title,
            doc.content,
            doc.author,
            doc.published_at,
            doc.source_url,
        );
        self.repo
            .save(&article)
            .with_context(|| format!("failed to save article from {url}"))?;
        Ok(Some(article))
    }

    /// Enhance up to `limit` originals that have no enhanced version yet.
    ///
    /// Each article is processed independently: a failed search leaves it
    /// enhancing without references, and a failed enhancement or save is
    /// logged and counted, leaving the original queued for the next pass.
    pub async fn enhance_pending(&self, limit: usize) -> anyhow::Result<EnhanceResult> {
        let pending = self.repo.originals_without_enhancement(limit)?;
        if pending.is_empty() {
            info!("no articles awaiting enhancement");
            return Ok(EnhanceResult::default());
        }

        info!(count = pending.len(), "enhancing articles");
        let mut result = EnhanceResult {
            attempted: pending.len(),
            ..Default::default()
        };

        for (i, original) in pending.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.step_delay).await;
            }
            info!(title = %original.title, "enhancing article");
            match self.enhance_article(original).await {
                Ok(()) => result.succeeded += 1,
                Err(e) => {
                    warn!(
                        title = %original.title,
                        url = %original.url,
                        error = %e,
                        "enhancement failed, keeping original queued"
                    );
                    result.failed += 1;
                }
            }
        }

        info!(
            succeeded = result.succeeded,
            failed = result.failed,
            "enhancement pass finished"
        );
        Ok(result)
    }

    /// Search, collect references, rewrite, and persist one article.
    pub async fn enhance_article(&self, original: &ArticleRecord) -> anyhow::Result<()> {
        let results = self
            .search
            .search(&original.title, self.config.reference_limit)
            .await;
        if results.is_empty() {
            info!(title = %original.title, "no search results, enhancing without references");
        }
        tokio::time::sleep(self.config.step_delay).await;

        let references =
            collect_references(self.loader.as_ref(), &results, self.config.step_delay).await;

        let enhanced = self.enhancer.enhance(&original.content, &references).await?;

        let meta: Vec<ReferenceMeta> = references.iter().map(ReferenceDocument::to_meta).collect();
        let article = ArticleRecord::new_enhanced(original, enhanced, meta);
        self.repo
            .save(&article)
            .with_context(|| format!("failed to save enhanced article for {}", original.url))?;

        info!(
            title = %article.title,
            references = article.references.len(),
            "saved enhanced article"
        );
        Ok(())
    }

    /// Scrape the latest articles, then enhance whatever is queued.
    pub async fn run(&self, count: usize, limit: usize) -> anyhow::Result<RunResult> {
        let scrape = self.scrape_latest(count).await?;
        tokio::time::sleep(self.config.step_delay).await;
        let enhance = self.enhance_pending(limit).await?;
        Ok(RunResult { scrape, enhance })
    }
}

/// Collect article URLs from a listing page.
///
/// Containers are matched by the first selector that finds anything; each
/// match contributes its own `href` or that of its first descendant link.
/// When no container yields a link, every anchor pointing into the blog
/// section is taken instead. Relative links resolve against the listing
/// URL, duplicates are dropped, and document order is preserved.
pub fn collect_candidate_urls(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut hrefs: Vec<String> = Vec::new();
    for raw in CANDIDATE_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let elements: Vec<_> = document.select(&selector).collect();
        if elements.is_empty() {
            continue;
        }

        debug!(selector = raw, matches = elements.len(), "listing selector matched");
        for element in elements {
            let href = element
                .value()
                .attr("href")
                .map(str::to_string)
                .or_else(|| {
                    element
                        .select(&anchor)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .map(str::to_string)
                });
            if let Some(href) = href {
                hrefs.push(href);
            }
        }
        break;
    }

    if hrefs.is_empty() {
        debug!("no container links, scanning all blog-section anchors");
        for element in document.select(&anchor) {
            if let Some(href) = element.value().attr("href") {
                if href.contains("/blogs/") && href != "/blogs/" {
                    hrefs.push(href.to_string());
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for href in hrefs {
        let Some(resolved) = resolve_href(&href, base_url) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            urls.push(resolved);
        }
    }
    urls
}

/// Resolve an href against the listing URL, keeping http(s) links only.
fn resolve_href(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(href.trim()).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(String::from(resolved)),
        _ => None,
    }
}
