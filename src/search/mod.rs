//! Web search for reference discovery.
//!
//! Providers are tried in order: a rendered Google results page first,
//! then the static DuckDuckGo HTML endpoint. The first provider that
//! yields results wins. Provider failures fall through to the next
//! provider, and a query no provider can answer resolves to an empty
//! list rather than an error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::SearchResult;
use crate::scrapers::{BrowserSession, HttpClient, PageLoadOptions};

/// Google result containers, tried in order; the first with matches wins.
const GOOGLE_RESULT_SELECTORS: &[&str] = &["div.g", "div[data-hveid]", ".rc"];

/// DuckDuckGo HTML search endpoint.
const DDG_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// Timeout for the static fallback endpoint.
const DDG_TIMEOUT: Duration = Duration::from_secs(10);

/// Domains never returned as references. Search engines, social
/// networks, and video platforms do not make useful source material.
const DENIED_DOMAINS: &[&str] = &[
    "google.com",
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "duckduckgo.com",
];

/// Search failures.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Page(#[from] crate::scrapers::BrowserError),

    #[error("failed to parse results: {0}")]
    Parse(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// A single search engine behind a common query interface.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Run a query, returning up to `limit` deny-filtered results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Ordered chain of search providers.
pub struct SearchClient {
    providers: Vec<Box<dyn SearchProvider>>,
}

impl SearchClient {
    /// The standard chain: rendered Google first, DuckDuckGo HTML fallback.
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self {
            providers: vec![
                Box::new(GoogleSource::new(session)),
                Box::new(DuckDuckGoSource::new()),
            ],
        }
    }

    /// Build a client from an explicit provider list.
    pub fn with_providers(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self { providers }
    }

    /// Query providers in order and return the first non-empty result set.
    ///
    /// A provider error is logged and treated like an empty result set, so
    /// the next provider still gets consulted. When the chain is exhausted
    /// the query resolves to an empty list.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        for provider in &self.providers {
            match provider.search(query, limit).await {
                Ok(results) if !results.is_empty() => {
                    debug!(
                        "{} returned {} results for '{}'",
                        provider.name(),
                        results.len(),
                        query
                    );
                    return results;
                }
                Ok(_) => {
                    debug!("{} returned no results for '{}'", provider.name(), query);
                }
                Err(e) => {
                    warn!("{} search failed for '{}': {}", provider.name(), query, e);
                }
            }
        }

        Vec::new()
    }
}

/// Rendered Google search backed by the shared browser session.
pub struct GoogleSource {
    session: Arc<BrowserSession>,
}

impl GoogleSource {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SearchProvider for GoogleSource {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        debug!("Google search: {}", query);

        let url = format!(
            "https://www.google.com/search?q={}",
            urlencoding::encode(query)
        );

        // Result containers appear as soon as hydration finishes, so a
        // short settle plus the container wait is enough
        let options = PageLoadOptions {
            settle: Some(Duration::from_millis(500)),
            wait_selector: Some("div.g".to_string()),
        };
        let page = self.session.load_with(&url, &options).await?;

        parse_google_results(&page.html, limit)
    }
}

/// DuckDuckGo HTML search. Needs no browser, so it stays usable when the
/// rendered engine is blocked or the session has gone away.
pub struct DuckDuckGoSource {
    client: HttpClient,
}

impl DuckDuckGoSource {
    pub fn new() -> Self {
        // DuckDuckGo serves the HTML endpoint reluctantly to obvious bots
        let client =
            HttpClient::with_user_agent(DDG_TIMEOUT, Duration::ZERO, Some("impersonate"));
        Self { client }
    }
}

impl Default for DuckDuckGoSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSource {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        debug!("DuckDuckGo search: {}", query);

        let url = format!("{}?q={}", DDG_SEARCH_URL, urlencoding::encode(query));
        let response = self.client.get(&url).await?;

        if !response.status().is_success() {
            return Err(SearchError::Unavailable(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }

        let html = response.text().await?;
        parse_duckduckgo_results(&html, limit)
    }
}

/// Check whether a result URL is on the deny list.
///
/// Unparseable URLs are denied outright.
pub fn is_denied(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return true;
    };

    if parsed.path().to_ascii_lowercase().ends_with(".pdf") {
        return true;
    }

    let Some(host) = parsed.host_str() else {
        return true;
    };

    DENIED_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}

/// Parse a rendered Google results page.
///
/// Container selectors are tried in order and the first one that matches
/// anything is used; later selectors are never consulted, even when every
/// hit in the chosen container gets deny-filtered away.
fn parse_google_results(html: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);

    let title_selector = parse_selector("h3")?;
    let link_selector = parse_selector(r#"a[href^="http"]"#)?;

    for container in GOOGLE_RESULT_SELECTORS {
        let selector = parse_selector(container)?;
        let blocks: Vec<_> = document.select(&selector).collect();
        if blocks.is_empty() {
            continue;
        }

        debug!("Google results matched container '{}'", container);

        let mut results = Vec::new();
        for block in blocks {
            let Some(link) = block.select(&link_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if is_denied(href) {
                continue;
            }

            let title = block
                .select(&title_selector)
                .next()
                .map(|h| h.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| href.to_string());

            results.push(SearchResult::new(href, title));
            if results.len() >= limit {
                break;
            }
        }

        return Ok(results);
    }

    Ok(Vec::new())
}

/// Parse the DuckDuckGo HTML endpoint response.
fn parse_duckduckgo_results(html: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);

    // Results are <a class="result__a"> elements
    let result_selector = parse_selector("a.result__a")?;

    let mut results = Vec::new();
    for element in document.select(&result_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = clean_duckduckgo_url(href) else {
            continue;
        };
        if is_denied(&url) {
            continue;
        }

        let title = element.text().collect::<String>().trim().to_string();
        let title = if title.is_empty() { url.clone() } else { title };

        results.push(SearchResult::new(url, title));
        if results.len() >= limit {
            break;
        }
    }

    Ok(results)
}

/// Extract the target URL from a DuckDuckGo result href.
///
/// DuckDuckGo sometimes links directly and sometimes routes through a
/// redirect of the form `//duckduckgo.com/l/?uddg=<encoded_url>&...`.
fn clean_duckduckgo_url(href: &str) -> Option<String> {
    if href.starts_with("//duckduckgo.com/l/") || href.starts_with("/l/") {
        let uddg_start = href.find("uddg=")?;
        let encoded = &href[uddg_start + 5..];
        let end = encoded.find('&').unwrap_or(encoded.len());

        urlencoding::decode(&encoded[..end])
            .ok()
            .map(|s| s.into_owned())
    } else if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else {
        None
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SearchError> {
    Selector::parse(selector)
        .map_err(|e| SearchError::Parse(format!("invalid selector '{}': {:?}", selector, e)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct StubProvider {
        name: &'static str,
        results: Vec<SearchResult>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SearchProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.iter().take(limit).cloned().collect())
        }
    }

    fn stub(
        name: &'static str,
        results: Vec<SearchResult>,
    ) -> (Box<dyn SearchProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = StubProvider {
            name,
            results,
            calls: calls.clone(),
        };
        (Box::new(provider), calls)
    }

    #[test]
    fn deny_list_rejects_engines_and_socials() {
        assert!(is_denied("https://www.youtube.com/watch?v=abc"));
        assert!(is_denied("https://google.com/search?q=x"));
        assert!(is_denied("https://www.linkedin.com/in/someone"));
        assert!(is_denied("https://site.example/whitepaper.PDF"));
        assert!(is_denied("not a url"));

        assert!(!is_denied("https://example.com/some-article"));
        assert!(!is_denied("https://blog.example.org/rust-tips"));
    }

    #[test]
    fn deny_list_matches_subdomains_not_substrings() {
        assert!(is_denied("https://news.google.com/articles/x"));
        assert!(!is_denied("https://mygoogle.community.com/post"));
    }

    #[test]
    fn google_first_matching_container_wins() {
        let html = r#"
            <div class="g">
                <a href="https://example.com/first"><h3>First hit</h3></a>
            </div>
            <div class="rc">
                <a href="https://example.com/ignored"><h3>Stale layout</h3></a>
            </div>
        "#;

        let results = parse_google_results(html, 5).expect("parse");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/first");
        assert_eq!(results[0].title, "First hit");
    }

    #[test]
    fn google_results_are_deny_filtered_and_limited() {
        let html = r#"
            <div class="g"><a href="https://www.youtube.com/watch?v=1"><h3>Video</h3></a></div>
            <div class="g"><a href="https://example.com/a"><h3>A</h3></a></div>
            <div class="g"><a href="https://example.com/b"><h3>B</h3></a></div>
            <div class="g"><a href="https://example.com/c"><h3>C</h3></a></div>
        "#;

        let results = parse_google_results(html, 2).expect("parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://example.com/a");
        assert_eq!(results[1].url, "https://example.com/b");
    }

    #[test]
    fn google_title_falls_back_to_url() {
        let html = r#"<div class="g"><a href="https://example.com/untitled"></a></div>"#;

        let results = parse_google_results(html, 5).expect("parse");
        assert_eq!(results[0].title, "https://example.com/untitled");
    }

    #[test]
    fn google_empty_page_yields_no_results() {
        let results = parse_google_results("<html><body></body></html>", 5).expect("parse");
        assert!(results.is_empty());
    }

    #[test]
    fn duckduckgo_results_unwrap_redirects() {
        let html = r#"
            <a class="result__a"
               href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpost&rut=abc">
               Example post</a>
            <a class="result__a" href="https://other.example/direct">Direct</a>
        "#;

        let results = parse_duckduckgo_results(html, 5).expect("parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://example.com/post");
        assert_eq!(results[0].title, "Example post");
        assert_eq!(results[1].url, "https://other.example/direct");
    }

    #[test]
    fn clean_duckduckgo_url_variants() {
        assert_eq!(
            clean_duckduckgo_url("/l/?uddg=https%3A%2F%2Fexample.com%2Fa&rut=x"),
            Some("https://example.com/a".to_string())
        );
        assert_eq!(
            clean_duckduckgo_url("https://example.com/direct"),
            Some("https://example.com/direct".to_string())
        );
        assert_eq!(clean_duckduckgo_url("javascript:void(0)"), None);
        assert_eq!(clean_duckduckgo_url("/l/?other=param"), None);
    }

    #[tokio::test]
    async fn primary_results_skip_fallback() {
        let (primary, primary_calls) = stub(
            "primary",
            vec![SearchResult::new("https://example.com/a", "A")],
        );
        let (fallback, fallback_calls) = stub(
            "fallback",
            vec![SearchResult::new("https://example.com/b", "B")],
        );

        let client = SearchClient::with_providers(vec![primary, fallback]);
        let results = client.search("rust async", 5).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/a");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_primary_invokes_fallback_once() {
        let (primary, primary_calls) = stub("primary", Vec::new());
        let (fallback, fallback_calls) = stub(
            "fallback",
            vec![SearchResult::new("https://example.com/b", "B")],
        );

        let client = SearchClient::with_providers(vec![primary, fallback]);
        let results = client.search("rust async", 5).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://example.com/b");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_chain_resolves_to_empty() {
        let (primary, _) = stub("primary", Vec::new());
        let (fallback, fallback_calls) = stub("fallback", Vec::new());

        let client = SearchClient::with_providers(vec![primary, fallback]);
        let results = client.search("obscure query", 5).await;

        assert!(results.is_empty());
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }
}
