//! Reference collection from search results.

use std::time::Duration;

use tracing::{debug, warn};

use crate::content::extract::extract;
use crate::models::{ReferenceDocument, SearchResult};
use crate::scrapers::PageLoadOptions;

use super::PageLoader;

/// Fetch and extract each search result in order, skipping failures.
///
/// A failed fetch is logged and dropped; it never aborts collection of the
/// remaining results. The rate-limit delay is applied after every
/// successful fetch. Reference titles come from the search results, since
/// scraped pages often bury theirs in navigation chrome.
pub async fn collect_references(
    loader: &dyn PageLoader,
    results: &[SearchResult],
    delay: Duration,
) -> Vec<ReferenceDocument> {
    let mut references = Vec::new();

    for result in results {
        debug!(url = %result.url, "fetching reference article");

        match loader
            .load_page(&result.url, &PageLoadOptions::article_quick())
            .await
        {
            Ok(view) => {
                let doc = extract(&view.html, &result.url);
                references.push(ReferenceDocument {
                    url: result.url.clone(),
                    title: result.title.clone(),
                    content: doc.content,
                });
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(url = %result.url, error = %e, "failed to fetch reference, skipping");
            }
        }
    }

    debug!(
        collected = references.len(),
        requested = results.len(),
        "reference collection finished"
    );
    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::StubLoader;

    fn article_html(text: &str) -> String {
        format!(
            "<html><body><h1>Page Heading</h1><div class=\"entry-content\"><p>{}</p></div></body></html>",
            text.repeat(60)
        )
    }

    #[tokio::test]
    async fn collects_in_result_order() {
        let loader = StubLoader::new(vec![
            ("https://a.example/one", article_html("alpha ")),
            ("https://b.example/two", article_html("beta ")),
        ]);
        let results = vec![
            SearchResult::new("https://a.example/one", "First"),
            SearchResult::new("https://b.example/two", "Second"),
        ];

        let refs = collect_references(&loader, &results, Duration::ZERO).await;

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].url, "https://a.example/one");
        assert_eq!(refs[1].url, "https://b.example/two");
        assert!(refs[0].content.contains("alpha"));
        assert!(refs[1].content.contains("beta"));
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped_not_fatal() {
        let loader = StubLoader::new(vec![
            ("https://a.example/one", article_html("alpha ")),
            ("https://c.example/three", article_html("gamma ")),
        ]);
        let results = vec![
            SearchResult::new("https://a.example/one", "First"),
            SearchResult::new("https://b.example/down", "Second"),
            SearchResult::new("https://c.example/three", "Third"),
        ];

        let refs = collect_references(&loader, &results, Duration::ZERO).await;

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].url, "https://a.example/one");
        assert_eq!(refs[1].url, "https://c.example/three");
    }

    #[tokio::test]
    async fn titles_come_from_search_results() {
        let loader = StubLoader::new(vec![("https://a.example/one", article_html("alpha "))]);
        let results = vec![SearchResult::new("https://a.example/one", "Result Title")];

        let refs = collect_references(&loader, &results, Duration::ZERO).await;

        assert_eq!(refs[0].title, "Result Title");
    }

    #[tokio::test]
    async fn empty_results_collect_nothing() {
        let loader = StubLoader::new(vec![]);
        let refs = collect_references(&loader, &[], Duration::ZERO).await;
        assert!(refs.is_empty());
    }
}
