//! Multi-strategy article extraction from raw page HTML.
//!
//! Real blogs disagree about markup, so every field is resolved through an
//! ordered cascade of candidate strategies: the first candidate that
//! produces an acceptable value wins. Content strategies are accepted only
//! when the sanitized markup passes a length threshold; the final fallback
//! always yields something, so extraction never fails outright.
//!
//! Parsing happens on plain HTML strings handed over by the navigation
//! layer (`scraper::Html` is not `Send`, so documents stay inside sync
//! scopes here).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::content::sanitize::clean_html;
use crate::models::SourceDocument;

/// Minimum sanitized content length for a container strategy to be accepted.
const CONTENT_LENGTH_THRESHOLD: usize = 200;

/// Author value used when no candidate matches.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Named container strategies, tried in priority order.
///
/// Priority wins over size: a small `.entry-content` match beats a large
/// generic `article` match further down the list.
const CONTENT_STRATEGIES: &[(&str, &str)] = &[
    ("entry content", ".entry-content"),
    ("post content", ".post-content"),
    ("article content", ".article-content"),
    ("article inner content", "article .content"),
    ("main article", "main article"),
    ("article", "article"),
    ("post", ".post"),
    ("blog post", ".blog-post"),
];

/// Block-level elements collected by the secondary strategy.
const BLOCK_ELEMENTS: &str = "p, h1, h2, h3, h4, h5, h6, ul, ol, blockquote, pre";

const TITLE_CLASS_SELECTOR: &str = ".entry-title, .post-title, [class*=\"title\"]";

const AUTHOR_SELECTORS: &[&str] = &[
    ".author",
    ".post-author",
    "[rel=\"author\"]",
    "[class*=\"author\"]",
    "[itemprop=\"author\"]",
];

/// Date candidates paired with the attribute holding the value (element
/// text when `None`).
const DATE_CANDIDATES: &[(&str, Option<&str>)] = &[
    ("time[datetime]", Some("datetime")),
    ("time", None),
    (".date, .post-date, .published, [class*=\"date\"]", None),
    ("meta[property=\"article:published_time\"]", Some("content")),
];

/// Extract an article from raw page HTML.
///
/// Never fails: missing fields fall back to sentinels (`"Untitled"`,
/// [`UNKNOWN_AUTHOR`], the current time) and the content cascade bottoms
/// out at the page body.
pub fn extract(html: &str, source_url: &str) -> SourceDocument {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let content = extract_content(&document);
    let author = extract_author(&document);
    let published_at = extract_date(&document).unwrap_or_else(Utc::now);

    SourceDocument {
        title,
        content,
        author,
        published_at,
        source_url: source_url.to_string(),
    }
}

/// Resolve the title: first `h1`, then title-hinting classes, then the
/// `<title>` segment before `|` or `-`, then a sentinel.
fn extract_title(document: &Html) -> String {
    if let Some(text) = first_text(document, "h1") {
        return text;
    }
    if let Some(text) = first_text(document, TITLE_CLASS_SELECTOR) {
        return text;
    }
    if let Some(text) = first_text(document, "title") {
        let segment = text
            .split('|')
            .next()
            .and_then(|part| part.split('-').next())
            .map(str::trim)
            .unwrap_or("");
        if !segment.is_empty() {
            return segment.to_string();
        }
    }
    "Untitled".to_string()
}

/// Resolve the article body through the three-stage cascade.
///
/// 1. Named container strategies, first whose sanitized markup passes the
///    length threshold.
/// 2. Block elements inside the nearest `article`/`main` scope,
///    concatenated in document order.
/// 3. Raw `main`/`article` markup, else the whole body. Always returns.
fn extract_content(document: &Html) -> String {
    for &(name, selector) in CONTENT_STRATEGIES {
        if let Some(element) = first_element(document, selector) {
            let cleaned = clean_html(&element.inner_html());
            if cleaned.len() > CONTENT_LENGTH_THRESHOLD {
                debug!(strategy = name, length = cleaned.len(), "content strategy matched");
                return cleaned;
            }
        }
    }

    if let Some(blocks) = collect_blocks(document) {
        let cleaned = clean_html(&blocks);
        if cleaned.len() > CONTENT_LENGTH_THRESHOLD {
            debug!(length = cleaned.len(), "block collection strategy matched");
            return cleaned;
        }
    }

    let raw = first_element(document, "main, article")
        .map(|element| element.inner_html())
        .or_else(|| first_element(document, "body").map(|body| body.inner_html()))
        .unwrap_or_else(|| document.html());
    debug!("content cascade exhausted, using container fallback");
    clean_html(&raw)
}

/// Concatenate block-level elements within the nearest article scope.
fn collect_blocks(document: &Html) -> Option<String> {
    let block_selector = Selector::parse(BLOCK_ELEMENTS).ok()?;

    let blocks: Vec<String> = match first_element(document, "article, main") {
        Some(scope) => scope
            .select(&block_selector)
            .map(|element| element.html())
            .collect(),
        None => document
            .select(&block_selector)
            .map(|element| element.html())
            .collect(),
    };

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join(""))
    }
}

fn extract_author(document: &Html) -> String {
    for selector in AUTHOR_SELECTORS {
        if let Some(text) = first_text(document, selector) {
            return text;
        }
    }
    UNKNOWN_AUTHOR.to_string()
}

/// Resolve the publication date from the first matching candidate.
///
/// The first candidate element found wins even if its value fails to
/// parse; the caller substitutes the current time in that case.
fn extract_date(document: &Html) -> Option<DateTime<Utc>> {
    for &(selector, attribute) in DATE_CANDIDATES {
        let Some(element) = first_element(document, selector) else {
            continue;
        };
        let value = match attribute {
            Some(attr) => element.value().attr(attr).map(str::to_string),
            None => Some(element_text(element)),
        };
        return value.as_deref().and_then(parse_date);
    }
    None
}

/// Parse a date string in the formats blogs commonly emit.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    for format in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn first_element<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// First element matching `selector` with non-empty normalized text.
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<html><head><title>Fallback | Site</title></head><body>{body}</body></html>")
    }

    fn filler(words: usize) -> String {
        "lorem ipsum dolor sit amet ".repeat(words / 5)
    }

    #[test]
    fn entry_content_beats_larger_generic_article() {
        let entry = format!("<div class=\"entry-content\"><p>{}</p></div>", "x".repeat(300));
        let article = format!("<article><p>{}</p></article>", "y".repeat(5000));
        let html = page(&format!("{article}{entry}"));

        let doc = extract(&html, "https://example.com/post");
        assert!(doc.content.contains(&"x".repeat(300)));
        assert!(!doc.content.contains("yyyy"));
    }

    #[test]
    fn threshold_rejects_short_containers() {
        let body = format!(
            "<div class=\"entry-content\"><p>too short</p></div><article><p>{}</p></article>",
            filler(100)
        );
        let doc = extract(&page(&body), "https://example.com/post");
        assert!(doc.content.contains("lorem ipsum"));
        assert!(!doc.content.contains("too short"));
    }

    #[test]
    fn block_collection_when_no_container_qualifies() {
        let paragraphs: String = (0..10)
            .map(|i| format!("<p>paragraph {i} {}</p>", filler(10)))
            .collect();
        let body = format!("<main><div>{paragraphs}</div></main>");

        let doc = extract(&page(&body), "https://example.com/post");
        assert!(doc.content.len() > CONTENT_LENGTH_THRESHOLD);
        assert!(doc.content.contains("paragraph 0"));
        assert!(doc.content.contains("paragraph 9"));
    }

    #[test]
    fn body_fallback_always_produces_content() {
        let doc = extract(&page("<div>just a stub</div>"), "https://example.com/post");
        assert!(doc.content.contains("just a stub"));
    }

    #[test]
    fn title_prefers_h1() {
        let body = format!(
            "<h1>Real Heading</h1><p class=\"entry-title\">Class Title</p><article>{}</article>",
            filler(100)
        );
        let doc = extract(&page(&body), "https://example.com/post");
        assert_eq!(doc.title, "Real Heading");
    }

    #[test]
    fn title_falls_back_to_document_title_segment() {
        let html = format!(
            "<html><head><title>My Post | My Blog</title></head><body><article>{}</article></body></html>",
            filler(100)
        );
        let doc = extract(&html, "https://example.com/post");
        assert_eq!(doc.title, "My Post");
    }

    #[test]
    fn author_sentinel_when_missing() {
        let doc = extract(&page(&format!("<article>{}</article>", filler(100))), "u");
        assert_eq!(doc.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn author_from_class_candidate() {
        let body = format!(
            "<span class=\"post-author\">Jane Writer</span><article>{}</article>",
            filler(100)
        );
        let doc = extract(&page(&body), "u");
        assert_eq!(doc.author, "Jane Writer");
    }

    #[test]
    fn date_from_time_datetime_attribute() {
        let body = format!(
            "<time datetime=\"2024-03-05T10:00:00Z\">March 5</time><article>{}</article>",
            filler(100)
        );
        let doc = extract(&page(&body), "u");
        assert_eq!(doc.published_at.to_rfc3339(), "2024-03-05T10:00:00+00:00");
    }

    #[test]
    fn unparseable_date_defaults_to_now() {
        let before = Utc::now();
        let body = format!(
            "<span class=\"post-date\">sometime last week</span><article>{}</article>",
            filler(100)
        );
        let doc = extract(&page(&body), "u");
        assert!(doc.published_at >= before);
    }

    #[test]
    fn parse_date_formats() {
        assert!(parse_date("2024-03-05").is_some());
        assert!(parse_date("March 5, 2024").is_some());
        assert!(parse_date("Mar 5, 2024").is_some());
        assert!(parse_date("5 March 2024").is_some());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn sanitizes_extracted_content() {
        let body = format!(
            "<div class=\"entry-content\"><p>{}</p><script>evil()</script></div>",
            "x".repeat(300)
        );
        let doc = extract(&page(&body), "u");
        assert!(!doc.content.contains("script"));
        assert!(!doc.content.contains("evil"));
    }
}
