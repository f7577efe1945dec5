//! Article models for blog content storage.
//!
//! An article is either an original (scraped directly from the blog) or an
//! enhanced copy (AI-rewritten, linked back to its original). Derived
//! metadata (word count, reading time) is recomputed whenever content is
//! set through the constructors here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::sanitize::strip_html;

/// Words-per-minute divisor for reading time estimates.
const READING_WORDS_PER_MINUTE: usize = 200;

/// Citation metadata for a reference article used during enhancement.
///
/// Reference content itself is never persisted, only where it came from
/// and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceMeta {
    /// URL the reference was scraped from.
    pub url: String,
    /// Title of the reference article.
    pub title: String,
    /// When the reference was fetched.
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
}

/// Derived and provenance metadata attached to every article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    /// When the source page was scraped.
    #[serde(rename = "scrapedAt")]
    pub scraped_at: DateTime<Utc>,
    /// When the enhanced copy was generated (enhanced articles only).
    #[serde(rename = "enhancedAt", skip_serializing_if = "Option::is_none")]
    pub enhanced_at: Option<DateTime<Utc>>,
    /// Whitespace-separated token count of the plain-text content.
    #[serde(rename = "wordCount")]
    pub word_count: usize,
    /// `ceil(word_count / 200)`.
    #[serde(rename = "readingTimeMinutes")]
    pub reading_time_minutes: usize,
}

impl ArticleMetadata {
    /// Compute metadata for freshly scraped content.
    pub fn for_scrape(content: &str, scraped_at: DateTime<Utc>) -> Self {
        let word_count = count_words(content);
        Self {
            scraped_at,
            enhanced_at: None,
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
        }
    }

    /// Carry provenance forward onto enhanced content, recomputing the
    /// derived fields from the new content.
    pub fn for_enhancement(&self, content: &str, enhanced_at: DateTime<Utc>) -> Self {
        let word_count = count_words(content);
        Self {
            scraped_at: self.scraped_at,
            enhanced_at: Some(enhanced_at),
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
        }
    }
}

/// Count words in HTML content by stripping markup first.
pub fn count_words(content: &str) -> usize {
    strip_html(content).split_whitespace().count()
}

/// Estimated minutes to read `word_count` words, rounded up.
pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(READING_WORDS_PER_MINUTE)
}

/// A stored article, either scraped from the blog or produced by
/// enhancement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Unique identifier (UUID v4).
    pub id: String,
    /// Article title.
    pub title: String,
    /// Article body as HTML.
    pub content: String,
    /// Author name ("Unknown" when the page exposed none).
    pub author: String,
    /// Publication date from the page, or scrape time when absent.
    pub date: DateTime<Utc>,
    /// Source URL. Enhanced copies append `-enhanced` to the original's URL.
    pub url: String,
    /// True for enhanced copies, false for scraped originals.
    pub is_updated: bool,
    /// For enhanced copies, the id of the original article.
    pub original_article_id: Option<String>,
    /// References consulted during enhancement, in search-result order.
    pub references: Vec<ReferenceMeta>,
    /// Derived and provenance metadata.
    pub metadata: ArticleMetadata,
    /// When this record was first persisted.
    pub created_at: DateTime<Utc>,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// Create an original article from scraped fields.
    pub fn new_original(
        title: String,
        content: String,
        author: String,
        date: DateTime<Utc>,
        url: String,
    ) -> Self {
        let now = Utc::now();
        let metadata = ArticleMetadata::for_scrape(&content, now);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            content,
            author,
            date,
            url,
            is_updated: false,
            original_article_id: None,
            references: Vec::new(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the enhanced copy of `original` with rewritten content.
    ///
    /// Title, author, and date are inherited; the URL gets an `-enhanced`
    /// suffix so the copy never collides with the original on lookups.
    pub fn new_enhanced(
        original: &ArticleRecord,
        content: String,
        references: Vec<ReferenceMeta>,
    ) -> Self {
        let now = Utc::now();
        let metadata = original.metadata.for_enhancement(&content, now);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: original.title.clone(),
            content,
            author: original.author.clone(),
            date: original.date,
            url: format!("{}-enhanced", original.url),
            is_updated: true,
            original_article_id: Some(original.id.clone()),
            references,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this is a scraped original rather than an enhanced copy.
    pub fn is_original(&self) -> bool {
        !self.is_updated
    }

    /// Display label for listings.
    pub fn kind(&self) -> &'static str {
        if self.is_updated {
            "enhanced"
        } else {
            "original"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_strips_markup() {
        assert_eq!(count_words("<p>one two three</p>"), 3);
        assert_eq!(count_words("<p>one</p><p>two</p>"), 2);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(3), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(0), 0);
    }

    #[test]
    fn original_has_no_back_reference() {
        let article = ArticleRecord::new_original(
            "Title".to_string(),
            "<p>one two three</p>".to_string(),
            "Unknown".to_string(),
            Utc::now(),
            "https://example.com/blogs/post".to_string(),
        );

        assert!(!article.is_updated);
        assert!(article.original_article_id.is_none());
        assert!(article.references.is_empty());
        assert_eq!(article.metadata.word_count, 3);
        assert_eq!(article.metadata.reading_time_minutes, 1);
        assert!(article.metadata.enhanced_at.is_none());
    }

    #[test]
    fn enhanced_links_back_and_recomputes_metadata() {
        let original = ArticleRecord::new_original(
            "Title".to_string(),
            "<p>one two three</p>".to_string(),
            "Jane Writer".to_string(),
            Utc::now(),
            "https://example.com/blogs/post".to_string(),
        );

        let refs = vec![ReferenceMeta {
            url: "https://other.example/article".to_string(),
            title: "Competing take".to_string(),
            scraped_at: Utc::now(),
        }];
        let enhanced = ArticleRecord::new_enhanced(
            &original,
            "<h2>Intro</h2><p>one two three four five</p>".to_string(),
            refs,
        );

        assert!(enhanced.is_updated);
        assert_eq!(
            enhanced.original_article_id.as_deref(),
            Some(original.id.as_str())
        );
        assert_eq!(enhanced.url, "https://example.com/blogs/post-enhanced");
        assert_eq!(enhanced.title, original.title);
        assert_eq!(enhanced.author, original.author);
        assert_eq!(enhanced.metadata.word_count, 6);
        assert_eq!(enhanced.metadata.scraped_at, original.metadata.scraped_at);
        assert!(enhanced.metadata.enhanced_at.is_some());
        assert_eq!(enhanced.references.len(), 1);
    }
}
