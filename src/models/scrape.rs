//! Transient types produced and consumed during a pipeline run.
//!
//! None of these are persisted directly; a [`SourceDocument`] becomes an
//! article record when saved, and reference content is reduced to citation
//! metadata before storage.

use chrono::{DateTime, Utc};

use super::ReferenceMeta;

/// Raw output of scraping a single article page.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Extracted title.
    pub title: String,
    /// Extracted body HTML, already sanitized.
    pub content: String,
    /// Extracted author, or the "Unknown" sentinel.
    pub author: String,
    /// Extracted publication date, or the scrape time.
    pub published_at: DateTime<Utc>,
    /// The URL the page was loaded from.
    pub source_url: String,
}

/// A single search engine hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Result URL.
    pub url: String,
    /// Result title (falls back to the URL when the engine exposed none).
    pub title: String,
}

impl SearchResult {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

/// A reference article fetched to inform a rewrite.
#[derive(Debug, Clone)]
pub struct ReferenceDocument {
    /// URL the reference was fetched from.
    pub url: String,
    /// Reference title.
    pub title: String,
    /// Reference body HTML. Used for prompt building only, never stored.
    pub content: String,
}

impl ReferenceDocument {
    /// Citation metadata for persistence, stamped with the current time.
    pub fn to_meta(&self) -> ReferenceMeta {
        ReferenceMeta {
            url: self.url.clone(),
            title: self.title.clone(),
            scraped_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_meta_drops_content() {
        let doc = ReferenceDocument {
            url: "https://other.example/post".to_string(),
            title: "Post".to_string(),
            content: "<p>body</p>".to_string(),
        };

        let meta = doc.to_meta();
        assert_eq!(meta.url, doc.url);
        assert_eq!(meta.title, doc.title);
    }
}
