//! Data models for blogforge.

mod article;
mod scrape;

pub use article::{
    count_words, reading_time_minutes, ArticleMetadata, ArticleRecord, ReferenceMeta,
};
pub use scrape::{ReferenceDocument, SearchResult, SourceDocument};
