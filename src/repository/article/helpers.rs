//! Shared types and helper utilities for the article repository.

use rusqlite::Row;

use crate::models::{ArticleRecord, ReferenceMeta};
use crate::repository::parse_datetime;

/// Which articles a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleFilter {
    All,
    Originals,
    Enhanced,
}

/// Parse an article row.
pub(crate) fn row_to_article(row: &Row) -> rusqlite::Result<ArticleRecord> {
    let metadata_str: String = row.get("metadata")?;

    let references: Vec<ReferenceMeta> = row
        .get::<_, Option<String>>("reference_list")?
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default();

    Ok(ArticleRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        author: row.get("author")?,
        date: parse_datetime(&row.get::<_, String>("date")?),
        url: row.get("url")?,
        is_updated: row.get::<_, i64>("is_updated")? != 0,
        original_article_id: row.get("original_article_id")?,
        references,
        metadata: serde_json::from_str(&metadata_str).unwrap_or_default(),
        created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
    })
}

/// Extension trait to convert rusqlite errors for missing rows to Option.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> std::result::Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
