//! Basic CRUD operations for articles.

use rusqlite::params;

use super::helpers::{row_to_article, ArticleFilter, OptionalExt};
use super::ArticleRepository;
use crate::models::ArticleRecord;
use crate::repository::Result;

impl ArticleRepository {
    /// Get an article by ID.
    pub fn get(&self, id: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM articles WHERE id = ?")?;

        let article = stmt.query_row(params![id], row_to_article).optional()?;

        Ok(article)
    }

    /// Get an article by source URL.
    pub fn get_by_url(&self, url: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM articles WHERE url = ?")?;

        let article = stmt.query_row(params![url], row_to_article).optional()?;

        Ok(article)
    }

    /// Find an article whose id starts with `prefix`.
    ///
    /// Returns `None` when the prefix matches zero or multiple articles.
    pub fn find_by_id_prefix(&self, prefix: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT * FROM articles WHERE id LIKE ?1 || '%' LIMIT 2")?;

        let mut matches = stmt
            .query_map(params![prefix], row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }

    /// Check whether an article with this URL is already stored.
    pub fn exists_by_url(&self, url: &str) -> Result<bool> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE url = ?",
            params![url],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List articles, newest first.
    pub fn list(&self, filter: ArticleFilter, limit: Option<usize>) -> Result<Vec<ArticleRecord>> {
        let conn = self.connect()?;

        let mut sql = String::from("SELECT * FROM articles");
        match filter {
            ArticleFilter::All => {}
            ArticleFilter::Originals => sql.push_str(" WHERE is_updated = 0"),
            ArticleFilter::Enhanced => sql.push_str(" WHERE is_updated = 1"),
        }
        sql.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map([], row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    /// Originals that have no enhanced copy yet, oldest first.
    pub fn originals_without_enhancement(&self, limit: usize) -> Result<Vec<ArticleRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            r#"SELECT * FROM articles a
               WHERE a.is_updated = 0
                 AND NOT EXISTS (
                     SELECT 1 FROM articles e WHERE e.original_article_id = a.id
                 )
               ORDER BY a.created_at ASC
               LIMIT ?"#,
        )?;

        let articles = stmt
            .query_map(params![limit as i64], row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    /// How many originals still lack an enhanced copy.
    pub fn count_awaiting_enhancement(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            r#"SELECT COUNT(*) FROM articles a
               WHERE a.is_updated = 0
                 AND NOT EXISTS (
                     SELECT 1 FROM articles e WHERE e.original_article_id = a.id
                 )"#,
            [],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }

    /// Get the enhanced copy of an original article, if one exists.
    pub fn enhanced_of(&self, original_id: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT * FROM articles WHERE original_article_id = ? LIMIT 1")?;

        let article = stmt
            .query_row(params![original_id], row_to_article)
            .optional()?;

        Ok(article)
    }

    /// Save an article.
    pub fn save(&self, article: &ArticleRecord) -> Result<()> {
        let article = article.clone();

        crate::repository::with_retry(|| {
            let conn = self.connect()?;

            let references_json = serde_json::to_string(&article.references)?;
            let metadata_json = serde_json::to_string(&article.metadata)?;

            conn.execute(
                r#"
                INSERT INTO articles (id, title, content, author, date, url, is_updated, original_article_id, reference_list, metadata, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    author = excluded.author,
                    date = excluded.date,
                    url = excluded.url,
                    is_updated = excluded.is_updated,
                    original_article_id = excluded.original_article_id,
                    reference_list = excluded.reference_list,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at
                "#,
                params![
                    article.id,
                    article.title,
                    article.content,
                    article.author,
                    article.date.to_rfc3339(),
                    article.url,
                    article.is_updated as i64,
                    article.original_article_id,
                    references_json,
                    metadata_json,
                    article.created_at.to_rfc3339(),
                    article.updated_at.to_rfc3339(),
                ],
            )?;

            Ok(())
        })
    }

    /// Delete an article.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let rows = conn.execute("DELETE FROM articles WHERE id = ?", params![id])?;
        Ok(rows > 0)
    }

    /// Count all articles.
    pub fn count(&self) -> Result<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Count articles by kind, returning (originals, enhanced).
    pub fn count_by_kind(&self) -> Result<(u64, u64)> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT is_updated, COUNT(*) FROM articles GROUP BY is_updated")?;

        let mut originals = 0;
        let mut enhanced = 0;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)? != 0, row.get::<_, i64>(1)? as u64))
        })?;

        for row in rows {
            let (is_updated, count) = row?;
            if is_updated {
                enhanced = count;
            } else {
                originals = count;
            }
        }

        Ok((originals, enhanced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceMeta;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_repo() -> (TempDir, ArticleRepository) {
        let dir = TempDir::new().unwrap();
        let repo = ArticleRepository::new(&dir.path().join("articles.db")).unwrap();
        (dir, repo)
    }

    fn sample_original(url: &str) -> ArticleRecord {
        ArticleRecord::new_original(
            "Sample Post".to_string(),
            "<p>one two three four five</p>".to_string(),
            "Jane Writer".to_string(),
            Utc::now(),
            url.to_string(),
        )
    }

    #[test]
    fn test_save_and_get_round_trip() {
        let (_dir, repo) = test_repo();
        let article = sample_original("https://example.com/blogs/post");
        repo.save(&article).unwrap();

        let loaded = repo.get(&article.id).unwrap().unwrap();
        assert_eq!(loaded.id, article.id);
        assert_eq!(loaded.title, article.title);
        assert_eq!(loaded.content, article.content);
        assert_eq!(loaded.author, article.author);
        assert_eq!(loaded.url, article.url);
        assert!(!loaded.is_updated);
        assert!(loaded.original_article_id.is_none());
        assert!(loaded.references.is_empty());
        assert_eq!(loaded.metadata.word_count, 5);
        assert_eq!(loaded.metadata.reading_time_minutes, 1);
        assert!(loaded.metadata.enhanced_at.is_none());
    }

    #[test]
    fn test_missing_lookups_return_none() {
        let (_dir, repo) = test_repo();
        assert!(repo.get("nope").unwrap().is_none());
        assert!(repo.get_by_url("https://example.com/none").unwrap().is_none());
        assert!(!repo.exists_by_url("https://example.com/none").unwrap());
    }

    #[test]
    fn test_url_lookup_supports_duplicate_skip() {
        let (_dir, repo) = test_repo();
        let article = sample_original("https://example.com/blogs/post");
        repo.save(&article).unwrap();

        assert!(repo.exists_by_url("https://example.com/blogs/post").unwrap());
        let found = repo
            .get_by_url("https://example.com/blogs/post")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, article.id);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_save_same_id_updates_in_place() {
        let (_dir, repo) = test_repo();
        let mut article = sample_original("https://example.com/blogs/post");
        repo.save(&article).unwrap();

        article.content = "<p>rewritten body text</p>".to_string();
        article.updated_at = Utc::now();
        repo.save(&article).unwrap();

        assert_eq!(repo.count().unwrap(), 1);
        let loaded = repo.get(&article.id).unwrap().unwrap();
        assert_eq!(loaded.content, "<p>rewritten body text</p>");
    }

    #[test]
    fn test_enhanced_article_links_original() {
        let (_dir, repo) = test_repo();
        let original = sample_original("https://example.com/blogs/post");
        repo.save(&original).unwrap();

        let refs = vec![ReferenceMeta {
            url: "https://other.example/article".to_string(),
            title: "Competing take".to_string(),
            scraped_at: Utc::now(),
        }];
        let enhanced = ArticleRecord::new_enhanced(
            &original,
            "<h2>Intro</h2><p>rewritten content</p>".to_string(),
            refs,
        );
        repo.save(&enhanced).unwrap();

        let loaded = repo.enhanced_of(&original.id).unwrap().unwrap();
        assert_eq!(loaded.id, enhanced.id);
        assert_eq!(loaded.original_article_id.as_deref(), Some(original.id.as_str()));
        assert_eq!(loaded.url, "https://example.com/blogs/post-enhanced");
        assert_eq!(loaded.references.len(), 1);
        assert_eq!(loaded.references[0].url, "https://other.example/article");

        // The original now has an enhanced copy, so it leaves the queue.
        assert!(repo.originals_without_enhancement(10).unwrap().is_empty());
    }

    #[test]
    fn test_originals_without_enhancement_is_oldest_first() {
        let (_dir, repo) = test_repo();

        let mut first = sample_original("https://example.com/blogs/first");
        first.created_at = Utc::now() - Duration::minutes(10);
        repo.save(&first).unwrap();

        let mut second = sample_original("https://example.com/blogs/second");
        second.created_at = Utc::now() - Duration::minutes(5);
        repo.save(&second).unwrap();

        let pending = repo.originals_without_enhancement(10).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[1].id, second.id);

        let limited = repo.originals_without_enhancement(1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, first.id);
    }

    #[test]
    fn test_list_filters_by_kind() {
        let (_dir, repo) = test_repo();

        let mut original = sample_original("https://example.com/blogs/post");
        original.created_at = Utc::now() - Duration::minutes(10);
        repo.save(&original).unwrap();

        let enhanced = ArticleRecord::new_enhanced(
            &original,
            "<h2>Intro</h2><p>rewritten content</p>".to_string(),
            Vec::new(),
        );
        repo.save(&enhanced).unwrap();

        let all = repo.list(ArticleFilter::All, None).unwrap();
        assert_eq!(all.len(), 2);
        // Newest first.
        assert_eq!(all[0].id, enhanced.id);

        let originals = repo.list(ArticleFilter::Originals, None).unwrap();
        assert_eq!(originals.len(), 1);
        assert_eq!(originals[0].id, original.id);

        let enhanced_only = repo.list(ArticleFilter::Enhanced, None).unwrap();
        assert_eq!(enhanced_only.len(), 1);
        assert_eq!(enhanced_only[0].id, enhanced.id);

        let limited = repo.list(ArticleFilter::All, Some(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_count_by_kind() {
        let (_dir, repo) = test_repo();

        let original = sample_original("https://example.com/blogs/post");
        repo.save(&original).unwrap();
        let enhanced = ArticleRecord::new_enhanced(
            &original,
            "<h2>Intro</h2><p>rewritten content</p>".to_string(),
            Vec::new(),
        );
        repo.save(&enhanced).unwrap();

        assert_eq!(repo.count_by_kind().unwrap(), (1, 1));
        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.count_awaiting_enhancement().unwrap(), 0);

        let pending = sample_original("https://example.com/blogs/pending");
        repo.save(&pending).unwrap();
        assert_eq!(repo.count_awaiting_enhancement().unwrap(), 1);
    }

    #[test]
    fn test_find_by_id_prefix() {
        let (_dir, repo) = test_repo();

        let article = sample_original("https://example.com/blogs/post");
        repo.save(&article).unwrap();

        let found = repo.find_by_id_prefix(&article.id[..8]).unwrap().unwrap();
        assert_eq!(found.id, article.id);

        assert!(repo.find_by_id_prefix("zzzzzzzz").unwrap().is_none());

        // A prefix matching more than one article resolves to nothing.
        let other = sample_original("https://example.com/blogs/other");
        repo.save(&other).unwrap();
        assert!(repo.find_by_id_prefix("").unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_article() {
        let (_dir, repo) = test_repo();
        let article = sample_original("https://example.com/blogs/post");
        repo.save(&article).unwrap();

        assert!(repo.delete(&article.id).unwrap());
        assert!(repo.get(&article.id).unwrap().is_none());
        assert!(!repo.delete(&article.id).unwrap());
    }
}
