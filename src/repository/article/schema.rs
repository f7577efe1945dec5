//! Database schema initialization.

use super::ArticleRepository;
use crate::repository::Result;

impl ArticleRepository {
    /// Initialize the database schema.
    pub(crate) fn init_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author TEXT NOT NULL,
                date TEXT NOT NULL,
                url TEXT NOT NULL,
                is_updated INTEGER NOT NULL DEFAULT 0,
                original_article_id TEXT,
                reference_list TEXT,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_url
                ON articles(url);
            CREATE INDEX IF NOT EXISTS idx_articles_kind_created
                ON articles(is_updated, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_articles_original
                ON articles(original_article_id)
                WHERE original_article_id IS NOT NULL;
        "#,
        )?;
        Ok(())
    }
}
