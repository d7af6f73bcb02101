use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mercury_core::{Article, ArticleStorage, DiscoveryMethod, Error, Result};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        story_id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        content TEXT NOT NULL,
        publish_date TEXT NOT NULL,
        discovered_date TEXT NOT NULL,
        relevance_score REAL NOT NULL,
        discovery_method TEXT NOT NULL,
        source TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_discovered ON articles (discovered_date)",
    // Add future migrations here
];

const SELECT_COLUMNS: &str = "SELECT story_id, title, url, content, publish_date, discovered_date, \
     relevance_score, discovery_method, source FROM articles";

// Fixed-width timestamps so text comparison matches time order.
fn timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn db_error(context: &str, e: sqlx::Error) -> Error {
    Error::Database(format!("{}: {}", context, e))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let discovered: String = row.get("discovered_date");
    let method: String = row.get("discovery_method");
    Ok(Article {
        story_id: row.get("story_id"),
        title: row.get("title"),
        url: row.get("url"),
        content: row.get("content"),
        publish_date: row.get("publish_date"),
        discovered_date: DateTime::parse_from_rfc3339(&discovered)
            .map_err(|e| Error::Parse(format!("Failed to parse date: {}", e)))?
            .with_timezone(&Utc),
        relevance_score: row.get("relevance_score"),
        discovery_method: method.parse()?,
        source: row.get("source"),
    })
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }
        debug!(path = %db_path.display(), "SQLite storage ready");

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }

    async fn fetch_articles<'q>(
        &self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Result<Vec<Article>> {
        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to query articles", e))?;
        rows.iter().map(row_to_article).collect()
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_all(&self, articles: &[Article]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to open transaction", e))?;

        for article in articles {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO articles
                (story_id, title, url, content, publish_date, discovered_date,
                 relevance_score, discovery_method, source)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(article.story_id)
            .bind(&article.title)
            .bind(&article.url)
            .bind(&article.content)
            .bind(&article.publish_date)
            .bind(timestamp(&article.discovered_date))
            .bind(article.relevance_score)
            .bind(article.discovery_method.to_string())
            .bind(&article.source)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to store article", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit articles", e))
    }

    // SQLite's LOWER and LIKE only fold ASCII, so matching happens here with
    // the same Unicode rules as the other backends.
    async fn find_by_text(&self, query: &str) -> Result<Vec<Article>> {
        let sql = format!(
            "{} ORDER BY relevance_score DESC, discovered_date DESC",
            SELECT_COLUMNS
        );
        let articles = self.fetch_articles(sqlx::query(&sql)).await?;
        Ok(articles.into_iter().filter(|a| a.mentions(query)).collect())
    }

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>> {
        let sql = format!(
            "{} WHERE discovered_date >= ? ORDER BY relevance_score DESC",
            SELECT_COLUMNS
        );
        self.fetch_articles(sqlx::query(&sql).bind(timestamp(&since))).await
    }

    async fn find_by_story_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Article>> {
        let sql = format!(
            "{} WHERE story_id BETWEEN ? AND ? ORDER BY story_id",
            SELECT_COLUMNS
        );
        self.fetch_articles(sqlx::query(&sql).bind(start_id).bind(end_id)).await
    }

    async fn find_by_discovery_method(&self, method: DiscoveryMethod) -> Result<Vec<Article>> {
        let sql = format!("{} WHERE discovery_method = ?", SELECT_COLUMNS);
        self.fetch_articles(sqlx::query(&sql).bind(method.to_string())).await
    }

    async fn find_max_story_id(&self) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(story_id) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to read max story id", e))
    }

    async fn find_min_story_id(&self) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MIN(story_id) FROM articles")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error("Failed to read min story id", e))
    }
}
