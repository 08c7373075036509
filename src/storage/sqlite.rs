use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{AssessmentRecord, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory instance, mainly for tests.
    ///
    /// Every connection to `:memory:` opens a separate database, so the pool
    /// is pinned to a single connection.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_json<T: serde::Serialize>(record_id: &str, value: &T) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Corrupt {
        record_id: record_id.to_string(),
        message: format!("Failed to serialize: {}", e),
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save(&self, record: &AssessmentRecord) -> StorageResult<()> {
        let answers = to_json(&record.id, &record.answers)?;
        let category_scores = to_json(&record.id, &record.category_scores)?;
        let suggestions = to_json(&record.id, &record.suggestions)?;

        sqlx::query(
            r#"
            INSERT INTO assessments (id, user_id, answers, total_score, category_scores, suggestions, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&answers)
        .bind(record.total_score)
        .bind(&category_scores)
        .bind(&suggestions)
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .execute(&self.pool)
        .await?;

        debug!(assessment_id = %record.id, user_id = %record.user_id, "Assessment stored");
        Ok(())
    }

    async fn find_latest_by_user(&self, user_id: &str) -> StorageResult<Option<AssessmentRecord>> {
        let row: Option<AssessmentRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, answers, total_score, category_scores, suggestions, created_at
            FROM assessments
            WHERE user_id = ?
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AssessmentRecord::try_from).transpose()
    }

    async fn count_by_user(&self, user_id: &str) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assessments WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct AssessmentRow {
    id: String,
    user_id: String,
    answers: String,
    total_score: i64,
    category_scores: String,
    suggestions: String,
    created_at: String,
}

impl TryFrom<AssessmentRow> for AssessmentRecord {
    type Error = StorageError;

    fn try_from(row: AssessmentRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| StorageError::Corrupt {
            record_id: row.id.clone(),
            message: format!("{}: {}", field, e),
        };

        let answers = serde_json::from_str(&row.answers).map_err(|e| corrupt("answers", &e))?;
        let category_scores = serde_json::from_str(&row.category_scores)
            .map_err(|e| corrupt("category_scores", &e))?;
        let suggestions =
            serde_json::from_str(&row.suggestions).map_err(|e| corrupt("suggestions", &e))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| corrupt("created_at", &e))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            answers,
            total_score: row.total_score,
            category_scores,
            suggestions,
            created_at,
        })
    }
}
