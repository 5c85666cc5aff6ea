use crate::core::BlockStore;
use crate::error::RecommendError;
use crate::models::BlockRecord;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
}

/// PostgreSQL client for recommendation blocks
///
/// Blocks are append-only: a student dismissing the same alumnus twice
/// leaves two rows, and nothing in this service deletes them.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Append a block for a student
    pub async fn record_block(&self, block: &BlockRecord) -> Result<(), PostgresError> {
        let query = r#"
            INSERT INTO recommendation_blocks (student_id, alumni_id, blocked_at)
            VALUES ($1, $2, $3)
        "#;

        sqlx::query(query)
            .bind(&block.student_id)
            .bind(&block.alumni_id)
            .bind(block.blocked_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded block: {} -> {}",
            block.student_id,
            block.alumni_id
        );

        Ok(())
    }

    /// Distinct alumni ids a student has blocked
    pub async fn get_blocked_alumni(&self, student_id: &str) -> Result<Vec<String>, PostgresError> {
        let query = r#"
            SELECT DISTINCT alumni_id
            FROM recommendation_blocks
            WHERE student_id = $1
        "#;

        let rows = sqlx::query(query).bind(student_id).fetch_all(&self.pool).await?;

        let blocked: Vec<String> = rows.iter().map(|row| row.get("alumni_id")).collect();

        tracing::debug!("Student {} has blocked {} alumni", student_id, blocked.len());

        Ok(blocked)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl BlockStore for PostgresClient {
    async fn get_blocks(&self, student_id: &str) -> Result<HashSet<String>, RecommendError> {
        Ok(self.get_blocked_alumni(student_id).await?.into_iter().collect())
    }

    async fn add_block(&self, student_id: &str, alumni_id: &str) -> Result<(), RecommendError> {
        let block = BlockRecord {
            student_id: student_id.to_string(),
            alumni_id: alumni_id.to_string(),
            blocked_at: chrono::Utc::now(),
        };
        Ok(self.record_block(&block).await?)
    }

    async fn ping(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }
}
