use super::usage_store::{UsageRecord, UsageStore};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Postgres-backed usage store. Counters live on the users table; the
/// conditional UPDATE in `try_consume` is what makes concurrent consumes
/// for the same user linearizable.
pub struct PgUsageStore {
    pool: Arc<DbPool>,
}

impl PgUsageStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageStore for PgUsageStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UsageRecord>> {
        let pool = self.pool.as_ref();

        let record = sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT id AS user_id, subscription_tier, prompts_left, daily_usage_count, last_reset_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    async fn reset(
        &self,
        user_id: Uuid,
        prompts_left: i32,
        now: DateTime<Utc>,
    ) -> AppResult<UsageRecord> {
        let pool = self.pool.as_ref();

        let record = sqlx::query_as::<_, UsageRecord>(
            r#"
            UPDATE users
            SET prompts_left = $2, daily_usage_count = 0, last_reset_at = $3, updated_at = $3
            WHERE id = $1
            RETURNING id AS user_id, subscription_tier, prompts_left, daily_usage_count, last_reset_at
            "#,
        )
        .bind(user_id)
        .bind(prompts_left)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    async fn try_consume(&self, user_id: Uuid) -> AppResult<Option<i32>> {
        let pool = self.pool.as_ref();
        let now = Utc::now();

        // Decrement-with-floor: the WHERE clause distinguishes success from
        // exhaustion by whether a row comes back, and Postgres row locking
        // serializes concurrent decrements for the same user.
        let remaining = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET prompts_left = prompts_left - 1,
                daily_usage_count = daily_usage_count + 1,
                updated_at = $2
            WHERE id = $1 AND prompts_left > 0
            RETURNING prompts_left
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(remaining)
    }
}
