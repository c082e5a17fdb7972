use crate::domain::user::SubscriptionTier;
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Usage-owned subset of the users row. This is the only mutable shared
/// state of the entitlement engine; counters are meaningful for the free
/// tier only.
#[derive(Debug, Clone, FromRow)]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub subscription_tier: SubscriptionTier,
    pub prompts_left: i32,
    pub daily_usage_count: i32,
    pub last_reset_at: DateTime<Utc>,
}

/// Durable store for usage records.
/// Abstracts the underlying database so the entitlement engine can be
/// exercised against an in-memory implementation in tests.
///
/// Implementations are responsible for:
/// - Serializing the read-check-write of `try_consume` per user key
///   (row-level atomic update, mutex, or equivalent)
/// - Persisting resets before returning
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Load the usage record for a user, or None if the user is unknown
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UsageRecord>>;

    /// Reinitialize the daily counters and persist.
    ///
    /// Sets `prompts_left = prompts_left_value`, `daily_usage_count = 0`,
    /// `last_reset_at = now`. Returns the record as stored.
    async fn reset(
        &self,
        user_id: Uuid,
        prompts_left: i32,
        now: DateTime<Utc>,
    ) -> AppResult<UsageRecord>;

    /// Atomically consume one prompt if any remain.
    ///
    /// Decrements `prompts_left` and increments `daily_usage_count` in a
    /// single conditional update. Returns `Some(prompts_left_after)` on
    /// success, `None` when the quota was already exhausted (in which case
    /// the stored record is untouched).
    async fn try_consume(&self, user_id: Uuid) -> AppResult<Option<i32>>;
}
