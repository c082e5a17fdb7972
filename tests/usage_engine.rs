use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use quizgen_backend::domain::usage::{
    authorize, Allowance, ConsumeOutcome, DailyResetPolicy, EntitlementDecision, Remaining,
    UsageService, GUEST_ALLOWANCE,
};
use quizgen_backend::domain::user::SubscriptionTier;
use quizgen_backend::error::{AppError, AppResult};
use quizgen_backend::infrastructure::auth::AuthUser;
use quizgen_backend::infrastructure::repositories::{UsageRecord, UsageStore};

const DAILY_LIMIT: i32 = 3;

/// In-memory usage store. The mutex held across the read-check-write in
/// `try_consume` gives the same per-key serialization the Postgres store
/// gets from its conditional UPDATE.
#[derive(Default)]
struct MemoryUsageStore {
    records: Mutex<HashMap<Uuid, UsageRecord>>,
}

impl MemoryUsageStore {
    async fn insert(&self, record: UsageRecord) {
        self.records.lock().await.insert(record.user_id, record);
    }

    async fn get(&self, user_id: Uuid) -> UsageRecord {
        self.records
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .expect("record should exist")
    }
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UsageRecord>> {
        Ok(self.records.lock().await.get(&user_id).cloned())
    }

    async fn reset(
        &self,
        user_id: Uuid,
        prompts_left: i32,
        now: DateTime<Utc>,
    ) -> AppResult<UsageRecord> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        record.prompts_left = prompts_left;
        record.daily_usage_count = 0;
        record.last_reset_at = now;
        Ok(record.clone())
    }

    async fn try_consume(&self, user_id: Uuid) -> AppResult<Option<i32>> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if record.prompts_left <= 0 {
            return Ok(None);
        }
        record.prompts_left -= 1;
        record.daily_usage_count += 1;
        Ok(Some(record.prompts_left))
    }
}

/// Store wrapper that fails `try_consume` with a write conflict a fixed
/// number of times before delegating
struct ConflictingStore {
    inner: Arc<MemoryUsageStore>,
    failures_left: AtomicU32,
}

#[async_trait]
impl UsageStore for ConflictingStore {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<UsageRecord>> {
        self.inner.load(user_id).await
    }

    async fn reset(
        &self,
        user_id: Uuid,
        prompts_left: i32,
        now: DateTime<Utc>,
    ) -> AppResult<UsageRecord> {
        self.inner.reset(user_id, prompts_left, now).await
    }

    async fn try_consume(&self, user_id: Uuid) -> AppResult<Option<i32>> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(AppError::Conflict("concurrent write".to_string()));
        }
        self.inner.try_consume(user_id).await
    }
}

fn free_record(user_id: Uuid, prompts_left: i32, last_reset_at: DateTime<Utc>) -> UsageRecord {
    UsageRecord {
        user_id,
        subscription_tier: SubscriptionTier::Free,
        prompts_left,
        daily_usage_count: DAILY_LIMIT - prompts_left,
        last_reset_at,
    }
}

fn premium_record(user_id: Uuid) -> UsageRecord {
    UsageRecord {
        user_id,
        subscription_tier: SubscriptionTier::Premium,
        prompts_left: 0,
        daily_usage_count: 0,
        last_reset_at: Utc::now(),
    }
}

fn service(store: Arc<MemoryUsageStore>) -> UsageService {
    let policy = DailyResetPolicy::new(chrono::FixedOffset::east_opt(0).unwrap());
    UsageService::new(store, DAILY_LIMIT, policy)
}

fn remaining_count(outcome: &ConsumeOutcome) -> i32 {
    match outcome {
        ConsumeOutcome::Granted {
            remaining: Remaining::Count(n),
            ..
        } => *n,
        other => panic!("expected a counted grant, got {:?}", other),
    }
}

#[tokio::test]
async fn consume_counts_down_then_exhausts() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store
        .insert(free_record(user_id, DAILY_LIMIT, Utc::now()))
        .await;
    let usage = service(store.clone());

    // Three sequential consumes count down 2, 1, 0
    for expected in (0..DAILY_LIMIT).rev() {
        let outcome = usage.consume(user_id).await.unwrap();
        assert_eq!(remaining_count(&outcome), expected);
    }

    // The fourth consume the same day is exhausted and prompts_left stays 0
    let outcome = usage.consume(user_id).await.unwrap();
    assert!(!outcome.is_granted());
    assert_eq!(store.get(user_id).await.prompts_left, 0);
}

#[tokio::test]
async fn rejected_consume_leaves_the_record_untouched() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    let last_reset = Utc::now();
    store.insert(free_record(user_id, 0, last_reset)).await;
    let usage = service(store.clone());

    let outcome = usage.consume(user_id).await.unwrap();
    assert!(!outcome.is_granted());

    let stored = store.get(user_id).await;
    assert_eq!(stored.prompts_left, 0);
    assert_eq!(stored.daily_usage_count, DAILY_LIMIT);
    assert_eq!(stored.last_reset_at, last_reset);
}

#[tokio::test]
async fn premium_consumes_always_succeed_without_mutation() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store.insert(premium_record(user_id)).await;
    let usage = service(store.clone());

    for _ in 0..10 {
        match usage.consume(user_id).await.unwrap() {
            ConsumeOutcome::Granted { remaining, .. } => {
                assert_eq!(remaining, Remaining::Unlimited)
            }
            ConsumeOutcome::Exhausted { .. } => panic!("premium consume must not exhaust"),
        }
    }

    let stored = store.get(user_id).await;
    assert_eq!(stored.prompts_left, 0);
    assert_eq!(stored.daily_usage_count, 0);
}

#[tokio::test]
async fn reset_happens_once_per_day() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store
        .insert(free_record(user_id, 0, Utc::now() - Duration::days(1)))
        .await;
    let usage = service(store.clone());

    let check = usage.evaluate(user_id).await.unwrap();
    assert!(check.can_use);
    let reset_at = store.get(user_id).await.last_reset_at;

    // Repeated reads the same day do not reset again
    usage.evaluate(user_id).await.unwrap();
    usage.stats(user_id).await.unwrap();
    assert_eq!(store.get(user_id).await.last_reset_at, reset_at);
}

#[tokio::test]
async fn day_boundary_replenishes_an_exhausted_record() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store
        .insert(free_record(user_id, 0, Utc::now() - Duration::days(1)))
        .await;
    let usage = service(store.clone());

    let check = usage.evaluate(user_id).await.unwrap();
    assert!(check.can_use);
    assert_eq!(check.remaining, Remaining::Count(DAILY_LIMIT));
    assert_eq!(store.get(user_id).await.prompts_left, DAILY_LIMIT);
}

#[tokio::test]
async fn stats_normalizes_a_stale_record_as_a_side_effect() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store
        .insert(free_record(user_id, 0, Utc::now() - Duration::days(2)))
        .await;
    let usage = service(store.clone());

    let stats = usage.stats(user_id).await.unwrap();
    assert_eq!(stats.prompts_left, Some(DAILY_LIMIT));
    assert!(stats.can_use_prompt);
    assert_eq!(stats.daily_limit, Some(DAILY_LIMIT));

    let stored = store.get(user_id).await;
    assert_eq!(stored.prompts_left, DAILY_LIMIT);
    assert_eq!(stored.daily_usage_count, 0);
}

#[tokio::test]
async fn concurrent_consumes_never_overdraw() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store
        .insert(free_record(user_id, DAILY_LIMIT, Utc::now()))
        .await;
    let usage = Arc::new(service(store.clone()));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let usage = usage.clone();
            tokio::spawn(async move { usage.consume(user_id).await })
        })
        .collect();

    let mut granted = 0;
    let mut exhausted = 0;
    for task in futures::future::join_all(tasks).await {
        match task.unwrap().unwrap() {
            ConsumeOutcome::Granted { .. } => granted += 1,
            ConsumeOutcome::Exhausted { .. } => exhausted += 1,
        }
    }

    assert_eq!(granted, DAILY_LIMIT);
    assert_eq!(exhausted, 8 - DAILY_LIMIT);
    assert_eq!(store.get(user_id).await.prompts_left, 0);
}

#[tokio::test]
async fn guest_grants_are_constant_and_touch_no_state() {
    let store = Arc::new(MemoryUsageStore::default());
    let usage = service(store.clone());

    for _ in 0..5 {
        let decision = authorize(&usage, None).await.unwrap();
        assert!(decision.is_guest());
        match decision.allowance() {
            Allowance::Fixed(label) => assert_eq!(label, GUEST_ALLOWANCE),
            Allowance::Metered(_) => panic!("guest allowance must be the fixed label"),
        }
    }

    assert!(store.records.lock().await.is_empty());
}

#[tokio::test]
async fn gate_rejects_exhausted_users_with_quota_exceeded() {
    let store = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    store.insert(free_record(user_id, 1, Utc::now())).await;
    let usage = service(store.clone());

    let identity = AuthUser {
        user_id,
        email: "user@example.com".to_string(),
    };

    let decision = authorize(&usage, Some(&identity)).await.unwrap();
    assert!(matches!(
        decision,
        EntitlementDecision::MeteredGrant {
            remaining: Remaining::Count(0),
            ..
        }
    ));

    let err = authorize(&usage, Some(&identity)).await.unwrap_err();
    assert!(matches!(err, AppError::QuotaExceeded { remaining: 0 }));
    // The rejected attempt consumed nothing
    assert_eq!(store.get(user_id).await.daily_usage_count, 3);
}

#[tokio::test]
async fn administrative_reset_replenishes_free_users_only() {
    let store = Arc::new(MemoryUsageStore::default());
    let free_id = Uuid::new_v4();
    let premium_id = Uuid::new_v4();
    store.insert(free_record(free_id, 1, Utc::now())).await;
    store.insert(premium_record(premium_id)).await;
    let usage = service(store.clone());

    usage.consume(free_id).await.unwrap();

    let record = usage.reset(free_id).await.unwrap();
    assert_eq!(record.prompts_left, DAILY_LIMIT);
    assert_eq!(record.daily_usage_count, 0);

    // No-op for premium: counters stay as they were
    let before = store.get(premium_id).await;
    let record = usage.reset(premium_id).await.unwrap();
    assert_eq!(record.prompts_left, before.prompts_left);
    assert_eq!(record.last_reset_at, before.last_reset_at);
}

#[tokio::test]
async fn unknown_users_are_reported_not_found() {
    let store = Arc::new(MemoryUsageStore::default());
    let usage = service(store);
    let user_id = Uuid::new_v4();

    assert!(matches!(
        usage.evaluate(user_id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        usage.consume(user_id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        usage.reset(user_id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn write_conflicts_are_retried_within_bounds() {
    let inner = Arc::new(MemoryUsageStore::default());
    let user_id = Uuid::new_v4();
    inner
        .insert(free_record(user_id, DAILY_LIMIT, Utc::now()))
        .await;

    // Two conflicts fit inside the three-attempt budget
    let store = Arc::new(ConflictingStore {
        inner: inner.clone(),
        failures_left: AtomicU32::new(2),
    });
    let policy = DailyResetPolicy::new(chrono::FixedOffset::east_opt(0).unwrap());
    let usage = UsageService::new(store, DAILY_LIMIT, policy);

    let outcome = usage.consume(user_id).await.unwrap();
    assert_eq!(remaining_count(&outcome), DAILY_LIMIT - 1);

    // A conflict on every attempt surfaces after the budget is spent
    let store = Arc::new(ConflictingStore {
        inner,
        failures_left: AtomicU32::new(u32::MAX),
    });
    let usage = UsageService::new(store, DAILY_LIMIT, policy);
    assert!(matches!(
        usage.consume(user_id).await.unwrap_err(),
        AppError::Conflict(_)
    ));
}

#[tokio::test]
async fn stats_serialize_with_the_mobile_wire_contract() {
    let store = Arc::new(MemoryUsageStore::default());
    let free_id = Uuid::new_v4();
    let premium_id = Uuid::new_v4();
    store.insert(free_record(free_id, 2, Utc::now())).await;
    store.insert(premium_record(premium_id)).await;
    let usage = service(store);

    let json = serde_json::to_value(usage.stats(free_id).await.unwrap()).unwrap();
    assert_eq!(json["subscriptionTier"], "free");
    assert_eq!(json["promptsLeft"], 2);
    assert_eq!(json["remainingPrompts"], 2);
    assert_eq!(json["canUsePrompt"], true);
    assert_eq!(json["dailyLimit"], DAILY_LIMIT);
    assert_eq!(json["dailyUsage"]["count"], 1);

    let json = serde_json::to_value(usage.stats(premium_id).await.unwrap()).unwrap();
    assert_eq!(json["subscriptionTier"], "premium");
    assert_eq!(json["promptsLeft"], serde_json::Value::Null);
    assert_eq!(json["remainingPrompts"], "unlimited");
    assert_eq!(json["canUsePrompt"], true);
    assert_eq!(json["dailyLimit"], serde_json::Value::Null);
}
