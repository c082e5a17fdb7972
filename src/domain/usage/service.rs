use super::dto::{DailyUsageDto, Remaining, UsageStatsResponse};
use super::reset::DailyResetPolicy;
use crate::domain::user::SubscriptionTier;
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{UsageRecord, UsageStore};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Bounded retries for store-level write conflicts on the consume path
const MAX_CONSUME_ATTEMPTS: u32 = 3;

/// Result of a gating probe (GET /api/usage/can-use)
#[derive(Debug, Clone)]
pub struct UsageCheck {
    pub can_use: bool,
    pub remaining: Remaining,
    pub record: UsageRecord,
}

/// Result of consuming one prompt. Exhaustion is an explicit business
/// outcome, distinct from thrown faults.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    Granted {
        remaining: Remaining,
        record: UsageRecord,
    },
    Exhausted {
        record: UsageRecord,
    },
}

impl ConsumeOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, ConsumeOutcome::Granted { .. })
    }
}

/// Entitlement engine: decides whether a user may call the generation
/// oracle and owns all mutation of the daily quota counters.
///
/// The daily limit is injected rather than hardcoded so it can be varied
/// per deployment and in tests.
pub struct UsageService {
    store: Arc<dyn UsageStore>,
    daily_limit: i32,
    reset_policy: DailyResetPolicy,
}

impl UsageService {
    pub fn new(store: Arc<dyn UsageStore>, daily_limit: i32, reset_policy: DailyResetPolicy) -> Self {
        Self {
            store,
            daily_limit,
            reset_policy,
        }
    }

    /// Load a user's record, normalizing stale-day counters first.
    ///
    /// The reset is persisted before the record is returned, so no gating
    /// decision is ever made against yesterday's exhausted counter.
    async fn load_fresh(&self, user_id: Uuid) -> AppResult<UsageRecord> {
        let record = self
            .store
            .load(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // Premium counters are irrelevant and never reset
        if record.subscription_tier == SubscriptionTier::Free {
            let now = Utc::now();
            if self.reset_policy.should_reset(record.last_reset_at, now) {
                tracing::info!(user_id = %user_id, "Performing daily usage reset");
                let record = self.store.reset(user_id, self.daily_limit, now).await?;
                tracing::info!(
                    user_id = %user_id,
                    prompts_left = record.prompts_left,
                    "Daily usage reset complete"
                );
                return Ok(record);
            }
        }

        Ok(record)
    }

    /// Read-mostly "can this user proceed" check; mutates stored state only
    /// through the normalization reset
    pub async fn evaluate(&self, user_id: Uuid) -> AppResult<UsageCheck> {
        let record = self.load_fresh(user_id).await?;

        if record.subscription_tier == SubscriptionTier::Premium {
            return Ok(UsageCheck {
                can_use: true,
                remaining: Remaining::Unlimited,
                record,
            });
        }

        Ok(UsageCheck {
            can_use: record.prompts_left > 0,
            remaining: Remaining::Count(record.prompts_left),
            record,
        })
    }

    /// Consume one prompt: check-and-decrement, serialized per user key by
    /// the store's atomic conditional update. A denied consumption leaves
    /// the stored record untouched.
    pub async fn consume(&self, user_id: Uuid) -> AppResult<ConsumeOutcome> {
        let record = self.load_fresh(user_id).await?;

        if record.subscription_tier == SubscriptionTier::Premium {
            return Ok(ConsumeOutcome::Granted {
                remaining: Remaining::Unlimited,
                record,
            });
        }

        if record.prompts_left <= 0 {
            return Ok(ConsumeOutcome::Exhausted { record });
        }

        let mut attempt = 0;
        loop {
            match self.store.try_consume(user_id).await {
                Ok(Some(prompts_left)) => {
                    let record = UsageRecord {
                        prompts_left,
                        daily_usage_count: record.daily_usage_count + 1,
                        ..record
                    };
                    return Ok(ConsumeOutcome::Granted {
                        remaining: Remaining::Count(prompts_left),
                        record,
                    });
                }
                // A concurrent request took the last unit between our check
                // and the decrement
                Ok(None) => return Ok(ConsumeOutcome::Exhausted { record }),
                Err(AppError::Conflict(msg)) => {
                    attempt += 1;
                    if attempt >= MAX_CONSUME_ATTEMPTS {
                        return Err(AppError::Conflict(msg));
                    }
                    tracing::warn!(
                        user_id = %user_id,
                        attempt,
                        "Write conflict while consuming prompt, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Administrative reset: reinitialize a free-tier record, no-op for
    /// premium
    pub async fn reset(&self, user_id: Uuid) -> AppResult<UsageRecord> {
        let record = self
            .store
            .load(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if record.subscription_tier != SubscriptionTier::Free {
            return Ok(record);
        }

        self.store.reset(user_id, self.daily_limit, Utc::now()).await
    }

    /// Detailed usage stats; normalizes stale counters as a side effect of
    /// the read
    pub async fn stats(&self, user_id: Uuid) -> AppResult<UsageStatsResponse> {
        let record = self.load_fresh(user_id).await?;
        let premium = record.subscription_tier == SubscriptionTier::Premium;

        Ok(UsageStatsResponse {
            subscription_tier: record.subscription_tier,
            daily_usage: DailyUsageDto {
                count: record.daily_usage_count,
                last_reset: record.last_reset_at,
            },
            prompts_left: (!premium).then_some(record.prompts_left),
            remaining_prompts: if premium {
                Remaining::Unlimited
            } else {
                Remaining::Count(record.prompts_left)
            },
            can_use_prompt: premium || record.prompts_left > 0,
            daily_limit: (!premium).then_some(self.daily_limit),
        })
    }
}
