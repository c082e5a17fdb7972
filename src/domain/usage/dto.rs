use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::domain::user::SubscriptionTier;

/// Remaining allowance for the current day: a count for free-tier users,
/// the literal string "unlimited" for premium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Unlimited,
    Count(i32),
}

impl Serialize for Remaining {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
            Remaining::Count(n) => serializer.serialize_i32(*n),
        }
    }
}

/// Response for GET /api/usage/stats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatsResponse {
    pub subscription_tier: SubscriptionTier,
    pub daily_usage: DailyUsageDto,
    /// None (null) for premium users, whose counters are never consulted
    pub prompts_left: Option<i32>,
    pub remaining_prompts: Remaining,
    pub can_use_prompt: bool,
    pub daily_limit: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsageDto {
    pub count: i32,
    pub last_reset: DateTime<Utc>,
}

/// Response for GET /api/usage/can-use
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCheckResponse {
    pub can_use: bool,
    pub remaining_prompts: Remaining,
}

/// Response for POST /api/usage/use-prompt. Exhaustion is a business
/// outcome, not a fault: the endpoint answers 200 with `success: false`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeResponse {
    pub success: bool,
    pub remaining_prompts: Remaining,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response for POST /api/reset/usage/:userId
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    pub prompts_left: i32,
}
