use super::dto::Remaining;
use super::service::{ConsumeOutcome, UsageService};
use crate::domain::user::SubscriptionTier;
use crate::error::{AppError, AppResult};
use crate::infrastructure::auth::AuthUser;
use crate::infrastructure::repositories::UsageRecord;
use serde::Serialize;

/// Fixed allowance label attached to guest requests; guests get one
/// generation per request with no persisted tracking
pub const GUEST_ALLOWANCE: &str = "unlimited (1 question per quiz)";

/// Outcome of the usage gate, selected once per request from the explicit
/// identity-resolution result
#[derive(Debug, Clone)]
pub enum EntitlementDecision {
    /// Unauthenticated caller: unconditional grant, no user, no quota state
    GuestGrant,
    /// Authenticated caller whose `consume` succeeded
    MeteredGrant {
        record: UsageRecord,
        remaining: Remaining,
    },
}

/// Allowance as rendered on the wire: a count, "unlimited", or the guest
/// label
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Allowance {
    Metered(Remaining),
    Fixed(&'static str),
}

impl EntitlementDecision {
    pub fn tier(&self) -> Option<SubscriptionTier> {
        match self {
            EntitlementDecision::GuestGrant => None,
            EntitlementDecision::MeteredGrant { record, .. } => Some(record.subscription_tier),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, EntitlementDecision::GuestGrant)
    }

    pub fn allowance(&self) -> Allowance {
        match self {
            EntitlementDecision::GuestGrant => Allowance::Fixed(GUEST_ALLOWANCE),
            EntitlementDecision::MeteredGrant { remaining, .. } => Allowance::Metered(*remaining),
        }
    }
}

/// Admit or reject one generation request.
///
/// The quota unit is consumed here, on admission, before the generation
/// handler runs; a failed or slow downstream call does not refund it. On
/// exhaustion the request terminates with `QuotaExceeded` and the handler
/// never runs.
pub async fn authorize(
    usage: &UsageService,
    identity: Option<&AuthUser>,
) -> AppResult<EntitlementDecision> {
    let Some(auth_user) = identity else {
        return Ok(EntitlementDecision::GuestGrant);
    };

    match usage.consume(auth_user.user_id).await? {
        ConsumeOutcome::Granted { remaining, record } => {
            Ok(EntitlementDecision::MeteredGrant { record, remaining })
        }
        ConsumeOutcome::Exhausted { .. } => Err(AppError::QuotaExceeded { remaining: 0 }),
    }
}
