use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::usage::{
        ConsumeOutcome, ConsumeResponse, Remaining, ResetResponse, UsageCheckResponse,
        UsageService, UsageStatsResponse,
    },
    error::{AppError, AppResult},
    infrastructure::auth::AuthUser,
};

const LIMIT_REACHED_MESSAGE: &str =
    "Daily prompt limit reached. Upgrade to premium for unlimited access.";

pub struct UsageController {
    usage_service: Arc<UsageService>,
}

impl UsageController {
    pub fn new(usage_service: Arc<UsageService>) -> Self {
        Self { usage_service }
    }

    /// GET /api/usage/stats - Detailed usage stats for the caller
    pub async fn get_stats(
        State(controller): State<Arc<UsageController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<UsageStatsResponse>> {
        let stats = controller.usage_service.stats(auth_user.user_id).await?;
        Ok(Json(stats))
    }

    /// GET /api/usage/can-use - Gating probe, no consumption
    pub async fn can_use(
        State(controller): State<Arc<UsageController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<UsageCheckResponse>> {
        let check = controller.usage_service.evaluate(auth_user.user_id).await?;
        Ok(Json(UsageCheckResponse {
            can_use: check.can_use,
            remaining_prompts: check.remaining,
        }))
    }

    /// POST /api/usage/use-prompt - Consume one prompt. Exhaustion is
    /// reported as `success: false` in a 200 body, not as a fault.
    pub async fn use_prompt(
        State(controller): State<Arc<UsageController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<ConsumeResponse>> {
        let response = match controller.usage_service.consume(auth_user.user_id).await? {
            ConsumeOutcome::Granted { remaining, .. } => ConsumeResponse {
                success: true,
                remaining_prompts: remaining,
                error: None,
            },
            ConsumeOutcome::Exhausted { .. } => ConsumeResponse {
                success: false,
                remaining_prompts: Remaining::Count(0),
                error: Some(LIMIT_REACHED_MESSAGE.to_string()),
            },
        };

        Ok(Json(response))
    }

    /// POST /api/reset/usage/:userId - Administrative reset.
    ///
    /// Callers may only reset their own usage; resetting another user's
    /// counters is forbidden.
    pub async fn reset_usage(
        State(controller): State<Arc<UsageController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(user_id): Path<Uuid>,
    ) -> AppResult<Json<ResetResponse>> {
        if auth_user.user_id != user_id {
            return Err(AppError::Forbidden(
                "Cannot reset usage for another user".to_string(),
            ));
        }

        let record = controller.usage_service.reset(user_id).await?;

        tracing::info!(
            user_id = %user_id,
            prompts_left = record.prompts_left,
            "Usage reset"
        );

        Ok(Json(ResetResponse {
            success: true,
            message: "Usage reset successfully".to_string(),
            prompts_left: record.prompts_left,
        }))
    }
}
