use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::{
        quiz::{GenerateQuizRequest, GenerateQuizResponse, QuizService},
        usage::{authorize, UsageService},
    },
    error::{AppError, AppResult},
    infrastructure::auth::MaybeAuthUser,
};

pub struct QuizController {
    quiz_service: Arc<QuizService>,
    usage_service: Arc<UsageService>,
}

impl QuizController {
    pub fn new(quiz_service: Arc<QuizService>, usage_service: Arc<UsageService>) -> Self {
        Self {
            quiz_service,
            usage_service,
        }
    }

    /// POST /api/quiz/generate - Quota-gated quiz generation.
    ///
    /// The gate consumes the quota unit before the oracle is called, so a
    /// failed generation does not refund it. Guests pass the gate
    /// unconditionally and are capped at one question by the quiz service.
    pub async fn generate(
        State(controller): State<Arc<QuizController>>,
        Extension(MaybeAuthUser(identity)): Extension<MaybeAuthUser>,
        Json(request): Json<GenerateQuizRequest>,
    ) -> AppResult<Json<GenerateQuizResponse>> {
        let decision = authorize(&controller.usage_service, identity.as_ref()).await?;

        let quiz = controller
            .quiz_service
            .generate(&decision, request)
            .await
            .map_err(AppError::from)?;

        Ok(Json(GenerateQuizResponse {
            success: true,
            result: quiz.result,
            remaining_prompts: decision.allowance(),
            actual_questions: quiz.actual_questions,
        }))
    }
}
