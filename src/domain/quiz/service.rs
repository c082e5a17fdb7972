use super::dto::GenerateQuizRequest;
use super::error::QuizServiceError;
use super::prompt;
use crate::domain::usage::EntitlementDecision;
use crate::domain::user::SubscriptionTier;
use crate::infrastructure::repositories::QuizGenerator;
use std::sync::Arc;

/// Hard bounds on questions per quiz, independent of tier
const MIN_QUESTIONS: u32 = 1;
const MAX_QUESTIONS: u32 = 15;
/// Content-level caps per caller class
const GUEST_MAX_QUESTIONS: u32 = 1;
const FREE_MAX_QUESTIONS: u32 = 3;

#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    pub result: serde_json::Value,
    pub actual_questions: u32,
}

/// Quiz generation service: validates the request against the caller's
/// entitlement, builds the prompts, and calls the generation oracle. Quota
/// is already consumed by the time this runs; content-level limits (how
/// many questions a caller class may request) live here, not in the
/// entitlement engine.
pub struct QuizService {
    generator: Arc<dyn QuizGenerator>,
}

impl QuizService {
    pub fn new(generator: Arc<dyn QuizGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(
        &self,
        decision: &EntitlementDecision,
        request: GenerateQuizRequest,
    ) -> Result<GeneratedQuiz, QuizServiceError> {
        if request.content.trim().is_empty() {
            return Err(QuizServiceError::Invalid("Content is required".to_string()));
        }

        let question_count = validate_question_count(request.num_questions, decision)?;

        tracing::info!(
            question_count,
            source = ?request.source,
            guest = decision.is_guest(),
            "Generating quiz"
        );

        let system_prompt = prompt::system_prompt(request.source);
        let user_prompt = prompt::user_prompt(question_count, &request.content, request.source);

        let raw = self
            .generator
            .generate(system_prompt, &user_prompt)
            .await
            .map_err(QuizServiceError::Dependency)?;

        let result: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(error = %e, "Generated quiz was not valid JSON");
            QuizServiceError::Dependency("Failed to parse generated quiz".to_string())
        })?;

        Ok(GeneratedQuiz {
            result,
            actual_questions: question_count,
        })
    }
}

/// Validate the requested question count against the caller's entitlement
fn validate_question_count(
    requested: u32,
    decision: &EntitlementDecision,
) -> Result<u32, QuizServiceError> {
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&requested) {
        return Err(QuizServiceError::Invalid(format!(
            "Invalid number of questions. Must be between {} and {}.",
            MIN_QUESTIONS, MAX_QUESTIONS
        )));
    }

    match decision.tier() {
        None if requested > GUEST_MAX_QUESTIONS => Err(QuizServiceError::Invalid(
            "Please log in to generate more than 1 question.".to_string(),
        )),
        Some(SubscriptionTier::Free) if requested > FREE_MAX_QUESTIONS => {
            Err(QuizServiceError::Invalid(
                "Upgrade to Premium to generate more than 3 questions.".to_string(),
            ))
        }
        _ => Ok(requested),
    }
}
