use crate::domain::usage::Allowance;
use serde::{Deserialize, Serialize};

/// Request for POST /api/quiz/generate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub num_questions: u32,
    pub content: String,
    #[serde(default)]
    pub source: QuizSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizSource {
    Document,
    #[default]
    Prompt,
}

/// Response for POST /api/quiz/generate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizResponse {
    pub success: bool,
    pub result: serde_json::Value,
    pub remaining_prompts: Allowance,
    /// How many questions were actually generated, so the client can react
    /// when the requested count was capped
    pub actual_questions: u32,
}
