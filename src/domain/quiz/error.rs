use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum QuizServiceError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<QuizServiceError> for AppError {
    fn from(err: QuizServiceError) -> Self {
        match err {
            QuizServiceError::Invalid(msg) => AppError::BadRequest(msg),
            QuizServiceError::Dependency(msg) => AppError::ExternalService(msg),
        }
    }
}
