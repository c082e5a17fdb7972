pub mod dto;
pub mod error;
pub mod prompt;
pub mod service;

pub use dto::{GenerateQuizRequest, GenerateQuizResponse, QuizSource};
pub use error::QuizServiceError;
pub use service::{GeneratedQuiz, QuizService};
