pub mod openai_quiz_generator;
pub mod pg_usage_store;
pub mod quiz_generator;
pub mod usage_store;
pub mod user_repository;

pub use openai_quiz_generator::OpenAiQuizGenerator;
pub use pg_usage_store::PgUsageStore;
pub use quiz_generator::QuizGenerator;
pub use usage_store::{UsageRecord, UsageStore};
pub use user_repository::UserRepository;
