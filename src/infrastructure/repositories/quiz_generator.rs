use async_trait::async_trait;

/// Repository for quiz generation.
/// Abstracts the underlying LLM provider; the caller gates access to it but
/// never inspects provider specifics.
///
/// Implementations are responsible for:
/// - Provider-specific request construction (model, temperature, format)
/// - Returning the raw generated text for the caller to parse
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generate quiz content from a system prompt and a user prompt
    ///
    /// # Errors
    /// Returns error if generation fails or the provider is unavailable
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String>;
}
