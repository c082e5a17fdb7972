use super::quiz_generator::QuizGenerator;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI chat-completion implementation of the quiz generator
pub struct OpenAiQuizGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiQuizGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl QuizGenerator for OpenAiQuizGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            prompt_length = user_prompt.len(),
            "Calling OpenAI chat completion API"
        );

        let system_message = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| format!("OpenAI request error: {}", e))?;
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(user_prompt)
            .build()
            .map_err(|e| format!("OpenAI request error: {}", e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([system_message.into(), user_message.into()])
            .response_format(ResponseFormat::JsonObject)
            .temperature(1.0)
            .build()
            .map_err(|e| format!("OpenAI request error: {}", e))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                "OpenAI chat completion call failed"
            );
            format!("OpenAI error: {}", e)
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| "OpenAI returned an empty completion".to_string())?;

        tracing::info!(
            duration_ms = start_time.elapsed().as_millis() as u64,
            response_length = content.len(),
            "OpenAI chat completion received"
        );

        Ok(content)
    }
}
