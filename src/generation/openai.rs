//! OpenAI chat-completion generator.

use super::Generator;
use crate::config::{Prompts, RagSettings};
use crate::error::{Result, VidaskError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Generator backed by the OpenAI chat API.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIGenerator {
    pub fn new(settings: &RagSettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            prompts: Prompts::default(),
        })
    }

    /// Use custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Render the system and user messages for a request.
    pub fn build_messages(
        &self,
        context: &str,
        question: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.rag.system.clone())
                .build()
                .map_err(|e| VidaskError::Upstream(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| VidaskError::Upstream(e.to_string()))?
                .into(),
        ])
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, context), fields(model = %self.model))]
    async fn answer(&self, context: &str, question: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.build_messages(context, question)?)
            .temperature(self.temperature)
            .build()
            .map_err(|e| VidaskError::Upstream(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| VidaskError::Upstream(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VidaskError::Upstream("Empty response from LLM".to_string()))?;

        debug!("Generated answer with {} characters", answer.len());
        Ok(answer)
    }
}
