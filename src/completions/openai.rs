//! OpenAI chat-completions backed [`TextCompletions`] implementation.

use anyhow::{anyhow, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, Stop,
};
use async_trait::async_trait;

use crate::completions::{Prompt, Role, TextCompletions};

/// Sampling parameters for the chat completions endpoint. Unset knobs are left to the
/// API's defaults.
#[derive(Debug, Clone)]
pub struct OpenAiParameters {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u16>,
    pub n: Option<u8>,
    pub seed: Option<i64>,
    pub stop: Option<Vec<String>>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

impl OpenAiParameters {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            top_p: None,
            max_tokens: None,
            n: None,
            seed: None,
            stop: None,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }
}

/// Client for generating text completions from the OpenAI chat API.
pub struct OpenAiCompletions {
    client: async_openai::Client<OpenAIConfig>,
    parameters: OpenAiParameters,
}

impl OpenAiCompletions {
    /// Build a client reading the API key from the environment.
    pub fn new(parameters: OpenAiParameters) -> Self {
        Self {
            client: async_openai::Client::new(),
            parameters,
        }
    }

    pub fn with_client(
        client: async_openai::Client<OpenAIConfig>,
        parameters: OpenAiParameters,
    ) -> Self {
        Self { client, parameters }
    }

    pub fn parameters(&self) -> &OpenAiParameters {
        &self.parameters
    }

    fn to_request(&self, prompt: &Prompt) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(prompt.len());
        for (role, text) in prompt.iter() {
            let message = match role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
            };
            messages.push(message);
        }

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(&self.parameters.model).messages(messages);
        if let Some(temperature) = self.parameters.temperature {
            request.temperature(temperature);
        }
        if let Some(top_p) = self.parameters.top_p {
            request.top_p(top_p);
        }
        if let Some(max_tokens) = self.parameters.max_tokens {
            request.max_tokens(max_tokens);
        }
        if let Some(n) = self.parameters.n {
            request.n(n);
        }
        if let Some(seed) = self.parameters.seed {
            request.seed(seed);
        }
        if let Some(stop) = &self.parameters.stop {
            request.stop(Stop::StringArray(stop.clone()));
        }
        if let Some(presence_penalty) = self.parameters.presence_penalty {
            request.presence_penalty(presence_penalty);
        }
        if let Some(frequency_penalty) = self.parameters.frequency_penalty {
            request.frequency_penalty(frequency_penalty);
        }
        Ok(request.build()?)
    }
}

#[async_trait]
impl TextCompletions for OpenAiCompletions {
    async fn run(&self, prompt: &Prompt) -> Result<String> {
        let request = self.to_request(prompt)?;
        let response = self.client.chat().create(request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("completion response contained no choices"))?;
        choice
            .message
            .content
            .ok_or_else(|| anyhow!("completion response contained no text content"))
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.parameters.model)
    }
}
