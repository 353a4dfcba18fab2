use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(&self, request: VisionRequest) -> Result<VisionResponse>;
}

pub struct OpenAiVisionClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiVisionClient {
    /// Builds the process-wide client. The HTTP timeout is fixed here.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let client = Client::with_config(openai_config).with_http_client(http_client);

        Ok(Self {
            client,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl VisionClient for OpenAiVisionClient {
    async fn complete(&self, request: VisionRequest) -> Result<VisionResponse> {
        debug!(
            "Creating vision completion: model={}, image_uri_len={}, max_tokens={}, temperature={}",
            self.model,
            request.image_data_uri.len(),
            request.max_tokens,
            request.temperature
        );

        let messages = request.to_openai_messages()?;

        let openai_request = openai_types::CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()?;

        let response = self.client.chat().create(openai_request).await?;

        debug!(
            "Received vision completion with {} choices",
            response.choices.len()
        );

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::analysis_failed("model returned no choices"))?;

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::analysis_failed("model returned an empty response"));
        }

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(VisionResponse {
            model: response.model,
            content,
            finish_reason: choice
                .finish_reason
                .and_then(|fr| serde_json::to_value(fr).ok())
                .and_then(|v| v.as_str().map(str::to_string)),
            usage,
        })
    }
}
