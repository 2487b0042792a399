//! [`TextGenerator`] backed by a chat completions endpoint.

use crate::api::client::{ChatRequest, Message, OpenRouterClient};
use crate::api::retry::RetryConfig;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::summarizer::{GenerateFuture, GenerationRequest, TextGenerator};

/// Sends each generation request as a system + user chat completion.
pub struct ChatBackend {
    client: OpenRouterClient,
    model: String,
    temperature: Option<f32>,
    retry: RetryConfig,
}

impl ChatBackend {
    pub fn new(client: OpenRouterClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            retry: RetryConfig::default(),
        }
    }

    /// Build the HTTP client and backend from configuration.
    pub fn from_config(api_key: &str, config: &BackendConfig) -> Result<Self, BackendError> {
        let client =
            OpenRouterClient::with_base_url(api_key, &config.base_url, config.request_timeout())?;
        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            retry: config.retry(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_request(&self, request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(&request.system_instruction),
                Message::user(&request.transcript),
            ],
            max_tokens: request.max_output_tokens,
            temperature: self.temperature,
        }
    }
}

impl TextGenerator for ChatBackend {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        Box::pin(async move {
            let body = self.chat_request(request);
            let (client, body) = (&self.client, &body);
            let completion = self.retry.run(move || client.chat(body)).await?;
            completion
                .content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or(BackendError::Empty)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn request_carries_instruction_transcript_and_cap() {
        let client =
            OpenRouterClient::with_base_url("k", "http://localhost:1", Duration::from_secs(1))
                .unwrap();
        let backend = ChatBackend::new(client, "test/model").with_temperature(0.2);
        let body = backend.chat_request(&GenerationRequest {
            system_instruction: "sys".into(),
            transcript: "a: hi".into(),
            max_output_tokens: 3000,
        });

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "test/model");
        assert_eq!(json["max_tokens"], 3000);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "sys");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "a: hi");
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }
}
