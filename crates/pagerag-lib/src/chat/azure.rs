//! Azure OpenAI chat-completions client.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::{ChatMessage, ChatModel};
use crate::config::AzureSettings;
use crate::embedding::azure::{azure_client, deployment_url};

const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking chat client for an Azure OpenAI deployment.
pub struct AzureOpenAiChat {
    client: Client,
    endpoint: String,
    temperature: f32,
}

impl AzureOpenAiChat {
    pub fn new(settings: &AzureSettings) -> Result<Self> {
        anyhow::ensure!(
            !settings.chat_deployment.trim().is_empty(),
            "missing Azure chat deployment name"
        );
        Ok(Self {
            client: azure_client(&settings.api_key, CHAT_TIMEOUT)?,
            endpoint: deployment_url(settings, &settings.chat_deployment, "chat/completions"),
            temperature: 0.0,
        })
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatModel for AzureOpenAiChat {
    fn complete(&mut self, messages: &[ChatMessage]) -> Result<String> {
        let body = ChatRequest {
            messages,
            temperature: self.temperature,
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .context("failed to call Azure chat completions")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Azure chat completions returned {status}: {text}");
        }
        let parsed: ChatResponse = resp.json().context("failed to parse Azure chat response")?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Azure chat response contained no choices")?;
        debug!(answer_len = answer.len(), "Chat completion received");
        Ok(answer)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_targets_chat_deployment() {
        let settings = AzureSettings {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_key: "secret".to_string(),
            api_version: "2024-02-01".to_string(),
            embedding_deployment: "ada".to_string(),
            chat_deployment: "gpt-4".to_string(),
        };
        let chat = AzureOpenAiChat::new(&settings).unwrap();
        assert_eq!(
            chat.endpoint(),
            "https://example.openai.azure.com/openai/deployments/gpt-4/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn request_body_shape() {
        let messages = [ChatMessage::system("ctx"), ChatMessage::user("q")];
        let body = serde_json::to_value(ChatRequest {
            messages: &messages,
            temperature: 0.0,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "messages": [
                    {"role": "system", "content": "ctx"},
                    {"role": "user", "content": "q"}
                ],
                "temperature": 0.0
            })
        );
    }
}
