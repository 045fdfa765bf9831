use super::{build_user_message, parse_response, ExhibitionExtractor, SYSTEM_PROMPT};
use crate::config::ExtractorConfig;
use crate::error::{Result, ScraperError};
use crate::types::ExtractedFields;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiExtractor {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiExtractor {
    pub fn new(config: &ExtractorConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build from config when extraction is enabled and a key is present.
    pub fn from_config(config: &ExtractorConfig) -> Result<Option<Self>> {
        match (&config.api_key, config.enabled) {
            (Some(key), true) if !key.trim().is_empty() => Ok(Some(Self::new(config, key.trim())?)),
            _ => Ok(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn extraction_error(message: impl Into<String>) -> ScraperError {
        ScraperError::Extraction {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ExhibitionExtractor for OpenAiExtractor {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self, text, image_urls), fields(model = %self.model, chars = text.chars().count()))]
    async fn extract(&self, text: &str, image_urls: &[String]) -> Result<ExtractedFields> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_message(text, image_urls),
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::extraction_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::extraction_error(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Self::extraction_error(format!("unreadable response: {}", e)))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Self::extraction_error("response has no message content"))?;

        debug!("Received {} chars from extractor", content.len());
        parse_response(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_extractor_without_key_or_when_disabled() {
        let mut config = ExtractorConfig::default();
        assert!(OpenAiExtractor::from_config(&config).unwrap().is_none());

        config.api_key = Some("   ".to_string());
        assert!(OpenAiExtractor::from_config(&config).unwrap().is_none());

        config.api_key = Some("sk-test".to_string());
        config.enabled = false;
        assert!(OpenAiExtractor::from_config(&config).unwrap().is_none());

        config.enabled = true;
        let extractor = OpenAiExtractor::from_config(&config).unwrap().unwrap();
        assert_eq!(extractor.model(), config.model);
    }

    #[test]
    fn request_uses_json_object_format() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![],
            temperature: 0.2,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["model"], "gpt-4o-mini");
    }
}
