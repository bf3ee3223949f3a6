use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use super::traits::{Translator, TranslatorInfo};
use crate::config::Lang;
use crate::error::{Error, Result};

/// OpenAI-compatible API translator
/// Works with: llama.cpp server, Ollama, DeepSeek, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    /// Optional API key for authentication
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Number of attempts per translate call
    pub retry_count: u32,
    /// Delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
    pub fn new(
        api_base: String,
        api_key: Option<String>,
        model: String,
        retry_count: u32,
        retry_delay_ms: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: super::http_client()?,
            api_base,
            api_key,
            model,
            retry_count: retry_count.max(1),
            retry_delay_ms,
        })
    }

    fn create_prompt(text: &str, source: &Lang, target: &Lang) -> String {
        format!(
            "Translate the following text from {} into {}. Output only the translation, no explanations.\n\nText: \"{}\"",
            prompt_name(source),
            prompt_name(target),
            text
        )
    }

    /// Extract the translation from a chat response, stripping wrapping quotes
    fn extract(response: &ChatResponse) -> Result<String> {
        response
            .choices
            .first()
            .map(|choice| {
                choice
                    .message
                    .content
                    .trim()
                    .trim_start_matches('"')
                    .trim_end_matches('"')
                    .to_string()
            })
            .ok_or_else(|| Error::TranslationInvalidResponse("No choices in response".to_string()))
    }

    async fn request_with_retry(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: Self::create_prompt(text, source, target),
            }],
            temperature: Some(0.3),
        };

        let mut last_error = None;

        for attempt in 0..self.retry_count {
            debug!(
                "Translation request attempt {}/{} to {}",
                attempt + 1,
                self.retry_count,
                url
            );

            let mut req = self.client.post(&url).json(&request);
            if let Some(ref key) = self.api_key {
                req = req.header("Authorization", format!("Bearer {key}"));
            }

            match req.send().await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<ChatResponse>().await {
                        Ok(chat_response) => return Self::extract(&chat_response),
                        Err(e) => {
                            warn!("Failed to parse response: {}", e);
                            last_error = Some(Error::TranslationInvalidResponse(e.to_string()));
                        }
                    }
                }
                Ok(response) if response.status().as_u16() == 429 => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok());

                    warn!("Rate limited, retry after {:?}s", retry_after);
                    last_error = Some(Error::TranslationRateLimited { retry_after });

                    let wait_time = retry_after.unwrap_or(5) * 1000;
                    tokio::time::sleep(Duration::from_millis(wait_time)).await;
                    continue;
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!("API error: {} - {}", status, body);
                    last_error = Some(Error::TranslationRequest(format!("HTTP {status}: {body}")));
                }
                Err(e) => {
                    warn!("Request failed: {}", e);
                    last_error = Some(if e.is_timeout() {
                        Error::TranslationTimeout
                    } else {
                        Error::TranslationRequest(e.to_string())
                    });
                }
            }

            if attempt + 1 < self.retry_count {
                tokio::time::sleep(Duration::from_millis(self.retry_delay_ms)).await;
            }
        }

        error!("Translation failed after {} attempts", self.retry_count);
        Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
            requires_api_key: false, // Optional for local servers
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if source == target {
            return Ok(text.to_string());
        }

        self.request_with_retry(text, source, target).await
    }
}

/// Language name for prompts; models understand most raw codes too
fn prompt_name(lang: &Lang) -> &str {
    lang.name().unwrap_or_else(|| lang.as_str())
}
