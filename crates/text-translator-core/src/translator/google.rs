use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::traits::{Translator, TranslatorInfo};
use crate::config::Lang;
use crate::error::{Error, Result};

const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Google Translate through its public web endpoint.
///
/// Single attempt per call; no key required.
pub struct GoogleTranslator {
    client: Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Point at a different endpoint (used for proxies and tests)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: super::http_client()?,
            endpoint: endpoint.into(),
        })
    }

    fn request_url(&self, text: &str, source: &Lang, target: &Lang) -> String {
        format!(
            "{}?client=gtx&sl={}&tl={}&dt=t&q={}",
            self.endpoint,
            provider_code(source),
            provider_code(target),
            urlencoding::encode(text)
        )
    }

    /// The response is a nested array; `[0]` holds one `[translated, original, ...]`
    /// entry per sentence.
    fn parse_response(body: &Value) -> Result<String> {
        let sentences = body
            .get(0)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::TranslationInvalidResponse("missing sentence list".to_string())
            })?;

        let translated: String = sentences
            .iter()
            .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
            .collect();

        Ok(translated)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "Google",
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let url = self.request_url(text, source, target);
        debug!("Google translate request {} -> {}", source, target);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::TranslationTimeout
            } else {
                Error::TranslationRequest(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::TranslationRateLimited { retry_after: None });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Google API error: {} - {}", status, body);
            return Err(Error::TranslationRequest(format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::TranslationInvalidResponse(e.to_string()))?;

        Self::parse_response(&body)
    }
}

/// Codes where the endpoint expects a different spelling than our set
fn provider_code(lang: &Lang) -> &str {
    match lang.as_str() {
        "zh-cn" => "zh-CN",
        "zh-tw" => "zh-TW",
        "he" => "iw",
        "jw" => "jv",
        other => other,
    }
}
