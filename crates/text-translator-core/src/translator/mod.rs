mod traits;
mod blocking;
mod google;
mod openai;

pub use traits::{Translator, TranslatorInfo};
pub use blocking::BlockingTranslator;
pub use google::GoogleTranslator;
pub use openai::OpenAiTranslator;

use crate::cache::CachedTranslator;
use crate::config::{Backend, CacheConfig, TranslatorConfig};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Create a provider from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    let translator: Arc<dyn Translator> = match config.backend {
        Backend::Google => Arc::new(GoogleTranslator::new()?),
        Backend::OpenAi => Arc::new(OpenAiTranslator::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.model.clone(),
            config.retry_count,
            config.retry_delay_ms,
        )?),
    };

    if !translator.is_available() {
        return Err(Error::TranslationMissingApiKey);
    }

    Ok(translator)
}

/// Create a provider and wrap it in the result cache when enabled
pub fn create_cached_translator(
    config: &TranslatorConfig,
    cache: &CacheConfig,
) -> Result<Arc<dyn Translator>> {
    let translator = create_translator(config)?;
    if cache.enabled {
        Ok(Arc::new(CachedTranslator::new(translator, cache)))
    } else {
        Ok(translator)
    }
}

/// Build the shared HTTP client used by the network backends
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| Error::TranslationRequest(format!("Failed to create HTTP client: {e}")))
}
