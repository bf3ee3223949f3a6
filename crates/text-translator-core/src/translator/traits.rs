use async_trait::async_trait;
use crate::config::Lang;
use crate::error::Result;

/// Information about a translation provider
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name, also part of cache keys
    pub name: &'static str,
    /// Whether this provider requires an API key
    pub requires_api_key: bool,
}

/// A translation provider.
///
/// The pipeline treats implementations as a black box: one call per job,
/// no retries layered on top, and the call may fail or take arbitrarily long.
#[async_trait]
pub trait Translator: Send + Sync {
    fn info(&self) -> TranslatorInfo;

    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate `text` from `source` into `target`
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;

    /// Check if the provider is usable (e.g., API key configured)
    fn is_available(&self) -> bool {
        true
    }
}
