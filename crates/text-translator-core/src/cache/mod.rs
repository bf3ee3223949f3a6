mod memory;
mod key;

pub use memory::MemoryCache;
pub use key::CacheKey;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::config::{CacheConfig, Lang};
use crate::error::Result;
use crate::translator::{Translator, TranslatorInfo};

/// Provider decorator that remembers successful translations.
///
/// Retyping text that was already translated under the same pair is
/// answered from memory without touching the provider. Failures are never
/// cached.
pub struct CachedTranslator {
    inner: Arc<dyn Translator>,
    cache: MemoryCache,
}

impl CachedTranslator {
    pub fn new(inner: Arc<dyn Translator>, config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: MemoryCache::new(config.max_entries, config.ttl_seconds),
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[async_trait]
impl Translator for CachedTranslator {
    fn info(&self) -> TranslatorInfo {
        self.inner.info()
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let key = CacheKey::new(text, self.inner.name(), source, target).to_string();

        if let Some(hit) = self.cache.get(&key).await {
            debug!("Cache hit for {} -> {}", source, target);
            return Ok(hit);
        }

        let translated = self.inner.translate(text, source, target).await?;
        self.cache.insert(key, translated.clone()).await;
        Ok(translated)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}
