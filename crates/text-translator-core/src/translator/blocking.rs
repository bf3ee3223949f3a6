use async_trait::async_trait;
use std::sync::Arc;

use super::traits::{Translator, TranslatorInfo};
use crate::config::Lang;
use crate::error::{Error, Result};

/// Adapts a synchronous provider call onto the blocking thread pool.
///
/// The call cannot be interrupted once it is running. A job that is
/// cancelled stops waiting on it, and whatever it eventually returns is
/// dropped.
pub struct BlockingTranslator<F> {
    name: &'static str,
    call: Arc<F>,
}

impl<F> BlockingTranslator<F>
where
    F: Fn(&str, &Lang, &Lang) -> Result<String> + Send + Sync + 'static,
{
    pub fn new(name: &'static str, call: F) -> Self {
        Self {
            name,
            call: Arc::new(call),
        }
    }
}

#[async_trait]
impl<F> Translator for BlockingTranslator<F>
where
    F: Fn(&str, &Lang, &Lang) -> Result<String> + Send + Sync + 'static,
{
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: self.name,
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        let call = Arc::clone(&self.call);
        let text = text.to_string();
        let source = source.clone();
        let target = target.clone();

        tokio::task::spawn_blocking(move || call(&text, &source, &target))
            .await
            .map_err(|e| Error::TranslationRequest(format!("provider call aborted: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_sync_call() {
        let translator = BlockingTranslator::new("upper", |text: &str, _: &Lang, _: &Lang| {
            Ok(text.to_uppercase())
        });
        let out = translator
            .translate("hello", &Lang::new("en"), &Lang::new("de"))
            .await
            .unwrap();
        assert_eq!(out, "HELLO");
        assert_eq!(translator.name(), "upper");
    }

    #[tokio::test]
    async fn test_propagates_provider_error() {
        let translator = BlockingTranslator::new("broken", |_: &str, _: &Lang, _: &Lang| {
            Err(Error::TranslationRequest("offline".to_string()))
        });
        let err = translator
            .translate("hello", &Lang::new("en"), &Lang::new("de"))
            .await
            .unwrap_err();
        assert!(err.is_provider());
    }
}
