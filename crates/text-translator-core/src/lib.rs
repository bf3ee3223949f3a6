//! Text Translator Core Library
//!
//! The asynchronous translation pipeline behind an interactive translator:
//! - Debounced scheduling of translation jobs with cancellation of stale work
//! - Translation via pluggable providers (Google web endpoint, OpenAI-compatible APIs,
//!   or any blocking call)
//! - In-memory result caching
//! - Durable, newest-first translation history

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod job;
pub mod scheduler;
pub mod session;
pub mod translator;
pub mod util;

pub use config::{
    AppConfig, Backend, CacheConfig, HistoryConfig, Lang, LanguageOption, LanguagePair,
    SchedulerConfig, TranslatorConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_SOURCE_LANG,
    DEFAULT_TARGET_LANG, LANGUAGES,
};
pub use error::{Error, Result};
pub use history::{HistorySnapshot, HistoryStore, NewRecord, RecordId, TranslationRecord};
pub use job::{JobId, JobRequest, JobState, Outcome, TranslationJob};
pub use scheduler::{Completion, JobScheduler, SchedulerEvent, SchedulerState};
pub use session::{Presenter, SessionEvent, TranslationSession};
pub use translator::{
    create_cached_translator, create_translator, BlockingTranslator, GoogleTranslator,
    OpenAiTranslator, Translator,
};
pub use cache::{CacheKey, CachedTranslator};

/// Open the configured history store, falling back to a temporary one so
/// the translator keeps working when the on-disk store is unavailable.
///
/// The returned error, if any, is the reason for the fallback.
pub fn open_history_or_temporary(config: &HistoryConfig) -> Result<(HistoryStore, Option<Error>)> {
    let path = config.resolved_path();
    match HistoryStore::open(&path) {
        Ok(store) => Ok((store, None)),
        Err(e) => {
            tracing::warn!("History unavailable ({}), using a temporary store", e);
            Ok((HistoryStore::temporary()?, Some(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source_lang.as_str(), "en");
        assert_eq!(config.target_lang.as_str(), "ru");
        assert_eq!(config.scheduler.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_history_fallback_on_unusable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = HistoryConfig {
            path: Some(blocker.join("history")),
            ..Default::default()
        };
        let (store, reason) = open_history_or_temporary(&config).unwrap();
        assert!(reason.is_some_and(|e| e.is_storage()));
        assert!(store.is_empty());
    }
}
