use thiserror::Error;

/// Unified error type for text-translator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Translation operations (provider requests, responses, rate limiting, timeouts)
/// - History operations (opening, reading, writing the persisted log)
/// - Configuration operations (loading, validation)
/// - General I/O operations
///
/// None of these are fatal to a running session: provider errors become a
/// failed outcome, storage errors are reported and the session carries on.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation provider request failed
    #[error("translation request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation provider
    #[error("invalid translation response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation provider
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// API key not configured for translation service
    #[error("translation API key not configured")]
    TranslationMissingApiKey,

    /// Language code outside the supported set
    #[error("unsupported language for translation: {0}")]
    TranslationUnsupportedLanguage(String),

    /// Translation request did not complete within the configured bound
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // History (storage) Errors
    // ==========================================================================
    /// Failed to open the history store
    #[error("failed to open history: {0}")]
    HistoryOpen(String),

    /// Failed to read from the history store
    #[error("failed to read history: {0}")]
    HistoryRead(String),

    /// Failed to write or flush the history store
    #[error("failed to write history: {0}")]
    HistoryWrite(String),

    /// Failed to encode a record for storage
    #[error("failed to encode history record: {0}")]
    HistoryEncode(String),

    /// No record at the requested position in the live history
    #[error("no history entry at index {index} (history has {len} entries)")]
    HistoryIndexOutOfRange { index: usize, len: usize },

    /// Legacy import only fills an empty history
    #[error("cannot import into a history that already has {len} entries")]
    HistoryNotEmpty { len: usize },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the translation provider.
    pub const fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::TranslationRequest(_)
                | Self::TranslationInvalidResponse(_)
                | Self::TranslationRateLimited { .. }
                | Self::TranslationMissingApiKey
                | Self::TranslationUnsupportedLanguage(_)
                | Self::TranslationTimeout
                | Self::TranslationMaxRetriesExceeded
        )
    }

    /// Whether this error came from the history store.
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::HistoryOpen(_)
                | Self::HistoryRead(_)
                | Self::HistoryWrite(_)
                | Self::HistoryEncode(_)
                | Self::HistoryIndexOutOfRange { .. }
                | Self::HistoryNotEmpty { .. }
        )
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Self::HistoryWrite(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
