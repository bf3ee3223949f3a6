use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Language code from the supported set (ISO 639-1 plus a few regional and
/// three-letter codes the provider understands).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Lang(String);

impl Lang {
    /// Create a language code without checking it against the supported set.
    /// Outside this crate every `Lang` goes through [`Lang::parse`].
    pub(crate) fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Parse and normalize a code, rejecting anything outside the supported set.
    pub fn parse(code: &str) -> Result<Self> {
        let normalized = code.trim().to_lowercase();
        if is_supported(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::TranslationUnsupportedLanguage(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English display name, if the code is in the supported set
    pub fn name(&self) -> Option<&'static str> {
        language_name(self.as_str())
    }
}

// Serde default functions for the default pair
fn default_source_lang() -> Lang {
    Lang::new(DEFAULT_SOURCE_LANG)
}

fn default_target_lang() -> Lang {
    Lang::new(DEFAULT_TARGET_LANG)
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Lang {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Lang> for String {
    fn from(lang: Lang) -> Self {
        lang.0
    }
}

/// Source and target language of a translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguagePair {
    pub source: Lang,
    pub target: Lang,
}

impl LanguagePair {
    pub const fn new(source: Lang, target: Lang) -> Self {
        Self { source, target }
    }

    /// The same pair with source and target exchanged
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

impl std::fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Which translation backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Public Google Translate web endpoint (no key needed)
    #[default]
    Google,
    /// Any OpenAI-compatible chat-completions server
    OpenAi,
}

impl std::str::FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "openai" | "open-ai" => Ok(Self::OpenAi),
            other => Err(Error::ConfigInvalid {
                field: "translator.backend".to_string(),
                reason: format!("unknown backend '{other}'"),
            }),
        }
    }
}

/// Translator backend configuration.
///
/// `api_base`, `api_key` and `model` only apply to the OpenAI-compatible
/// backend (llama.cpp, Ollama, DeepSeek, OpenAI, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl TranslatorConfig {
    /// Create an OpenAI-compatible translator config
    pub fn openai(
        api_base: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend: Backend::OpenAi,
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_model() -> String {
    "default_model".to_string()
}

const fn default_retry_count() -> u32 {
    2
}

const fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Quiet period before a text change is translated, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
/// Upper bound on a single provider call, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Debounce and timeout settings for the job scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Provider call timeout (0 = no timeout)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl SchedulerConfig {
    pub const fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }

    pub const fn timeout(&self) -> Option<std::time::Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(std::time::Duration::from_millis(self.timeout_ms))
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// History store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Store directory (defaults to $XDG_DATA_HOME/text-translator/history)
    pub path: Option<PathBuf>,

    /// How many records the history view shows
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

const fn default_list_limit() -> usize {
    50
}

impl HistoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::util::history_path)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            list_limit: default_list_limit(),
        }
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the in-memory result cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cached translations
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,

    /// Cache TTL in seconds (0 = no expiry)
    #[serde(default)]
    pub ttl_seconds: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_max_entries() -> u64 {
    1000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            ttl_seconds: 0,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source language
    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,

    /// Target language
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Translator backend configuration
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Debounce and timeout
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// History store
    #[serde(default)]
    pub history: HistoryConfig,

    /// Result cache
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            translator: TranslatorConfig::default(),
            scheduler: SchedulerConfig::default(),
            history: HistoryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(self.source_lang.clone(), self.target_lang.clone())
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Load from default locations (~/.config/text-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("text-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

/// A language option for selectors
#[derive(Debug, Clone)]
pub struct LanguageOption {
    /// Language code (e.g., "en", "zh-cn", "haw")
    pub code: &'static str,
    /// English display name (e.g., "English")
    pub name: &'static str,
}

/// Default source language code
pub const DEFAULT_SOURCE_LANG: &str = "en";
/// Default target language code
pub const DEFAULT_TARGET_LANG: &str = "ru";

/// The supported language set, in selector order.
pub const LANGUAGES: &[LanguageOption] = &[
    LanguageOption { code: "af", name: "Afrikaans" },
    LanguageOption { code: "sq", name: "Albanian" },
    LanguageOption { code: "am", name: "Amharic" },
    LanguageOption { code: "ar", name: "Arabic" },
    LanguageOption { code: "hy", name: "Armenian" },
    LanguageOption { code: "az", name: "Azerbaijani" },
    LanguageOption { code: "eu", name: "Basque" },
    LanguageOption { code: "be", name: "Belarusian" },
    LanguageOption { code: "bn", name: "Bengali" },
    LanguageOption { code: "bs", name: "Bosnian" },
    LanguageOption { code: "bg", name: "Bulgarian" },
    LanguageOption { code: "ca", name: "Catalan" },
    LanguageOption { code: "ceb", name: "Cebuano" },
    LanguageOption { code: "zh-cn", name: "Chinese (Simplified)" },
    LanguageOption { code: "zh-tw", name: "Chinese (Traditional)" },
    LanguageOption { code: "co", name: "Corsican" },
    LanguageOption { code: "hr", name: "Croatian" },
    LanguageOption { code: "cs", name: "Czech" },
    LanguageOption { code: "da", name: "Danish" },
    LanguageOption { code: "nl", name: "Dutch" },
    LanguageOption { code: "en", name: "English" },
    LanguageOption { code: "eo", name: "Esperanto" },
    LanguageOption { code: "et", name: "Estonian" },
    LanguageOption { code: "fi", name: "Finnish" },
    LanguageOption { code: "fr", name: "French" },
    LanguageOption { code: "fy", name: "Frisian" },
    LanguageOption { code: "gl", name: "Galician" },
    LanguageOption { code: "ka", name: "Georgian" },
    LanguageOption { code: "de", name: "German" },
    LanguageOption { code: "el", name: "Greek" },
    LanguageOption { code: "gu", name: "Gujarati" },
    LanguageOption { code: "ht", name: "Haitian Creole" },
    LanguageOption { code: "ha", name: "Hausa" },
    LanguageOption { code: "haw", name: "Hawaiian" },
    LanguageOption { code: "he", name: "Hebrew" },
    LanguageOption { code: "hi", name: "Hindi" },
    LanguageOption { code: "hmn", name: "Hmong" },
    LanguageOption { code: "hu", name: "Hungarian" },
    LanguageOption { code: "is", name: "Icelandic" },
    LanguageOption { code: "ig", name: "Igbo" },
    LanguageOption { code: "id", name: "Indonesian" },
    LanguageOption { code: "ga", name: "Irish" },
    LanguageOption { code: "it", name: "Italian" },
    LanguageOption { code: "ja", name: "Japanese" },
    LanguageOption { code: "jw", name: "Javanese" },
    LanguageOption { code: "kn", name: "Kannada" },
    LanguageOption { code: "kk", name: "Kazakh" },
    LanguageOption { code: "km", name: "Khmer" },
    LanguageOption { code: "ko", name: "Korean" },
    LanguageOption { code: "ku", name: "Kurdish" },
    LanguageOption { code: "ky", name: "Kyrgyz" },
    LanguageOption { code: "lo", name: "Lao" },
    LanguageOption { code: "la", name: "Latin" },
    LanguageOption { code: "lv", name: "Latvian" },
    LanguageOption { code: "lt", name: "Lithuanian" },
    LanguageOption { code: "lb", name: "Luxembourgish" },
    LanguageOption { code: "mk", name: "Macedonian" },
    LanguageOption { code: "mg", name: "Malagasy" },
    LanguageOption { code: "ms", name: "Malay" },
    LanguageOption { code: "ml", name: "Malayalam" },
    LanguageOption { code: "mt", name: "Maltese" },
    LanguageOption { code: "mi", name: "Maori" },
    LanguageOption { code: "mr", name: "Marathi" },
    LanguageOption { code: "mn", name: "Mongolian" },
    LanguageOption { code: "my", name: "Myanmar" },
    LanguageOption { code: "ne", name: "Nepali" },
    LanguageOption { code: "no", name: "Norwegian" },
    LanguageOption { code: "ny", name: "Nyanja" },
    LanguageOption { code: "or", name: "Odia" },
    LanguageOption { code: "ps", name: "Pashto" },
    LanguageOption { code: "fa", name: "Persian" },
    LanguageOption { code: "pl", name: "Polish" },
    LanguageOption { code: "pt", name: "Portuguese" },
    LanguageOption { code: "pa", name: "Punjabi" },
    LanguageOption { code: "ro", name: "Romanian" },
    LanguageOption { code: "ru", name: "Russian" },
    LanguageOption { code: "sm", name: "Samoan" },
    LanguageOption { code: "gd", name: "Scots Gaelic" },
    LanguageOption { code: "sr", name: "Serbian" },
    LanguageOption { code: "st", name: "Sesotho" },
    LanguageOption { code: "sn", name: "Shona" },
    LanguageOption { code: "sd", name: "Sindhi" },
    LanguageOption { code: "si", name: "Sinhala" },
    LanguageOption { code: "sk", name: "Slovak" },
    LanguageOption { code: "sl", name: "Slovenian" },
    LanguageOption { code: "so", name: "Somali" },
    LanguageOption { code: "es", name: "Spanish" },
    LanguageOption { code: "su", name: "Sundanese" },
    LanguageOption { code: "sw", name: "Swahili" },
    LanguageOption { code: "sv", name: "Swedish" },
    LanguageOption { code: "tl", name: "Tagalog" },
    LanguageOption { code: "tg", name: "Tajik" },
    LanguageOption { code: "ta", name: "Tamil" },
    LanguageOption { code: "tt", name: "Tatar" },
    LanguageOption { code: "te", name: "Telugu" },
    LanguageOption { code: "th", name: "Thai" },
    LanguageOption { code: "tr", name: "Turkish" },
    LanguageOption { code: "tk", name: "Turkmen" },
    LanguageOption { code: "uk", name: "Ukrainian" },
    LanguageOption { code: "ur", name: "Urdu" },
    LanguageOption { code: "ug", name: "Uyghur" },
    LanguageOption { code: "uz", name: "Uzbek" },
    LanguageOption { code: "vi", name: "Vietnamese" },
    LanguageOption { code: "cy", name: "Welsh" },
    LanguageOption { code: "xh", name: "Xhosa" },
    LanguageOption { code: "yi", name: "Yiddish" },
    LanguageOption { code: "yo", name: "Yoruba" },
    LanguageOption { code: "zu", name: "Zulu" },
];

/// Whether a (lowercase) code is in the supported set
pub fn is_supported(code: &str) -> bool {
    LANGUAGES.iter().any(|l| l.code == code)
}

/// English name for a language code
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES.iter().find(|l| l.code == code).map(|l| l.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_parse_normalizes() {
        let lang = Lang::parse(" ZH-CN ").unwrap();
        assert_eq!(lang.as_str(), "zh-cn");
        assert_eq!(lang.name(), Some("Chinese (Simplified)"));
    }

    #[test]
    fn test_lang_parse_rejects_unknown() {
        assert!(matches!(
            Lang::parse("xx"),
            Err(Error::TranslationUnsupportedLanguage(code)) if code == "xx"
        ));
    }

    #[test]
    fn test_pair_swapped() {
        let pair = LanguagePair::new(Lang::new("en"), Lang::new("ru"));
        let swapped = pair.swapped();
        assert_eq!(swapped.source.as_str(), "ru");
        assert_eq!(swapped.target.as_str(), "en");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            target_lang = "de"

            [scheduler]
            debounce_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.source_lang.as_str(), "en");
        assert_eq!(config.target_lang.as_str(), "de");
        assert_eq!(config.scheduler.debounce_ms, 250);
        assert_eq!(config.scheduler.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.translator.backend, Backend::Google);
        assert_eq!(config.history.list_limit, 50);
    }

    #[test]
    fn test_toml_rejects_unknown_language() {
        let err = AppConfig::from_toml(r#"source_lang = "klingon""#).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_openai_backend_from_toml() {
        let config = AppConfig::from_toml(
            r#"
            [translator]
            backend = "openai"
            model = "qwen"
            "#,
        )
        .unwrap();
        assert_eq!(config.translator.backend, Backend::OpenAi);
        assert_eq!(config.translator.model, "qwen");
    }

    #[test]
    fn test_zero_timeout_disables_bound() {
        let config = SchedulerConfig {
            debounce_ms: 500,
            timeout_ms: 0,
        };
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("OpenAI".parse::<Backend>().unwrap(), Backend::OpenAi);
        assert!("deepl".parse::<Backend>().is_err());
    }
}
