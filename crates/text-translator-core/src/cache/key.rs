use crate::config::Lang;

/// Cache key for a translated text.
///
/// Opaque MD5 hash over everything that affects the result, so any change
/// to text, provider or language pair produces a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    pub fn new(text: &str, translator: &str, source: &Lang, target: &Lang) -> Self {
        // Null separators keep ("a", "bc") and ("ab", "c") apart
        let combined = format!(
            "{}\0{}\0{}\0{}",
            text,
            translator.to_lowercase(),
            source.as_str(),
            target.as_str(),
        );

        Self {
            hash: format!("{:x}", md5::compute(combined.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str, translator: &str, src: &str, tgt: &str) -> CacheKey {
        CacheKey::new(text, translator, &Lang::new(src), &Lang::new(tgt))
    }

    #[test]
    fn test_cache_key_is_fixed_length_hash() {
        let k = key("Hello world", "Google", "en", "ru");
        assert_eq!(k.as_str().len(), 32);
        assert!(k.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_key_differs_by_input() {
        let base = key("Hello", "Google", "en", "ru");
        assert_ne!(base, key("World", "Google", "en", "ru"));
        assert_ne!(base, key("Hello", "OpenAI", "en", "ru"));
        assert_ne!(base, key("Hello", "Google", "de", "ru"));
        assert_ne!(base, key("Hello", "Google", "en", "de"));
    }

    #[test]
    fn test_cache_key_separators_prevent_collisions() {
        assert_ne!(key("ab", "c", "en", "ru"), key("a", "bc", "en", "ru"));
    }

    #[test]
    fn test_cache_key_case_insensitive_translator() {
        assert_eq!(key("Hello", "Google", "en", "ru"), key("Hello", "GOOGLE", "en", "ru"));
    }
}
