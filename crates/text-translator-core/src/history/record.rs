use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Lang, LanguagePair};

/// Store-assigned, monotonically increasing record identifier.
///
/// Unlike a list index it never shifts when other records are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub(crate) const fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub(crate) fn from_key(key: &[u8]) -> Option<Self> {
        let bytes: [u8; 8] = key.try_into().ok()?;
        Some(Self(u64::from_be_bytes(bytes)))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A completed translation as persisted in history. Never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: Lang,
    pub target_lang: Lang,
}

impl TranslationRecord {
    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(self.source_lang.clone(), self.target_lang.clone())
    }
}

/// A translation waiting to be appended; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub timestamp: DateTime<Utc>,
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: Lang,
    pub target_lang: Lang,
}

impl NewRecord {
    /// Record a translation completed now
    pub fn now(
        source_text: impl Into<String>,
        translated_text: impl Into<String>,
        pair: &LanguagePair,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            source_text: source_text.into(),
            translated_text: translated_text.into(),
            source_lang: pair.source.clone(),
            target_lang: pair.target.clone(),
        }
    }

    pub(crate) fn with_id(self, id: RecordId) -> TranslationRecord {
        TranslationRecord {
            id,
            timestamp: self.timestamp,
            source_text: self.source_text,
            translated_text: self.translated_text,
            source_lang: self.source_lang,
            target_lang: self.target_lang,
        }
    }
}

/// A point-in-time view of the history, newest first.
///
/// Indices are only meaningful within one snapshot; iterate it as often as
/// needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    records: Vec<TranslationRecord>,
}

impl HistorySnapshot {
    pub(crate) const fn new(records: Vec<TranslationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TranslationRecord> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&TranslationRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranslationRecord> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<TranslationRecord> {
        self.records
    }
}

impl IntoIterator for HistorySnapshot {
    type Item = TranslationRecord;
    type IntoIter = std::vec::IntoIter<TranslationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a HistorySnapshot {
    type Item = &'a TranslationRecord;
    type IntoIter = std::slice::Iter<'a, TranslationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_key_roundtrip_orders_numerically() {
        let low = RecordId(9).to_key();
        let high = RecordId(256).to_key();
        assert!(low < high);
        assert_eq!(RecordId::from_key(&high), Some(RecordId(256)));
        assert_eq!(RecordId::from_key(b"short"), None);
    }

    #[test]
    fn test_record_serializes_with_snake_case_fields() {
        let record = NewRecord::now(
            "Hello",
            "Привет",
            &LanguagePair::new(Lang::new("en"), Lang::new("ru")),
        )
        .with_id(RecordId(1));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source_text"], "Hello");
        assert_eq!(json["translated_text"], "Привет");
        assert_eq!(json["source_lang"], "en");
        assert_eq!(json["target_lang"], "ru");
        assert_eq!(json["id"], 1);
    }
}
