use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info, warn};

use super::record::{HistorySnapshot, NewRecord, RecordId, TranslationRecord};
use crate::config::Lang;
use crate::error::{Error, Result};

const TREE_NAME: &str = "translations";

/// Persistent translation history backed by sled.
///
/// Keys are big-endian record ids, so reverse key order is newest first.
/// Every mutation is flushed before it returns.
#[derive(Clone)]
pub struct HistoryStore {
    db: Db,
    tree: Tree,
}

impl HistoryStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::HistoryOpen(format!(
                    "Failed to create history directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("WouldBlock") || err_str.contains("lock") {
                Error::HistoryOpen(format!(
                    "History locked at {}: another translator instance is using it",
                    path.display()
                ))
            } else {
                Error::HistoryOpen(format!("Failed to open history at {}: {}", path.display(), e))
            }
        })?;

        debug!("Opened history at {}", path.display());
        Self::from_db(db)
    }

    /// A store that lives only as long as this process
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| Error::HistoryOpen(format!("Failed to open temporary history: {e}")))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let tree = db
            .open_tree(TREE_NAME)
            .map_err(|e| Error::HistoryOpen(e.to_string()))?;
        Ok(Self { db, tree })
    }

    /// Insert a record at the head of the history and persist it.
    pub fn append(&self, entry: NewRecord) -> Result<TranslationRecord> {
        let id = RecordId(
            self.db
                .generate_id()
                .map_err(|e| Error::HistoryWrite(format!("Failed to allocate id: {e}")))?,
        );
        let record = entry.with_id(id);
        let value =
            serde_json::to_vec(&record).map_err(|e| Error::HistoryEncode(e.to_string()))?;

        self.tree.insert(id.to_key(), value)?;
        self.flush()?;

        info!("Saved translation {} to history", id);
        Ok(record)
    }

    /// Up to `limit` most recent records, newest first.
    ///
    /// Never fails: an unreadable store reads as empty history and
    /// undecodable entries are skipped.
    pub fn list(&self, limit: usize) -> HistorySnapshot {
        if limit == 0 {
            return HistorySnapshot::default();
        }

        let mut records = Vec::with_capacity(limit.min(64));
        for entry in self.live() {
            match entry {
                Ok(record) => {
                    records.push(record);
                    if records.len() == limit {
                        break;
                    }
                }
                Err(e) => {
                    warn!("History unreadable, showing none: {}", e);
                    return HistorySnapshot::default();
                }
            }
        }

        HistorySnapshot::new(records)
    }

    /// Number of readable records
    pub fn len(&self) -> usize {
        self.live().filter(std::result::Result::is_ok).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the record at `index` of the history as it is right now.
    ///
    /// The position is resolved against the live ordering at call time, not
    /// against whatever list the caller rendered earlier.
    pub fn delete_at(&self, index: usize) -> Result<TranslationRecord> {
        let mut seen = 0;
        for entry in self.live() {
            let record = entry?;
            if seen == index {
                self.tree.remove(record.id.to_key())?;
                self.flush()?;
                info!("Deleted history entry {} at index {}", record.id, index);
                return Ok(record);
            }
            seen += 1;
        }

        Err(Error::HistoryIndexOutOfRange { index, len: seen })
    }

    /// Remove exactly the record with `id`. Returns whether it existed.
    pub fn delete(&self, id: RecordId) -> Result<bool> {
        let removed = self.tree.remove(id.to_key())?.is_some();
        if removed {
            self.flush()?;
            info!("Deleted history entry {}", id);
        } else {
            debug!("History entry {} already gone", id);
        }
        Ok(removed)
    }

    /// Remove every record and persist the empty history
    pub fn clear(&self) -> Result<()> {
        self.tree.clear()?;
        self.flush()?;
        info!("Cleared translation history");
        Ok(())
    }

    /// Import a legacy JSON history file (array, newest first, timestamps
    /// formatted `%Y-%m-%d %H:%M:%S` in local time). Returns how many
    /// records were imported; entries with unsupported language codes are
    /// skipped.
    ///
    /// Imported records get fresh ids, so they would sort ahead of anything
    /// already stored. The store must be empty.
    pub fn import_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        let len = self.len();
        if len > 0 {
            return Err(Error::HistoryNotEmpty { len });
        }

        let content = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<LegacyEntry> = serde_json::from_str(&content)
            .map_err(|e| Error::HistoryRead(format!("Invalid history file: {e}")))?;

        let mut imported = 0;
        // Oldest first so the newest legacy entry ends up at the head
        for entry in entries.into_iter().rev() {
            let Some(record) = entry.into_new_record() else {
                continue;
            };
            self.append(record)?;
            imported += 1;
        }

        info!("Imported {} history entries from {}", imported, path.as_ref().display());
        Ok(imported)
    }

    /// Decoded records in newest-first order, skipping corrupt values
    fn live(&self) -> impl Iterator<Item = Result<TranslationRecord>> + '_ {
        self.tree.iter().rev().filter_map(|entry| match entry {
            Ok((key, value)) => decode(&key, &value).map(Ok),
            Err(e) => Some(Err(Error::HistoryRead(e.to_string()))),
        })
    }

    fn flush(&self) -> Result<()> {
        self.tree
            .flush()
            .map_err(|e| Error::HistoryWrite(format!("Flush failed: {e}")))?;
        Ok(())
    }
}

fn decode(key: &[u8], value: &[u8]) -> Option<TranslationRecord> {
    let Some(id) = RecordId::from_key(key) else {
        warn!("Skipping history entry with malformed key");
        return None;
    };

    match serde_json::from_slice::<TranslationRecord>(value) {
        Ok(mut record) => {
            // The key is authoritative
            record.id = id;
            Some(record)
        }
        Err(e) => {
            warn!("Skipping corrupt history entry {}: {}", id, e);
            None
        }
    }
}

#[derive(Deserialize)]
struct LegacyEntry {
    timestamp: String,
    source_text: String,
    translated_text: String,
    source_lang: String,
    target_lang: String,
}

impl LegacyEntry {
    fn into_new_record(self) -> Option<NewRecord> {
        let (Ok(source_lang), Ok(target_lang)) =
            (Lang::parse(&self.source_lang), Lang::parse(&self.target_lang))
        else {
            warn!(
                "Skipping legacy entry with unsupported pair {} -> {}",
                self.source_lang, self.target_lang
            );
            return None;
        };

        let timestamp = NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S")
            .ok()
            .and_then(|naive| chrono::Local.from_local_datetime(&naive).single())
            .map_or_else(Utc::now, |local| local.with_timezone(&Utc));

        Some(NewRecord {
            timestamp,
            source_text: self.source_text,
            translated_text: self.translated_text,
            source_lang,
            target_lang,
        })
    }
}
