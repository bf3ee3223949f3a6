//! Durable, newest-first log of completed translations.

mod record;
mod store;

pub use record::{HistorySnapshot, NewRecord, RecordId, TranslationRecord};
pub use store::HistoryStore;
