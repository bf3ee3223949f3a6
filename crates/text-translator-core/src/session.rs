//! Translation session: the single control flow that owns the text fields,
//! the language pair, the scheduler and every history write.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Lang, LanguagePair};
use crate::error::Error;
use crate::history::{HistorySnapshot, HistoryStore, NewRecord, RecordId, TranslationRecord};
use crate::job::{JobRequest, Outcome};
use crate::scheduler::{Completion, JobScheduler, SchedulerEvent};
use crate::translator::Translator;

/// Callbacks into whatever displays the session.
pub trait Presenter {
    /// A job started for the current input
    fn translation_started(&mut self) {}

    /// New translated text for the output field
    fn translation_result(&mut self, text: &str);

    /// The output field should be emptied (blank input)
    fn translation_cleared(&mut self);

    /// The provider failed; the output field has been emptied
    fn translation_error(&mut self, detail: &str);

    /// A history operation failed. The session keeps going.
    fn storage_error(&mut self, error: &Error);

    /// Both fields changed at once (swap)
    fn texts_replaced(&mut self, _source: &str, _target: &str) {}

    /// Records were removed from history
    fn history_changed(&mut self) {}
}

/// UI-level events for [`TranslationSession::run`].
#[derive(Debug)]
pub enum SessionEvent {
    TextChanged(String),
    SourceLangChanged(Lang),
    TargetLangChanged(Lang),
    Swap,
    ClearText,
    ListHistory {
        limit: usize,
        reply: oneshot::Sender<HistorySnapshot>,
    },
    DeleteHistoryAt(usize),
    DeleteHistory(RecordId),
    ClearHistory,
    /// Stop now, dropping pending and running work
    Quit,
}

pub struct TranslationSession<P> {
    scheduler: JobScheduler,
    history: HistoryStore,
    presenter: P,
    pair: LanguagePair,
    source_text: String,
    target_text: String,
}

impl<P: Presenter> TranslationSession<P> {
    pub fn new(
        translator: Arc<dyn Translator>,
        history: HistoryStore,
        presenter: P,
        config: &AppConfig,
    ) -> Self {
        Self {
            scheduler: JobScheduler::new(translator, &config.scheduler),
            history,
            presenter,
            pair: config.language_pair(),
            source_text: String::new(),
            target_text: String::new(),
        }
    }

    pub const fn language_pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub const fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    pub const fn history_store(&self) -> &HistoryStore {
        &self.history
    }

    // ==========================================================================
    // Input events
    // ==========================================================================

    pub fn set_source_text(&mut self, text: impl Into<String>) {
        self.source_text = text.into();
        self.scheduler.notify_text_changed(self.request());
    }

    pub fn set_source_lang(&mut self, lang: Lang) {
        if lang == self.pair.source {
            return;
        }
        info!("Source language -> {}", lang);
        self.pair.source = lang;
        self.scheduler.notify_language_changed(self.request());
    }

    pub fn set_target_lang(&mut self, lang: Lang) {
        if lang == self.pair.target {
            return;
        }
        info!("Target language -> {}", lang);
        self.pair.target = lang;
        self.scheduler.notify_language_changed(self.request());
    }

    /// Exchange the languages and the contents of both fields, then
    /// retranslate if there is anything to translate.
    pub fn swap(&mut self) {
        self.pair = self.pair.swapped();
        std::mem::swap(&mut self.source_text, &mut self.target_text);
        info!("Swapped to {}", self.pair);

        self.presenter
            .texts_replaced(&self.source_text, &self.target_text);

        if self.source_text.is_empty() && self.target_text.is_empty() {
            return;
        }
        self.scheduler.notify_language_changed(self.request());
    }

    /// Empty both fields and drop any work in flight
    pub fn clear_text(&mut self) {
        self.scheduler.cancel();
        self.source_text.clear();
        self.target_text.clear();
        self.presenter.translation_cleared();
    }

    // ==========================================================================
    // History
    // ==========================================================================

    pub fn history(&self, limit: usize) -> HistorySnapshot {
        self.history.list(limit)
    }

    /// Delete whatever is at `index` in the live history
    pub fn delete_history_at(&mut self, index: usize) -> Option<TranslationRecord> {
        match self.history.delete_at(index) {
            Ok(record) => {
                self.presenter.history_changed();
                Some(record)
            }
            Err(e) => {
                warn!("Failed to delete history entry {}: {}", index, e);
                self.presenter.storage_error(&e);
                None
            }
        }
    }

    /// Delete the record with `id`, if it still exists
    pub fn delete_history(&mut self, id: RecordId) -> bool {
        match self.history.delete(id) {
            Ok(removed) => {
                if removed {
                    self.presenter.history_changed();
                }
                removed
            }
            Err(e) => {
                warn!("Failed to delete history entry {}: {}", id, e);
                self.presenter.storage_error(&e);
                false
            }
        }
    }

    pub fn clear_history(&mut self) -> bool {
        match self.history.clear() {
            Ok(()) => {
                self.presenter.history_changed();
                true
            }
            Err(e) => {
                warn!("Failed to clear history: {}", e);
                self.presenter.storage_error(&e);
                false
            }
        }
    }

    // ==========================================================================
    // Driving
    // ==========================================================================

    /// Wait for and apply the next scheduler event. Returns `None` right
    /// away when nothing is pending or running.
    pub async fn step(&mut self) -> Option<SchedulerEvent> {
        if !self.scheduler.is_busy() {
            return None;
        }
        let event = self.scheduler.next_event().await;
        self.apply(&event);
        Some(event)
    }

    /// Apply events until the scheduler is idle
    pub async fn settle(&mut self) {
        while self.step().await.is_some() {}
    }

    /// Process UI events and scheduler events until [`SessionEvent::Quit`]
    /// or until the event channel closes.
    ///
    /// A closed channel still lets accepted input reach its outcome;
    /// `Quit` cancels it.
    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Self {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SessionEvent::Quit) => {
                        debug!("Session quit, cancelling pending work");
                        self.scheduler.cancel();
                        return self;
                    }
                    Some(event) => self.handle(event),
                    None => break,
                },
                event = self.scheduler.next_event() => self.apply(&event),
            }
        }

        debug!("Session event channel closed, finishing pending work");
        self.settle().await;
        self
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TextChanged(text) => self.set_source_text(text),
            SessionEvent::SourceLangChanged(lang) => self.set_source_lang(lang),
            SessionEvent::TargetLangChanged(lang) => self.set_target_lang(lang),
            SessionEvent::Swap => self.swap(),
            SessionEvent::ClearText => self.clear_text(),
            SessionEvent::ListHistory { limit, reply } => {
                // Requester may have gone away
                let _ = reply.send(self.history(limit));
            }
            SessionEvent::DeleteHistoryAt(index) => {
                self.delete_history_at(index);
            }
            SessionEvent::DeleteHistory(id) => {
                self.delete_history(id);
            }
            SessionEvent::ClearHistory => {
                self.clear_history();
            }
            SessionEvent::Quit => self.scheduler.cancel(),
        }
    }

    fn request(&self) -> JobRequest {
        JobRequest::new(self.source_text.clone(), self.pair.clone())
    }

    fn apply(&mut self, event: &SchedulerEvent) {
        match event {
            SchedulerEvent::Started { .. } => self.presenter.translation_started(),
            SchedulerEvent::Finished(completion) => self.complete(completion),
        }
    }

    fn complete(&mut self, completion: &Completion) {
        match &completion.outcome {
            Outcome::Success(translated) if translated.is_empty() || completion.request.is_blank() => {
                self.target_text.clear();
                self.presenter.translation_cleared();
            }
            Outcome::Success(translated) => {
                self.target_text.clone_from(translated);
                self.presenter.translation_result(translated);

                // Built from the job's own request, not the live field
                let record = NewRecord::now(
                    completion.request.text.clone(),
                    translated.clone(),
                    &completion.request.pair,
                );
                if let Err(e) = self.history.append(record) {
                    warn!("Failed to save translation to history: {}", e);
                    self.presenter.storage_error(&e);
                }
            }
            Outcome::Failure(detail) => {
                self.target_text.clear();
                self.presenter.translation_error(detail);
            }
            Outcome::Cancelled => {
                debug!("Current job reported cancellation, nothing to show");
            }
        }
    }
}
