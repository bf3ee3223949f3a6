//! Debounced scheduling of translation jobs.
//!
//! The scheduler owns at most one live job. Input changes restart a quiet
//! period and kill the running job at once; when the quiet period ends the
//! latest input becomes a new job. A job's outcome is only forwarded while
//! that job is still the current one, so a superseded request can never
//! overwrite a newer result regardless of completion order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::job::{JobId, JobReport, JobRequest, Outcome, TranslationJob};
use crate::translator::Translator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Debouncing,
    Running,
}

/// Terminal outcome for an accepted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// `None` for blank input, which never becomes a job
    pub id: Option<JobId>,
    pub request: JobRequest,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The quiet period ended and a job started for `request`
    Started { id: JobId, request: JobRequest },
    /// The current input reached its outcome
    Finished(Completion),
}

struct PendingInput {
    request: JobRequest,
    deadline: Instant,
}

pub struct JobScheduler {
    translator: Arc<dyn Translator>,
    debounce: Duration,
    timeout: Option<Duration>,
    next_id: u64,
    current: Option<TranslationJob>,
    pending: Option<PendingInput>,
    reports_tx: mpsc::UnboundedSender<JobReport>,
    reports_rx: mpsc::UnboundedReceiver<JobReport>,
}

impl JobScheduler {
    pub fn new(translator: Arc<dyn Translator>, config: &SchedulerConfig) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            translator,
            debounce: config.debounce(),
            timeout: config.timeout(),
            next_id: 1,
            current: None,
            pending: None,
            reports_tx,
            reports_rx,
        }
    }

    pub const fn state(&self) -> SchedulerState {
        if self.pending.is_some() {
            SchedulerState::Debouncing
        } else if self.current.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Whether an event is still due (a quiet period or a running job)
    pub const fn is_busy(&self) -> bool {
        !matches!(self.state(), SchedulerState::Idle)
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current.as_ref().map(TranslationJob::id)
    }

    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Input changed: cancel the running job now and restart the quiet period.
    pub fn notify_text_changed(&mut self, request: JobRequest) {
        self.cancel_current();

        let deadline = Instant::now() + self.debounce;
        if self.pending.is_some() {
            debug!("Debounce reset");
        } else {
            debug!("Debounce started ({:?})", self.debounce);
        }
        self.pending = Some(PendingInput { request, deadline });
    }

    /// Language pair changed or swapped. The same text has to be
    /// retranslated under the new pair, so this is a text change.
    pub fn notify_language_changed(&mut self, request: JobRequest) {
        self.notify_text_changed(request);
    }

    /// Drop any pending input and cancel the running job
    pub fn cancel(&mut self) {
        self.pending = None;
        self.cancel_current();
    }

    /// Wait for the next scheduler event.
    ///
    /// Stale job outcomes are consumed and discarded while waiting. When
    /// idle this never resolves, which makes it safe to race against other
    /// event sources.
    pub async fn next_event(&mut self) -> SchedulerEvent {
        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);

            tokio::select! {
                () = sleep_until(deadline) => {
                    if let Some(input) = self.pending.take() {
                        return self.on_debounce_elapsed(input.request);
                    }
                }
                Some(report) = self.reports_rx.recv() => {
                    if let Some(completion) = self.on_job_report(report) {
                        return SchedulerEvent::Finished(completion);
                    }
                }
            }
        }
    }

    fn cancel_current(&mut self) {
        if let Some(mut job) = self.current.take() {
            job.cancel();
        }
    }

    fn on_debounce_elapsed(&mut self, request: JobRequest) -> SchedulerEvent {
        if request.is_blank() {
            debug!("Blank input, clearing result");
            return SchedulerEvent::Finished(Completion {
                id: None,
                request,
                outcome: Outcome::Success(String::new()),
            });
        }

        let id = JobId(self.next_id);
        self.next_id += 1;

        let mut job = TranslationJob::new(id, request.clone());
        job.start(Arc::clone(&self.translator), self.timeout, self.reports_tx.clone());
        self.current = Some(job);

        SchedulerEvent::Started { id, request }
    }

    fn on_job_report(&mut self, report: JobReport) -> Option<Completion> {
        match self.current.take() {
            Some(mut job) if job.id() == report.id => {
                job.finish(&report.outcome);
                Some(Completion {
                    id: Some(report.id),
                    request: job.request().clone(),
                    outcome: report.outcome,
                })
            }
            other => {
                self.current = other;
                debug!("Discarding stale result from {}", report.id);
                None
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Lang, LanguagePair};
    use crate::error::{Error, Result};
    use crate::translator::TranslatorInfo;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers `"<text>!"` after a per-text delay (default 10ms).
    /// Texts starting with "fail" produce an error.
    #[derive(Default)]
    struct ScriptedTranslator {
        delays: Vec<(&'static str, u64)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Translator for ScriptedTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "scripted",
                requires_api_key: false,
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            self.calls.lock().unwrap().push(text.to_string());
            let delay = self
                .delays
                .iter()
                .find(|(t, _)| *t == text)
                .map_or(10, |(_, d)| *d);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if text.starts_with("fail") {
                return Err(Error::TranslationRequest("boom".to_string()));
            }
            Ok(format!("{text}!"))
        }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            debounce_ms: 500,
            timeout_ms: 10_000,
        }
    }

    fn request(text: &str) -> JobRequest {
        JobRequest::new(text, LanguagePair::new(Lang::new("en"), Lang::new("ru")))
    }

    fn scheduler(translator: &Arc<ScriptedTranslator>) -> JobScheduler {
        JobScheduler::new(translator.clone(), &config())
    }

    fn finished(event: SchedulerEvent) -> Completion {
        match event {
            SchedulerEvent::Finished(completion) => completion,
            SchedulerEvent::Started { id, .. } => panic!("expected completion, got start of {id}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_debounce_starts_one_job() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);

        for text in ["H", "He", "Hel", "Hell", "Hello"] {
            scheduler.notify_text_changed(request(text));
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(scheduler.state(), SchedulerState::Debouncing);
        }

        let started = scheduler.next_event().await;
        assert_eq!(
            started,
            SchedulerEvent::Started { id: JobId(1), request: request("Hello") }
        );

        let done = finished(scheduler.next_event().await);
        assert_eq!(done.outcome, Outcome::Success("Hello!".into()));
        assert_eq!(*translator.calls.lock().unwrap(), vec!["Hello".to_string()]);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_waits_for_quiet_period() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);

        let begin = Instant::now();
        scheduler.notify_text_changed(request("Hello"));
        scheduler.next_event().await;
        assert!(begin.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_change_cancels_running_job_immediately() {
        let translator = Arc::new(ScriptedTranslator {
            delays: vec![("first", 5_000)],
            ..Default::default()
        });
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("first"));
        scheduler.next_event().await;
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.current_job(), Some(JobId(1)));

        scheduler.notify_text_changed(request("second"));
        assert_eq!(scheduler.current_job(), None);
        assert_eq!(scheduler.state(), SchedulerState::Debouncing);

        // The cancelled job's report is swallowed; next visible event is job 2
        let started = scheduler.next_event().await;
        assert_eq!(
            started,
            SchedulerEvent::Started { id: JobId(2), request: request("second") }
        );
        let done = finished(scheduler.next_event().await);
        assert_eq!(done.id, Some(JobId(2)));
        assert_eq!(done.outcome, Outcome::Success("second!".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_job_never_surfaces() {
        let translator = Arc::new(ScriptedTranslator {
            delays: vec![("slow", 3_000), ("fast", 10)],
            ..Default::default()
        });
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("slow"));
        scheduler.next_event().await;
        scheduler.notify_text_changed(request("fast"));
        scheduler.next_event().await;

        let done = finished(scheduler.next_event().await);
        assert_eq!(done.request.text, "fast");

        // Let the slow provider call run out; nothing more may appear
        let extra = tokio::time::timeout(Duration::from_secs(10), scheduler.next_event()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_report_with_old_id_is_discarded() {
        let translator = Arc::new(ScriptedTranslator {
            delays: vec![("current", 5_000)],
            ..Default::default()
        });
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("old"));
        scheduler.next_event().await;
        scheduler.notify_text_changed(request("current"));
        scheduler.next_event().await;
        assert_eq!(scheduler.current_job(), Some(JobId(2)));

        // A provider that ignored cancellation delivers job 1's result late
        let stale = scheduler.on_job_report(JobReport {
            id: JobId(1),
            outcome: Outcome::Success("stale".into()),
        });
        assert_eq!(stale, None);
        assert_eq!(scheduler.current_job(), Some(JobId(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_emits_empty_result_without_job() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("   "));
        let done = finished(scheduler.next_event().await);
        assert_eq!(done.id, None);
        assert_eq!(done.outcome, Outcome::Success(String::new()));
        assert!(translator.calls.lock().unwrap().is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_returns_to_idle() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("fail please"));
        scheduler.next_event().await;
        let done = finished(scheduler.next_event().await);
        assert!(matches!(done.outcome, Outcome::Failure(ref detail) if detail.contains("boom")));
        assert!(!scheduler.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_hang_times_out() {
        let translator = Arc::new(ScriptedTranslator {
            delays: vec![("hang", 60_000)],
            ..Default::default()
        });
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("hang"));
        scheduler.next_event().await;
        let done = finished(scheduler.next_event().await);
        assert_eq!(done.outcome, Outcome::Failure(Error::TranslationTimeout.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_change_restarts_debounce() {
        let translator = Arc::new(ScriptedTranslator {
            delays: vec![("Hello", 2_000)],
            ..Default::default()
        });
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("Hello"));
        scheduler.next_event().await;

        let german = JobRequest::new("Hello", LanguagePair::new(Lang::new("en"), Lang::new("de")));
        scheduler.notify_language_changed(german.clone());
        assert_eq!(scheduler.state(), SchedulerState::Debouncing);

        assert_eq!(
            scheduler.next_event().await,
            SchedulerEvent::Started { id: JobId(2), request: german }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_strictly_increase() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);
        let mut ids = Vec::new();

        for text in ["a", "b", "c"] {
            scheduler.notify_text_changed(request(text));
            if let SchedulerEvent::Started { id, .. } = scheduler.next_event().await {
                ids.push(id);
            }
            finished(scheduler.next_event().await);
        }

        assert_eq!(ids, vec![JobId(1), JobId(2), JobId(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_to_idle() {
        let translator = Arc::new(ScriptedTranslator::default());
        let mut scheduler = scheduler(&translator);

        scheduler.notify_text_changed(request("Hello"));
        scheduler.cancel();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        let nothing = tokio::time::timeout(Duration::from_secs(5), scheduler.next_event()).await;
        assert!(nothing.is_err());
    }
}
