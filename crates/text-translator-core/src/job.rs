//! A single cancellable provider call.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LanguagePair;
use crate::error::Error;
use crate::translator::Translator;
use crate::util::{is_blank, preview};

/// Sequence number of a job. Strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// What a job translates: the text and pair captured when it was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub text: String,
    pub pair: LanguagePair,
}

impl JobRequest {
    pub fn new(text: impl Into<String>, pair: LanguagePair) -> Self {
        Self {
            text: text.into(),
            pair,
        }
    }

    pub fn is_blank(&self) -> bool {
        is_blank(&self.text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
    Cancelled,
}

/// Sent by a job's task exactly once, when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub id: JobId,
    pub outcome: Outcome,
}

/// A provider call with an id, a state and a cancellation signal.
///
/// Jobs never schedule themselves; the scheduler creates, starts and
/// cancels them.
#[derive(Debug)]
pub struct TranslationJob {
    id: JobId,
    request: JobRequest,
    state: JobState,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TranslationJob {
    pub fn new(id: JobId, request: JobRequest) -> Self {
        Self {
            id,
            request,
            state: JobState::Pending,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    pub const fn id(&self) -> JobId {
        self.id
    }

    pub const fn request(&self) -> &JobRequest {
        &self.request
    }

    pub const fn state(&self) -> JobState {
        self.state
    }

    /// Spawn the provider call. The outcome arrives on `reports`.
    pub fn start(
        &mut self,
        translator: Arc<dyn Translator>,
        timeout: Option<Duration>,
        reports: mpsc::UnboundedSender<JobReport>,
    ) {
        if self.state != JobState::Pending {
            debug!("{} already started", self.id);
            return;
        }

        info!(
            "Starting {} ({}): {:?}",
            self.id,
            self.request.pair,
            preview(&self.request.text, 40)
        );

        self.state = JobState::Running;
        let id = self.id;
        let request = self.request.clone();
        let cancel = self.cancel.clone();

        self.handle = Some(tokio::spawn(async move {
            let outcome = execute(translator.as_ref(), &request, timeout, &cancel).await;
            // Receiver gone means the scheduler shut down; nobody to tell
            let _ = reports.send(JobReport { id, outcome });
        }));
    }

    /// Signal cancellation. The task stops waiting on the provider and
    /// reports `Cancelled`.
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        debug!("Cancelling {}", self.id);
        self.cancel.cancel();
        self.state = JobState::Cancelled;
    }

    /// Record the outcome the job reported
    pub fn finish(&mut self, outcome: &Outcome) {
        self.state = match outcome {
            Outcome::Success(_) => JobState::Completed,
            Outcome::Failure(_) => JobState::Failed,
            Outcome::Cancelled => JobState::Cancelled,
        };
        self.handle = None;
    }
}

impl Drop for TranslationJob {
    fn drop(&mut self) {
        // Never leave a task waiting on a provider for a job nobody owns
        self.cancel.cancel();
    }
}

/// Run one provider call under cancellation and an optional timeout.
///
/// Blank input succeeds with an empty string without calling the provider.
/// Once `cancel` fires the result is `Cancelled`, even if the provider
/// finished at the same moment.
pub async fn execute(
    translator: &dyn Translator,
    request: &JobRequest,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Outcome {
    if request.is_blank() {
        return Outcome::Success(String::new());
    }

    let call = translator.translate(&request.text, &request.pair.source, &request.pair.target);
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(Error::TranslationTimeout)),
            None => call.await,
        }
    };

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => return Outcome::Cancelled,
        result = bounded => result,
    };

    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }

    match result {
        Ok(translated) => Outcome::Success(translated),
        Err(e) => {
            warn!("Translation failed: {}", e);
            Outcome::Failure(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Lang;
    use crate::error::Result;
    use crate::translator::TranslatorInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SlowTranslator {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl SlowTranslator {
        fn new(delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                delay: Duration::from_millis(delay_ms),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Translator for SlowTranslator {
        fn info(&self) -> TranslatorInfo {
            TranslatorInfo {
                name: "slow",
                requires_api_key: false,
            }
        }

        async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(text.to_uppercase())
        }
    }

    fn request(text: &str) -> JobRequest {
        JobRequest::new(text, LanguagePair::new(Lang::new("en"), Lang::new("ru")))
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_skips_provider() {
        let translator = SlowTranslator::new(100);
        let outcome = execute(
            translator.as_ref(),
            &request("  \n "),
            None,
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, Outcome::Success(String::new()));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reports_failure() {
        let translator = SlowTranslator::new(5_000);
        let outcome = execute(
            translator.as_ref(),
            &request("hello"),
            Some(Duration::from_millis(100)),
            &CancellationToken::new(),
        )
        .await;
        assert_eq!(outcome, Outcome::Failure(Error::TranslationTimeout.to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_reports_success_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut job = TranslationJob::new(JobId(1), request("hello"));
        assert_eq!(job.state(), JobState::Pending);

        job.start(SlowTranslator::new(50), None, tx);
        assert_eq!(job.state(), JobState::Running);

        let report = rx.recv().await.unwrap();
        assert_eq!(report, JobReport { id: JobId(1), outcome: Outcome::Success("HELLO".into()) });
        job.finish(&report.outcome);
        assert_eq!(job.state(), JobState::Completed);

        drop(job);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_reports_late_success() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut job = TranslationJob::new(JobId(7), request("hello"));
        job.start(SlowTranslator::new(1_000), None, tx);

        tokio::time::sleep(Duration::from_millis(10)).await;
        job.cancel();
        assert_eq!(job.state(), JobState::Cancelled);

        let report = rx.recv().await.unwrap();
        assert_eq!(report, JobReport { id: JobId(7), outcome: Outcome::Cancelled });

        // Let the provider's delay elapse; nothing else may arrive
        tokio::time::sleep(Duration::from_millis(2_000)).await;
        drop(job);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_simultaneous_completion() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = execute(SlowTranslator::new(0).as_ref(), &request("hi"), None, &cancel).await;
        assert_eq!(outcome, Outcome::Cancelled);
    }
}
