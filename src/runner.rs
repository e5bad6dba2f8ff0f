// src/runner.rs
//! Retry and deduplication orchestration around a single search target.
//!
//! The runner owns no browser, no mailer, and no globals: the external
//! visit/apply action, the ledger, and the backoff policy are all passed
//! in. Each target moves `Pending -> (Succeeded | Failed)` in memory and
//! only a terminal outcome is ever persisted.

use crate::ledger::{AttemptStatus, Ledger, NewAttempt};
use crate::platforms::SearchTarget;
use crate::utils::truncate_error;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// How a single invocation of the external action failed.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Authentication problems never resolve by retrying; fail fast.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Anything transient (timeouts, navigation errors); retried with
    /// exponential backoff.
    #[error("{0}")]
    Transient(String),
}

/// Successful result reported by the external action.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The search page was visited; no application was submitted.
    Visited { page_title: Option<String> },
    /// An application was actually submitted.
    Applied { page_title: Option<String> },
}

/// The external visit/apply collaborator. Implementations drive whatever
/// automation layer is in use; the runner only sees the outcome.
#[async_trait]
pub trait Action: Send + Sync {
    async fn execute(&self, target: &SearchTarget) -> Result<ActionOutcome, ActionError>;
}

/// Exponential backoff: the wait before retry `k` (zero-based) is
/// `base^k * unit`, so 1, 2, 4, ... units for base 2.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base: u32,
    pub unit: Duration,
}

impl BackoffPolicy {
    pub fn new(base: u32, unit: Duration) -> Self {
        Self { base, unit }
    }

    pub fn delay(&self, retry_index: u32) -> Duration {
        self.unit * self.base.saturating_pow(retry_index)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: 2,
            unit: Duration::from_secs(1),
        }
    }
}

/// Terminal outcome of processing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// URL already in the ledger; the action was never invoked.
    Skipped,
    Succeeded(AttemptStatus),
    Failed { error: String },
}

pub struct AttemptRunner<'a> {
    ledger: &'a Ledger,
    session_id: String,
    max_retries: u32,
    backoff: BackoffPolicy,
}

impl<'a> AttemptRunner<'a> {
    pub fn new(
        ledger: &'a Ledger,
        session_id: String,
        max_retries: u32,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            ledger,
            session_id,
            max_retries,
            backoff,
        }
    }

    /// Process one target: dedup gate, bounded retry loop, one ledger
    /// append. The action runs at most `max_retries + 1` times and never
    /// runs at all for a URL the ledger has already seen, whatever its
    /// prior status.
    pub async fn process<A: Action + ?Sized>(
        &self,
        target: &SearchTarget,
        action: &A,
    ) -> Outcome {
        info!(
            platform = %target.platform_name,
            title = %target.title,
            location = %target.location,
            "Processing target"
        );

        match self.ledger.exists(&target.url).await {
            Ok(true) => {
                info!(url = %target.url, "Skipped: URL already attempted");
                return Outcome::Skipped;
            }
            Ok(false) => {}
            Err(e) => {
                // A broken dedup check must not block the run; worst case
                // is one redundant visit.
                error!("Ledger lookup failed, proceeding without dedup: {e}");
            }
        }

        let mut last_error = String::new();
        let mut attempt: u32 = 0;

        loop {
            match action.execute(target).await {
                Ok(outcome) => {
                    let (status, page_title) = match outcome {
                        ActionOutcome::Visited { page_title } => {
                            (AttemptStatus::Visited, page_title)
                        }
                        ActionOutcome::Applied { page_title } => {
                            (AttemptStatus::Applied, page_title)
                        }
                    };
                    info!(platform = %target.platform_name, %status, "Target completed");
                    self.record(target, status, page_title, None).await;
                    return Outcome::Succeeded(status);
                }
                Err(ActionError::Auth(message)) => {
                    error!(platform = %target.platform_name, "Authentication failed: {message}");
                    last_error = message;
                    break;
                }
                Err(ActionError::Transient(message)) => {
                    warn!(
                        platform = %target.platform_name,
                        attempt = attempt + 1,
                        "Attempt failed: {message}"
                    );
                    last_error = message;

                    if attempt >= self.max_retries {
                        error!(
                            platform = %target.platform_name,
                            "Max retries reached, giving up"
                        );
                        break;
                    }

                    let delay = self.backoff.delay(attempt);
                    info!(
                        "Retrying in {:?} (attempt {}/{})",
                        delay,
                        attempt + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }

        let error = truncate_error(&last_error);
        self.record(target, AttemptStatus::Failed, None, Some(error.clone()))
            .await;
        Outcome::Failed { error }
    }

    /// Append the terminal record. Storage faults are logged and
    /// swallowed: an attempt that cannot be recorded still completed, and
    /// losing the record must not abort the run.
    async fn record(
        &self,
        target: &SearchTarget,
        status: AttemptStatus,
        page_title: Option<String>,
        error_message: Option<String>,
    ) {
        let attempt = NewAttempt {
            session_id: self.session_id.clone(),
            platform: target.platform.clone(),
            platform_name: target.platform_name.clone(),
            job_title: target.title.clone(),
            company: None,
            location: target.location.clone(),
            url: target.url.clone(),
            page_title,
            status,
            error_message,
            timestamp: Utc::now().to_rfc3339(),
        };

        if let Err(e) = self.ledger.insert(&attempt).await {
            error!(url = %target.url, "Failed to record attempt: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    fn target(url: &str) -> SearchTarget {
        SearchTarget {
            platform: "indeed".to_string(),
            platform_name: "Indeed".to_string(),
            title: "Rust Engineer".to_string(),
            location: "Remote".to_string(),
            url: url.to_string(),
        }
    }

    struct ScriptedAction {
        calls: AtomicUsize,
        results: Mutex<Vec<Result<ActionOutcome, ActionError>>>,
    }

    impl ScriptedAction {
        fn new(results: Vec<Result<ActionOutcome, ActionError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Action for ScriptedAction {
        async fn execute(&self, _target: &SearchTarget) -> Result<ActionOutcome, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Err(ActionError::Transient("exhausted script".to_string()))
            } else {
                results.remove(0)
            }
        }
    }

    fn always_transient() -> ScriptedAction {
        ScriptedAction::new(Vec::new())
    }

    fn runner_fixture(ledger: &Ledger) -> AttemptRunner<'_> {
        AttemptRunner::new(
            ledger,
            "test_session".to_string(),
            3,
            BackoffPolicy::new(2, Duration::from_secs(1)),
        )
    }

    #[test]
    fn backoff_delays_double() {
        let policy = BackoffPolicy::new(2, Duration::from_secs(1));
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn success_records_visited() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = runner_fixture(&ledger);
        let action = ScriptedAction::new(vec![Ok(ActionOutcome::Visited {
            page_title: Some("Jobs | Indeed".to_string()),
        })]);

        let outcome = runner.process(&target("https://indeed.example/1"), &action).await;
        assert_eq!(outcome, Outcome::Succeeded(AttemptStatus::Visited));
        assert_eq!(action.calls(), 1);

        let records = ledger.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttemptStatus::Visited);
        assert_eq!(records[0].page_title.as_deref(), Some("Jobs | Indeed"));
        assert_eq!(records[0].error_message, None);
    }

    #[tokio::test]
    async fn applied_outcome_records_applied() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = runner_fixture(&ledger);
        let action = ScriptedAction::new(vec![Ok(ActionOutcome::Applied { page_title: None })]);

        let outcome = runner.process(&target("https://indeed.example/2"), &action).await;
        assert_eq!(outcome, Outcome::Succeeded(AttemptStatus::Applied));
        assert_eq!(
            ledger.recent(1).await.unwrap()[0].status,
            AttemptStatus::Applied
        );
    }

    #[tokio::test]
    async fn known_url_is_skipped_without_invoking_action() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = runner_fixture(&ledger);
        let action = ScriptedAction::new(vec![Ok(ActionOutcome::Visited { page_title: None })]);

        let t = target("https://indeed.example/seen");
        assert_eq!(runner.process(&t, &action).await, Outcome::Succeeded(AttemptStatus::Visited));
        assert_eq!(action.calls(), 1);

        // Second pass over the same URL, even with a fresh runner session.
        let runner2 = AttemptRunner::new(
            &ledger,
            "another_session".to_string(),
            3,
            BackoffPolicy::default(),
        );
        assert_eq!(runner2.process(&t, &action).await, Outcome::Skipped);
        assert_eq!(action.calls(), 1);
        assert_eq!(ledger.total().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_url_is_never_reattempted() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = runner_fixture(&ledger);
        let action = ScriptedAction::new(vec![Err(ActionError::Auth("expired".to_string()))]);

        let t = target("https://indeed.example/failed");
        assert!(matches!(
            runner.process(&t, &action).await,
            Outcome::Failed { .. }
        ));

        let retry_action = ScriptedAction::new(vec![Ok(ActionOutcome::Visited { page_title: None })]);
        assert_eq!(runner.process(&t, &retry_action).await, Outcome::Skipped);
        assert_eq!(retry_action.calls(), 0);
    }

    #[tokio::test]
    async fn retry_exhaustion_invokes_four_times_with_doubling_waits() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        // Millisecond unit keeps the full 1 + 2 + 4 wait sequence real but
        // cheap; the per-retry arithmetic is pinned by backoff_delays_double.
        let runner = AttemptRunner::new(
            &ledger,
            "test_session".to_string(),
            3,
            BackoffPolicy::new(2, Duration::from_millis(1)),
        );
        let action = always_transient();

        let start = Instant::now();
        let outcome = runner.process(&target("https://indeed.example/flaky"), &action).await;

        assert_eq!(
            outcome,
            Outcome::Failed {
                error: "exhausted script".to_string()
            }
        );
        assert_eq!(action.calls(), 4);
        assert!(start.elapsed() >= Duration::from_millis(7));

        let records = ledger.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttemptStatus::Failed);
        assert_eq!(records[0].error_message.as_deref(), Some("exhausted script"));
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = runner_fixture(&ledger);
        let action = ScriptedAction::new(vec![Err(ActionError::Auth(
            "login challenge".to_string(),
        ))]);

        let outcome = runner.process(&target("https://linkedin.example/auth"), &action).await;

        assert_eq!(
            outcome,
            Outcome::Failed {
                error: "login challenge".to_string()
            }
        );
        assert_eq!(action.calls(), 1);

        let records = ledger.recent(1).await.unwrap();
        assert_eq!(records[0].status, AttemptStatus::Failed);
        assert_eq!(
            records[0].error_message.as_deref(),
            Some("login challenge")
        );
    }

    #[tokio::test]
    async fn long_error_messages_are_truncated_in_the_record() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let runner = AttemptRunner::new(
            &ledger,
            "test_session".to_string(),
            0,
            BackoffPolicy::default(),
        );
        let action = ScriptedAction::new(vec![Err(ActionError::Transient("e".repeat(500)))]);

        runner.process(&target("https://indeed.example/long"), &action).await;

        let records = ledger.recent(1).await.unwrap();
        let stored = records[0].error_message.as_deref().unwrap();
        assert_eq!(stored.chars().count(), 200);
    }
}
