// src/run.rs
//! Drives one full session: generate targets from the config, process
//! them strictly one at a time through the attempt runner, then deliver
//! the summary. An interrupt stops between targets; everything already
//! written to the ledger stays written and the summary still goes out.

use crate::config::AppConfig;
use crate::ledger::Ledger;
use crate::notify::{send_summary, Notifier, RunSummary};
use crate::platforms::generate_targets;
use crate::runner::{Action, AttemptRunner, BackoffPolicy, Outcome};
use crate::utils::new_session_id;
use std::time::Duration;
use tracing::info;

pub async fn run_session(
    config: &AppConfig,
    ledger: &Ledger,
    action: &dyn Action,
    notifier: &dyn Notifier,
) -> RunSummary {
    let session_id = new_session_id();
    info!("Session started: {session_id}");

    let settings = &config.automation_settings;
    let runner = AttemptRunner::new(
        ledger,
        session_id.clone(),
        settings.max_retries,
        BackoffPolicy::new(settings.backoff_base, Duration::from_secs(1)),
    );

    let targets = generate_targets(config);
    let delay = Duration::from_secs(settings.delay_between_searches_secs);
    let manual_window = Duration::from_secs(settings.manual_interaction_time_secs);

    let mut summary = RunSummary::new(session_id);
    let mut interrupted = false;

    for (idx, target) in targets.iter().enumerate() {
        info!("[{}/{}] {}", idx + 1, targets.len(), target.platform_name);

        let outcome = tokio::select! {
            outcome = runner.process(target, action) => outcome,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping after {} targets", idx);
                interrupted = true;
                break;
            }
        };

        // Window for manual login or form review on a visited page.
        if manual_window > Duration::ZERO && matches!(outcome, Outcome::Succeeded(_)) {
            info!("Manual interaction window: {:?}", manual_window);
            tokio::time::sleep(manual_window).await;
        }

        summary.record(target, &outcome);

        if idx + 1 < targets.len() && delay > Duration::ZERO {
            info!("Waiting {:?} before next target", delay);
            tokio::time::sleep(delay).await;
        }
    }

    if interrupted {
        info!("Run interrupted; sending partial summary");
    }
    send_summary(notifier, &summary).await;

    info!(
        "Run completed: {} visited, {} applied, {} failed, {} skipped",
        summary.visited.len(),
        summary.applied.len(),
        summary.failed.len(),
        summary.skipped
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, AutomationSettings, JobPreferences, PersonalInfo};
    use crate::notify::LogNotifier;
    use crate::platforms::SearchTarget;
    use crate::runner::{ActionError, ActionOutcome};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingAction {
        calls: AtomicUsize,
        fail_platform: Option<&'static str>,
    }

    #[async_trait]
    impl Action for CountingAction {
        async fn execute(&self, target: &SearchTarget) -> Result<ActionOutcome, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_platform {
                Some(platform) if target.platform == platform => {
                    Err(ActionError::Auth("not signed in".to_string()))
                }
                _ => Ok(ActionOutcome::Visited { page_title: None }),
            }
        }
    }

    fn config(platforms: &[&str]) -> AppConfig {
        AppConfig {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: String::new(),
            },
            job_preferences: JobPreferences {
                job_titles: vec!["Rust Engineer".to_string()],
                locations: vec!["Remote".to_string()],
            },
            platforms: platforms
                .iter()
                .map(|p| (p.to_string(), true))
                .collect::<BTreeMap<_, _>>(),
            automation_settings: AutomationSettings {
                delay_between_searches_secs: 0,
                manual_interaction_time_secs: 0,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn full_session_visits_each_target_once() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let action = CountingAction {
            calls: AtomicUsize::new(0),
            fail_platform: None,
        };
        let cfg = config(&["indeed", "monster"]);

        let summary = run_session(&cfg, &ledger, &action, &LogNotifier).await;
        assert_eq!(summary.visited.len(), 2);
        assert_eq!(action.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ledger.total().await.unwrap(), 2);

        // Second run over the same config is fully deduplicated.
        let summary = run_session(&cfg, &ledger, &action, &LogNotifier).await;
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.visited.len(), 0);
        assert_eq!(action.calls.load(Ordering::SeqCst), 2);
        assert_eq!(ledger.total().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn one_failing_target_does_not_abort_the_run() {
        let ledger = Ledger::open_in_memory().await.unwrap();
        let action = CountingAction {
            calls: AtomicUsize::new(0),
            fail_platform: Some("linkedin"),
        };
        let cfg = config(&["indeed", "linkedin", "monster"]);

        let summary = run_session(&cfg, &ledger, &action, &LogNotifier).await;
        assert_eq!(summary.visited.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].platform_name, "LinkedIn");
        assert_eq!(ledger.total().await.unwrap(), 3);
    }
}
