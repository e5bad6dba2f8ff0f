// src/notify.rs
//! End-of-run summary and the notification collaborator seam. Actual
//! delivery (mail, chat, whatever) lives outside this crate; the bundled
//! `LogNotifier` just writes the rendered summary to the log.

use crate::ledger::AttemptStatus;
use crate::platforms::SearchTarget;
use crate::runner::Outcome;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SummaryEntry {
    pub platform_name: String,
    pub title: String,
    pub company: Option<String>,
    pub error: Option<String>,
}

/// Per-run tally of terminal outcomes, built up target by target.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub session_id: String,
    pub visited: Vec<SummaryEntry>,
    pub applied: Vec<SummaryEntry>,
    pub failed: Vec<SummaryEntry>,
    pub skipped: usize,
}

impl RunSummary {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            ..Default::default()
        }
    }

    pub fn record(&mut self, target: &SearchTarget, outcome: &Outcome) {
        let mut entry = SummaryEntry {
            platform_name: target.platform_name.clone(),
            title: target.title.clone(),
            company: None,
            error: None,
        };
        match outcome {
            Outcome::Skipped => self.skipped += 1,
            Outcome::Succeeded(AttemptStatus::Applied) => self.applied.push(entry),
            Outcome::Succeeded(_) => self.visited.push(entry),
            Outcome::Failed { error } => {
                entry.error = Some(error.clone());
                self.failed.push(entry);
            }
        }
    }

    pub fn total_attempted(&self) -> usize {
        self.visited.len() + self.applied.len() + self.failed.len()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_attempted();
        if total == 0 {
            0.0
        } else {
            (self.visited.len() + self.applied.len()) as f64 / total as f64 * 100.0
        }
    }

    /// Render the plain-text report body.
    pub fn render(&self) -> String {
        let mut body = String::new();
        body.push_str("Job Automation Summary\n");
        body.push_str(&format!("Date: {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S")));
        body.push_str(&format!("Session: {}\n\n", self.session_id));

        body.push_str(&format!("APPLICATIONS SUBMITTED: {}\n", self.applied.len()));
        body.push_str(&format_entries(&self.applied, false));

        body.push_str(&format!("\nSEARCHES VISITED: {}\n", self.visited.len()));
        body.push_str(&format_entries(&self.visited, false));

        body.push_str(&format!("\nFAILED SEARCHES: {}\n", self.failed.len()));
        body.push_str(&format_entries(&self.failed, true));

        body.push_str(&format!("\nSkipped (already attempted): {}\n", self.skipped));
        body.push_str(&format!("Total attempted: {}\n", self.total_attempted()));
        body.push_str(&format!("Success rate: {:.1}%\n", self.success_rate()));
        body
    }
}

fn format_entries(entries: &[SummaryEntry], as_failures: bool) -> String {
    if entries.is_empty() {
        return "  None\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        if as_failures {
            out.push_str(&format!(
                "  - {}: {}\n",
                entry.platform_name,
                entry.error.as_deref().unwrap_or("Unknown error")
            ));
        } else {
            match &entry.company {
                Some(company) => out.push_str(&format!(
                    "  - {} at {} ({})\n",
                    entry.title, company, entry.platform_name
                )),
                None => out.push_str(&format!(
                    "  - {} ({})\n",
                    entry.title, entry.platform_name
                )),
            }
        }
    }
    out
}

/// Delivery channel for the end-of-run summary. A failed notification
/// must never fail the run; implementations report errors, callers log
/// and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Default notifier: writes the summary through tracing.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &RunSummary) -> anyhow::Result<()> {
        for line in summary.render().lines() {
            info!("{line}");
        }
        Ok(())
    }
}

/// Best-effort delivery wrapper used at the end of a run.
pub async fn send_summary(notifier: &dyn Notifier, summary: &RunSummary) {
    if let Err(e) = notifier.notify(summary).await {
        warn!("Failed to send run summary: {e}");
    }
}
