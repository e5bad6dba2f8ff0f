// src/lib.rs
//! Core of a personal job-application automation toolkit: a persistent,
//! deduplicating ledger of visit/apply attempts, a bounded-retry runner
//! around an injected external action, typed configuration with
//! environment-variable substitution, and a reporting CLI.
//!
//! Browser automation, DOM scraping and mail delivery are collaborators
//! behind the [`runner::Action`] and [`notify::Notifier`] traits, not
//! part of this crate.

pub mod cli;
pub mod config;
pub mod ledger;
pub mod notify;
pub mod platforms;
pub mod run;
pub mod runner;
pub mod utils;

pub use config::{AppConfig, ConfigError};
pub use ledger::{AttemptRecord, AttemptStatus, Ledger, LedgerError, NewAttempt};
pub use notify::{LogNotifier, Notifier, RunSummary};
pub use platforms::{generate_targets, SearchTarget, PLATFORMS};
pub use run::run_session;
pub use runner::{Action, ActionError, ActionOutcome, AttemptRunner, BackoffPolicy, Outcome};
