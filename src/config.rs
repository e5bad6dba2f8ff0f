// src/config.rs
//! Typed run configuration loaded from JSON, with `${VAR}` environment
//! substitution so credentials stay out of the checked-in file.

use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("environment variable '{0}' is not set; add it to your .env file")]
    MissingEnvVar(String),
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPreferences {
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutomationSettings {
    #[serde(default = "default_max_searches")]
    pub max_searches_per_run: usize,
    #[serde(default = "default_delay")]
    pub delay_between_searches_secs: u64,
    #[serde(default)]
    pub manual_interaction_time_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base")]
    pub backoff_base: u32,
    #[serde(default)]
    pub send_email_notifications: bool,
    #[serde(default)]
    pub headless_browser: bool,
}

fn default_max_searches() -> usize {
    25
}

fn default_delay() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u32 {
    2
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            max_searches_per_run: default_max_searches(),
            delay_between_searches_secs: default_delay(),
            manual_interaction_time_secs: 0,
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            send_email_notifications: false,
            headless_browser: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub personal_info: PersonalInfo,
    pub job_preferences: JobPreferences,
    /// Platform key -> enabled flag. Keys must match the platform catalog.
    #[serde(default)]
    pub platforms: BTreeMap<String, bool>,
    #[serde(default)]
    pub automation_settings: AutomationSettings,
}

impl AppConfig {
    /// Load configuration from a JSON file, substituting `${VAR}`
    /// placeholders from the environment first. A `.env` file in the
    /// current directory is loaded if present.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        // Missing .env is fine; explicit env vars still work.
        let _ = dotenvy::dotenv();

        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path.display().to_string()));
        }

        let raw = std::fs::read_to_string(config_path)?;
        let substituted = substitute_env_vars(&raw)?;
        let config: AppConfig = serde_json::from_str(&substituted)?;
        config.validate()?;

        info!("Configuration loaded from {}", config_path.display());
        Ok(config)
    }

    /// Fail fast at load time; the run never starts with a broken config.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.personal_info.name.trim().is_empty() {
            problems.push("personal_info.name is empty");
        }
        if self.personal_info.email.trim().is_empty() {
            problems.push("personal_info.email is empty");
        }
        if self.job_preferences.job_titles.is_empty() {
            problems.push("job_preferences.job_titles is empty");
        }
        if self.job_preferences.locations.is_empty() {
            problems.push("job_preferences.locations is empty");
        }
        if !self.platforms.values().any(|enabled| *enabled) {
            problems.push("no platform is enabled");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// Keys of all enabled platforms, in config order.
    pub fn enabled_platforms(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

/// Replace `${VAR_NAME}` placeholders with environment values. Booleans and
/// integers pass through bare so they stay valid JSON; everything else is
/// emitted as a quoted string.
fn substitute_env_vars(text: &str) -> Result<String, ConfigError> {
    let pattern = Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex");

    let mut missing: Option<String> = None;
    let substituted = pattern.replace_all(text, |caps: &Captures| {
        let var_name = &caps[1];
        match std::env::var(var_name) {
            Ok(value) => render_json_value(&value),
            Err(_) => {
                if missing.is_none() {
                    missing = Some(var_name.to_string());
                }
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(ConfigError::MissingEnvVar(name)),
        None => Ok(substituted.into_owned()),
    }
}

fn render_json_value(value: &str) -> String {
    let lowered = value.to_lowercase();
    if lowered == "true" || lowered == "false" {
        return lowered;
    }
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
