// src/platforms.rs
//! Job-board catalog and search-target generation.
//!
//! Each platform carries a URL template with `{title}` and `{location}`
//! placeholders. Adding a board means adding one entry here and enabling
//! it in the config.

use crate::config::AppConfig;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PlatformSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub url_template: &'static str,
}

pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        key: "dice",
        name: "Dice.com",
        url_template: "https://www.dice.com/jobs?q={title}&location={location}&radius=30",
    },
    PlatformSpec {
        key: "ziprecruiter",
        name: "ZipRecruiter",
        url_template: "https://www.ziprecruiter.com/jobs/search?search={title}&location={location}",
    },
    PlatformSpec {
        key: "glassdoor",
        name: "Glassdoor",
        url_template: "https://www.glassdoor.com/Job/jobs.htm?sc.keyword={title}",
    },
    PlatformSpec {
        key: "indeed",
        name: "Indeed",
        url_template: "https://www.indeed.com/jobs?q={title}&l={location}",
    },
    PlatformSpec {
        key: "linkedin",
        name: "LinkedIn",
        url_template: "https://www.linkedin.com/jobs/search/?keywords={title}&location={location}",
    },
    PlatformSpec {
        key: "builtin",
        name: "BuiltIn",
        url_template: "https://builtin.com/jobs?search={title}",
    },
    PlatformSpec {
        key: "jobright_ai",
        name: "JobRight.AI",
        url_template: "https://jobright.ai/jobs?q={title}&location={location}",
    },
    PlatformSpec {
        key: "weworkremotely",
        name: "WeWorkRemotely",
        url_template: "https://weworkremotely.com/remote-jobs/search?term={title}",
    },
    // Remotive has no search parameters; every title/location pair maps
    // to the same listing page and dedup collapses them.
    PlatformSpec {
        key: "remotive",
        name: "Remotive.io",
        url_template: "https://remotive.com/remote-jobs/software-dev",
    },
    PlatformSpec {
        key: "letsworkremotely",
        name: "LetsWorkRemotely",
        url_template: "https://letsworkremotely.com/remote-jobs/search?term={title}",
    },
    PlatformSpec {
        key: "toptal",
        name: "Toptal",
        url_template: "https://www.toptal.com/jobs",
    },
    PlatformSpec {
        key: "hired",
        name: "Hired.com",
        url_template: "https://hired.com/jobs",
    },
    PlatformSpec {
        key: "wellfound",
        name: "Wellfound (AngelList)",
        url_template: "https://wellfound.com/jobs?query={title}",
    },
    PlatformSpec {
        key: "theladders",
        name: "TheLadders.com",
        url_template: "https://www.theladders.com/jobs/search-jobs?keywords={title}",
    },
    PlatformSpec {
        key: "flexa",
        name: "Flexa.com",
        url_template: "https://flexa.careers/search?query={title}",
    },
    PlatformSpec {
        key: "zapier",
        name: "Zapier Jobs",
        url_template: "https://zapier.com/jobs",
    },
    PlatformSpec {
        key: "nodesk",
        name: "NoDesk.co",
        url_template: "https://nodesk.co/remote-jobs/search/?query={title}",
    },
    PlatformSpec {
        key: "dynamitejobs",
        name: "DynamiteJobs.com",
        url_template: "https://dynamitejobs.com/remote-jobs?q={title}",
    },
    PlatformSpec {
        key: "monster",
        name: "Monster.com",
        url_template: "https://www.monster.com/jobs/search?q={title}&where={location}",
    },
    PlatformSpec {
        key: "careerbuilder",
        name: "CareerBuilder",
        url_template: "https://www.careerbuilder.com/jobs?keywords={title}&location={location}",
    },
    PlatformSpec {
        key: "remote_co",
        name: "Remote.co",
        url_template: "https://remote.co/remote-jobs/search/?search_keywords={title}",
    },
    PlatformSpec {
        key: "flexjobs",
        name: "FlexJobs",
        url_template: "https://www.flexjobs.com/search?search={title}&location={location}",
    },
    PlatformSpec {
        key: "angellist",
        name: "AngelList",
        url_template: "https://angel.co/jobs?query={title}",
    },
];

pub fn find_platform(key: &str) -> Option<&'static PlatformSpec> {
    PLATFORMS.iter().find(|p| p.key == key)
}

/// One (platform, title, location, URL) tuple to attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub platform: String,
    pub platform_name: String,
    pub title: String,
    pub location: String,
    pub url: String,
}

fn build_url(template: &str, title: &str, location: &str) -> String {
    template
        .replace("{title}", &urlencoding::encode(title))
        .replace("{location}", &urlencoding::encode(location))
}

/// Generate search targets for every enabled platform crossed with every
/// configured title and location, capped at `max_searches_per_run`.
/// Enabled platforms missing from the catalog are logged and skipped.
pub fn generate_targets(config: &AppConfig) -> Vec<SearchTarget> {
    let enabled = config.enabled_platforms();
    let titles = &config.job_preferences.job_titles;
    let locations = &config.job_preferences.locations;

    info!(
        "Enabled platforms ({}): {}",
        enabled.len(),
        enabled.join(", ")
    );

    let mut targets = Vec::new();
    for key in enabled {
        let Some(spec) = find_platform(key) else {
            warn!("Platform '{}' is enabled but not in the catalog, skipping", key);
            continue;
        };

        for title in titles {
            for location in locations {
                targets.push(SearchTarget {
                    platform: spec.key.to_string(),
                    platform_name: spec.name.to_string(),
                    title: title.clone(),
                    location: location.clone(),
                    url: build_url(spec.url_template, title, location),
                });
            }
        }
    }

    let cap = config.automation_settings.max_searches_per_run;
    if targets.len() > cap {
        info!("Capping {} generated targets to {}", targets.len(), cap);
        targets.truncate(cap);
    }

    info!("Generated {} search targets", targets.len());
    targets
}
