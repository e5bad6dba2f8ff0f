// src/cli.rs
use crate::config::AppConfig;
use crate::ledger::Ledger;
use crate::platforms::generate_targets;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobpilot")]
#[command(about = "Application ledger and search planner for the job automation runs")]
pub struct JobPilotCli {
    #[command(subcommand)]
    pub command: JobPilotCommand,

    #[arg(long, default_value = "logs/job_applications.db")]
    pub database_path: PathBuf,
}

#[derive(Subcommand)]
pub enum JobPilotCommand {
    /// Initialize the ledger database
    Init,
    /// Show ledger statistics: totals, per-platform, per-status, recent
    Stats,
    /// List the most recent attempts
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Load the config and print the search targets a run would attempt
    Targets {
        #[arg(long, default_value = "config/config.json")]
        config: PathBuf,
    },
}

pub async fn handle_command(cli: JobPilotCli) -> Result<()> {
    match cli.command {
        JobPilotCommand::Init => {
            Ledger::open(&cli.database_path).await?;
            println!("Ledger initialized at {}", cli.database_path.display());
        }

        JobPilotCommand::Stats => {
            let ledger = Ledger::open(&cli.database_path).await?;
            print_stats(&ledger).await?;
        }

        JobPilotCommand::Recent { limit } => {
            let ledger = Ledger::open(&cli.database_path).await?;
            let records = ledger.recent(limit).await?;
            if records.is_empty() {
                println!("No attempts recorded yet.");
            }
            for record in records {
                println!(
                    "{}: {} in {} [{}]",
                    record.platform_name, record.job_title, record.location, record.status
                );
                println!("    Time: {}", record.timestamp);
            }
        }

        JobPilotCommand::Targets { config } => {
            let config = AppConfig::load(&config)?;
            let targets = generate_targets(&config);
            println!("{} search targets:", targets.len());
            for target in targets {
                println!(
                    "  {} | {} | {}",
                    target.platform_name, target.title, target.location
                );
                println!("    {}", target.url);
            }
        }
    }

    Ok(())
}

async fn print_stats(ledger: &Ledger) -> Result<()> {
    println!("{}", "=".repeat(70));
    println!(" JOB AUTOMATION STATISTICS");
    println!("{}", "=".repeat(70));
    println!();
    println!("Total attempts: {}", ledger.total().await?);

    println!("\nBy platform:");
    for (platform, count) in ledger.count_by_platform().await? {
        println!("  {platform}: {count}");
    }

    println!("\nBy status:");
    for (status, count) in ledger.count_by_status().await? {
        println!("  {status}: {count}");
    }

    println!("\nMost recent attempts:");
    for record in ledger.recent(10).await? {
        println!(
            "  {}: {} in {}",
            record.platform_name, record.job_title, record.location
        );
        println!("    Time: {}", record.timestamp);
    }

    println!("\nTotal sessions: {}", ledger.session_count().await?);
    println!();
    println!("{}", "=".repeat(70));
    Ok(())
}
