use clap::{Parser, Subcommand};

/// SiteSafe worker: one-shot notification jobs for cron.
#[derive(Parser)]
#[command(name = "sitesafe-worker", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send the certification expiry reminder batch
    ExpiryReminders {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },

    /// Schedule follow-ups and run every due SWMS campaign
    ReminderScan {
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        database_url: String,
    },

    /// Validate the environment and print a report
    CheckConfig,
}
