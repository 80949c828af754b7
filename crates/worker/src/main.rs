mod check;
mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sitesafe_events::store::{NotificationStore, PgNotificationStore};
use sitesafe_events::{
    CampaignAutomation, ExpiryReminderJob, NotifyConfig, NotifyError, ReminderScheduler,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::ExpiryReminders { database_url } => {
            let notify = NotifyConfig::from_env()?;
            let store = connect(&database_url).await?;
            let url = notify
                .expiry_webhook_url
                .clone()
                .ok_or(NotifyError::NotConfigured("EXPIRY_WEBHOOK_URL"))?;
            let job = ExpiryReminderJob::new(store, notify.webhook_client()?, url);

            let result = job.run().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::ReminderScan { database_url } => {
            let notify = NotifyConfig::from_env()?;
            let store = connect(&database_url).await?;
            let mailer = notify.build_mailer(&notify.webhook_client()?)?;
            let automation =
                CampaignAutomation::new(Arc::clone(&store), mailer, notify.campaign_links());
            let scheduler = ReminderScheduler::new(store, Arc::new(automation));

            let result = scheduler.run().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.failed > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::CheckConfig => {
            let report = check::check_environment(|name| std::env::var(name).ok());
            println!("{report}");
            Ok(if report.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

/// Logs go to stderr so stdout carries only the command result.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sitesafe_worker=info,sitesafe_events=info".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn connect(database_url: &str) -> anyhow::Result<Arc<dyn NotificationStore>> {
    let pool = sitesafe_db::create_pool(database_url)
        .await
        .context("Failed to connect to database")?;
    sitesafe_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");
    Ok(Arc::new(PgNotificationStore::new(pool)))
}
