//! Environment validation for `sitesafe-worker check-config`.
//!
//! Values are read through a lookup function so the checks never touch the
//! process environment directly. Secret values are never echoed.

use std::fmt;

use sitesafe_events::delivery::email::AutomationProvider;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Ok,
    Warning,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Ok => "ok",
            Level::Warning => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub variable: &'static str,
    pub level: Level,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ConfigReport {
    pub findings: Vec<Finding>,
}

impl ConfigReport {
    fn push(&mut self, variable: &'static str, level: Level, message: impl Into<String>) {
        self.findings.push(Finding {
            variable,
            level,
            message: message.into(),
        });
    }

    pub fn count(&self, level: Level) -> usize {
        self.findings.iter().filter(|f| f.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Level::Error) > 0
    }

    pub fn finding(&self, variable: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.variable == variable)
    }
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(
                f,
                "[{:<5}] {:<30} {}",
                finding.level.tag(),
                finding.variable,
                finding.message
            )?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.count(Level::Error),
            self.count(Level::Warning)
        )
    }
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Run every check against `lookup`. Empty values count as unset.
pub fn check_environment<F>(lookup: F) -> ConfigReport
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut report = ConfigReport::default();

    match get("DATABASE_URL") {
        None => report.push("DATABASE_URL", Level::Error, "required"),
        Some(value) => match Url::parse(&value) {
            Ok(url) if matches!(url.scheme(), "postgres" | "postgresql") => {
                report.push("DATABASE_URL", Level::Ok, "set")
            }
            Ok(url) => report.push(
                "DATABASE_URL",
                Level::Error,
                format!("unsupported scheme '{}'", url.scheme()),
            ),
            Err(e) => report.push("DATABASE_URL", Level::Error, format!("not a URL: {e}")),
        },
    }

    for name in ["JWT_SECRET", "CRON_SECRET"] {
        match get(name) {
            Some(_) => report.push(name, Level::Ok, "set"),
            None => report.push(name, Level::Error, "required"),
        }
    }

    let provider = match get("AUTOMATION_PROVIDER") {
        None => Some(AutomationProvider::default()),
        Some(value) => match value.parse::<AutomationProvider>() {
            Ok(provider) => Some(provider),
            Err(e) => {
                report.push("AUTOMATION_PROVIDER", Level::Error, e.to_string());
                None
            }
        },
    };
    if let Some(provider) = provider {
        report.push("AUTOMATION_PROVIDER", Level::Ok, provider.as_str());
    }

    match provider {
        Some(AutomationProvider::Webhook) => check_url(
            &mut report,
            "EMAIL_WEBHOOK_URL",
            get("EMAIL_WEBHOOK_URL"),
            Level::Error,
            "required for the webhook provider",
        ),
        Some(AutomationProvider::Smtp) => match get("SMTP_HOST") {
            Some(host) => report.push("SMTP_HOST", Level::Ok, host),
            None => report.push("SMTP_HOST", Level::Error, "required for the smtp provider"),
        },
        None => {}
    }

    check_url(
        &mut report,
        "EXPIRY_WEBHOOK_URL",
        get("EXPIRY_WEBHOOK_URL"),
        Level::Warning,
        "expiry reminders disabled",
    );
    check_url(
        &mut report,
        "COMPLIANCE_ALERT_WEBHOOK_URL",
        get("COMPLIANCE_ALERT_WEBHOOK_URL"),
        Level::Warning,
        "compliance alerts disabled",
    );
    check_url(
        &mut report,
        "PUBLIC_BASE_URL",
        get("PUBLIC_BASE_URL"),
        Level::Ok,
        "using default",
    );
    check_url(
        &mut report,
        "PORTAL_BASE_URL",
        get("PORTAL_BASE_URL"),
        Level::Ok,
        "using default",
    );

    for (name, when_missing) in [
        ("WEBHOOK_SIGNING_SECRET", "outbound webhooks are unsigned"),
        ("TRACKING_WEBHOOK_SECRET", "tracking events are not verified"),
        ("OPENAI_API_KEY", "document extraction unavailable"),
    ] {
        match get(name) {
            Some(_) => report.push(name, Level::Ok, "set"),
            None => report.push(name, Level::Warning, when_missing),
        }
    }

    report
}

/// A set URL must parse with an `http` or `https` scheme; an unset one is
/// reported at `missing_level`.
fn check_url(
    report: &mut ConfigReport,
    name: &'static str,
    value: Option<String>,
    missing_level: Level,
    missing_message: &str,
) {
    let Some(value) = value else {
        report.push(name, missing_level, missing_message);
        return;
    };
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            report.push(name, Level::Ok, url.as_str())
        }
        Ok(url) => report.push(
            name,
            Level::Error,
            format!("scheme must be http or https, got '{}'", url.scheme()),
        ),
        Err(e) => report.push(name, Level::Error, format!("not a URL: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://sitesafe@localhost/sitesafe"),
            ("JWT_SECRET", "jwt"),
            ("CRON_SECRET", "cron"),
            ("EMAIL_WEBHOOK_URL", "https://hooks.example.com/email"),
            ("EXPIRY_WEBHOOK_URL", "https://hooks.example.com/expiry"),
            ("COMPLIANCE_ALERT_WEBHOOK_URL", "https://hooks.example.com/alerts"),
            ("WEBHOOK_SIGNING_SECRET", "sign"),
            ("TRACKING_WEBHOOK_SECRET", "track"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
    }

    // -----------------------------------------------------------------------
    // Required values
    // -----------------------------------------------------------------------

    #[test]
    fn complete_environment_is_clean() {
        let report = check_environment(env(&complete()));
        assert!(!report.has_errors(), "{report}");
        assert_eq!(report.count(Level::Warning), 0, "{report}");
    }

    #[test]
    fn missing_secrets_are_errors() {
        let report = check_environment(env(&[]));
        assert!(report.has_errors());
        for name in ["DATABASE_URL", "JWT_SECRET", "CRON_SECRET", "EMAIL_WEBHOOK_URL"] {
            assert_eq!(report.finding(name).unwrap().level, Level::Error, "{name}");
        }
    }

    #[test]
    fn blank_value_counts_as_unset() {
        let mut vars = complete();
        vars.retain(|(k, _)| *k != "CRON_SECRET");
        vars.push(("CRON_SECRET", "   "));
        let report = check_environment(env(&vars));
        assert_eq!(report.finding("CRON_SECRET").unwrap().level, Level::Error);
    }

    // -----------------------------------------------------------------------
    // URLs and provider
    // -----------------------------------------------------------------------

    #[test]
    fn non_http_webhook_url_is_rejected() {
        let mut vars = complete();
        vars.retain(|(k, _)| *k != "EXPIRY_WEBHOOK_URL");
        vars.push(("EXPIRY_WEBHOOK_URL", "ftp://hooks.example.com/expiry"));
        let report = check_environment(env(&vars));
        let finding = report.finding("EXPIRY_WEBHOOK_URL").unwrap();
        assert_eq!(finding.level, Level::Error);
        assert!(finding.message.contains("ftp"));
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let mut vars = complete();
        vars.push(("AUTOMATION_PROVIDER", "carrier-pigeon"));
        let report = check_environment(env(&vars));
        assert_eq!(
            report.finding("AUTOMATION_PROVIDER").unwrap().level,
            Level::Error
        );
        assert!(report.finding("EMAIL_WEBHOOK_URL").is_none());
    }

    #[test]
    fn smtp_provider_requires_host() {
        let mut vars = complete();
        vars.push(("AUTOMATION_PROVIDER", "smtp"));
        let report = check_environment(env(&vars));
        assert_eq!(report.finding("SMTP_HOST").unwrap().level, Level::Error);
    }

    #[test]
    fn optional_integrations_only_warn() {
        let report = check_environment(env(&[
            ("DATABASE_URL", "postgres://localhost/sitesafe"),
            ("JWT_SECRET", "jwt"),
            ("CRON_SECRET", "cron"),
            ("EMAIL_WEBHOOK_URL", "http://localhost:9000/email"),
        ]));
        assert!(!report.has_errors(), "{report}");
        assert_eq!(
            report.finding("OPENAI_API_KEY").unwrap().level,
            Level::Warning
        );
        assert_eq!(
            report.finding("EXPIRY_WEBHOOK_URL").unwrap().level,
            Level::Warning
        );
    }

    #[test]
    fn report_never_prints_secret_values() {
        let report = check_environment(env(&complete()));
        let rendered = report.to_string();
        assert!(!rendered.contains("sk-test"));
        assert!(!rendered.contains("sitesafe@localhost"));
    }
}
