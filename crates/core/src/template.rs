//! Email template rendering by named placeholder substitution.
//!
//! Templates contain `{{name}}` tokens. Rendering applies an explicit
//! key→value map in a single regex pass: substituted values are never
//! re-scanned, and placeholders with no entry in the map are left in the
//! output verbatim.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::campaign::CampaignType;

/// Regex pattern matching `{{placeholder}}` tokens (inner whitespace allowed).
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Placeholder values for one rendered email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    values: BTreeMap<String, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitute every known `{{placeholder}}` in `template`.
///
/// Unknown placeholders are kept as literal text.
pub fn render(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Placeholders in `template` that `vars` does not provide.
pub fn unresolved(template: &str, vars: &TemplateVars) -> Vec<String> {
    placeholders(template)
        .into_iter()
        .filter(|name| vars.get(name).is_none())
        .collect()
}

// ---------------------------------------------------------------------------
// Campaign templates
// ---------------------------------------------------------------------------

/// Subject and body template pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

/// A rendered email ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    pub fn render(&self, vars: &TemplateVars) -> RenderedEmail {
        RenderedEmail {
            subject: render(&self.subject, vars),
            body: render(&self.body, vars),
        }
    }
}

const INITIAL_BODY: &str = "<p>Hi {{contractor_name}},</p>\
<p>{{company_name}} is scheduled for <strong>{{job_title}}</strong> at {{site_name}} ({{site_address}}). \
Before work starts we need your Safe Work Method Statement.</p>\
<p>Please upload it by <strong>{{due_date}}</strong> ({{days_remaining}} days from today):</p>\
<p><a href=\"{{portal_url}}\">Submit your SWMS</a></p>\
<p>The link is personal to you and expires in 30 days.</p>\
<img src=\"{{tracking_pixel_url}}\" width=\"1\" height=\"1\" alt=\"\" />";

const REMINDER_BODY: &str = "<p>Hi {{contractor_name}},</p>\
<p>We have not yet received an approved SWMS from {{company_name}} for <strong>{{job_title}}</strong> at {{site_name}}.</p>\
<p>The due date is <strong>{{due_date}}</strong> ({{days_remaining}} days remaining).</p>\
<p><a href=\"{{portal_url}}\">Submit your SWMS</a></p>\
<img src=\"{{tracking_pixel_url}}\" width=\"1\" height=\"1\" alt=\"\" />";

const FINAL_BODY: &str = "<p>Hi {{contractor_name}},</p>\
<p>This is the final notice for <strong>{{job_title}}</strong> at {{site_name}}. \
Without an approved SWMS by <strong>{{due_date}}</strong>, {{company_name}} will not be permitted on site.</p>\
<p><a href=\"{{portal_url}}\">Submit your SWMS now</a></p>\
<img src=\"{{tracking_pixel_url}}\" width=\"1\" height=\"1\" alt=\"\" />";

/// Built-in template for a campaign type.
pub fn default_template(campaign_type: CampaignType) -> EmailTemplate {
    let body = match campaign_type {
        CampaignType::Initial => INITIAL_BODY,
        CampaignType::Reminder7 | CampaignType::Reminder14 => REMINDER_BODY,
        CampaignType::Final21 => FINAL_BODY,
    };
    EmailTemplate::new("{{campaign_label}}: {{job_title}} ({{site_name}})", body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_every_occurrence() {
        let vars = TemplateVars::new().with("name", "Acme");
        assert_eq!(
            render("{{name}} / {{ name }} / {{name}}", &vars),
            "Acme / Acme / Acme"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_untouched() {
        let vars = TemplateVars::new().with("known", "yes");
        assert_eq!(
            render("{{known}} and {{unknown}}", &vars),
            "yes and {{unknown}}"
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let vars = TemplateVars::new()
            .with("a", "{{b}}")
            .with("b", "boom");
        assert_eq!(render("{{a}}", &vars), "{{b}}");
    }

    #[test]
    fn single_braces_are_not_placeholders() {
        let vars = TemplateVars::new().with("x", "1");
        assert_eq!(render("{x} {{x}}", &vars), "{x} 1");
    }

    #[test]
    fn placeholders_are_distinct_and_ordered() {
        assert_eq!(
            placeholders("{{b}} {{a}} {{b}} {{ c }}"),
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn unresolved_lists_missing_keys() {
        let vars = TemplateVars::new().with("a", "1");
        assert_eq!(unresolved("{{a}} {{b}}", &vars), vec!["b".to_string()]);
    }

    #[test]
    fn default_templates_use_only_documented_placeholders() {
        let documented = [
            "contractor_name",
            "company_name",
            "job_title",
            "site_name",
            "site_address",
            "due_date",
            "days_remaining",
            "portal_url",
            "tracking_pixel_url",
            "campaign_label",
        ];
        for t in CampaignType::ALL {
            let template = default_template(t);
            for name in placeholders(&template.subject)
                .into_iter()
                .chain(placeholders(&template.body))
            {
                assert!(documented.contains(&name.as_str()), "undocumented {name}");
            }
        }
    }

    #[test]
    fn rendered_default_template_has_no_leftovers() {
        let vars = TemplateVars::new()
            .with("contractor_name", "Sam")
            .with("company_name", "Acme Scaffolding")
            .with("job_title", "Level 3 formwork")
            .with("site_name", "Harbour St")
            .with("site_address", "12 Harbour St")
            .with("due_date", "2024-07-01")
            .with("days_remaining", 14)
            .with("portal_url", "https://example.test/portal/abc")
            .with("tracking_pixel_url", "https://example.test/t/xyz")
            .with("campaign_label", CampaignType::Initial.label());
        let email = default_template(CampaignType::Initial).render(&vars);
        assert_eq!(
            email.subject,
            "SWMS submission request: Level 3 formwork (Harbour St)"
        );
        assert!(!email.body.contains("{{"));
        assert!(email.body.contains("https://example.test/portal/abc"));
    }
}
