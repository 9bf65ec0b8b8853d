use chrono::{Datelike, Duration, Utc};

use crate::domain::model::OutgoingMail;

pub const APP_NAME: &str = "Stargram";
pub const RESET_SUBJECT: &str = "Redefinição de senha – Stargram";

/// Built-in reset mail, used when no template path is configured.
pub const DEFAULT_RESET_TEMPLATE: &str = include_str!("../../templates/reset-password.html");

/// HTML template for the password-reset mail.
#[derive(Debug, Clone)]
pub struct ResetMailTemplate {
    html: String,
}

impl Default for ResetMailTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_TEMPLATE)
    }
}

impl ResetMailTemplate {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn render(&self, to: &str, reset_url: &str, expires_in: Duration) -> OutgoingMail {
        let html = self
            .html
            .replace("{{APP_NAME}}", APP_NAME)
            .replace("{{RESET_URL}}", reset_url)
            .replace("{{EXPIRES_IN}}", &describe_duration(expires_in))
            .replace("{{YEAR}}", &Utc::now().year().to_string());
        OutgoingMail {
            to: to.to_string(),
            subject: RESET_SUBJECT.to_string(),
            html,
        }
    }
}

/// Human wording of the validity window, in Portuguese like the rest of the mail.
fn describe_duration(d: Duration) -> String {
    let minutes = d.num_minutes();
    if minutes % 60 == 0 && minutes > 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "1 hora".to_string()
        } else {
            format!("{hours} horas")
        }
    } else if minutes == 1 {
        "1 minuto".to_string()
    } else {
        format!("{minutes} minutos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_placeholder() {
        let tpl = ResetMailTemplate::new("{{APP_NAME}}|{{RESET_URL}}|{{EXPIRES_IN}}|{{YEAR}}");
        let mail = tpl.render("a@b.co", "http://x/reset?token=t", Duration::minutes(60));
        let year = Utc::now().year().to_string();
        assert_eq!(mail.html, format!("Stargram|http://x/reset?token=t|1 hora|{year}"));
        assert_eq!(mail.subject, RESET_SUBJECT);
        assert_eq!(mail.to, "a@b.co");
    }

    #[test]
    fn builtin_template_has_placeholders() {
        for p in ["{{APP_NAME}}", "{{RESET_URL}}", "{{EXPIRES_IN}}", "{{YEAR}}"] {
            assert!(DEFAULT_RESET_TEMPLATE.contains(p), "{p}");
        }
    }

    #[test]
    fn durations() {
        assert_eq!(describe_duration(Duration::minutes(120)), "2 horas");
        assert_eq!(describe_duration(Duration::minutes(30)), "30 minutos");
    }
}
