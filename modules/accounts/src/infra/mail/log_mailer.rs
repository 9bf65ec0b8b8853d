use async_trait::async_trait;

use crate::domain::model::OutgoingMail;
use crate::domain::ports::Mailer;

/// Mailer used when SMTP is not configured. Only the envelope is logged;
/// the body holds a live reset link and is dropped.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "SMTP not configured; mail not delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn logs_envelope_but_not_body() {
        LogMailer
            .send(OutgoingMail {
                to: "ana@example.com".into(),
                subject: "Reset".into(),
                html: "<a href=\"http://x/reset-password?token=SECRET123\">go</a>".into(),
            })
            .await
            .unwrap();

        assert!(logs_contain("ana@example.com"));
        assert!(!logs_contain("SECRET123"));
    }
}
