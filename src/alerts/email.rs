use crate::config::settings::EmailConfig;
use crate::models::AccountInfo;
use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Outgoing alert notifications. One implementation delivers over
/// SMTP; tests swap in a recording fake.
pub trait Mailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .with_context(|| format!("Invalid sender address: {}", config.from))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_relay)
            .with_context(|| format!("Invalid SMTP relay: {}", config.smtp_relay))?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .with_context(|| format!("Invalid recipient address: {to}"))?)
            .subject(subject)
            .body(body.to_string())
            .context("Failed to build alert email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        Ok(())
    }
}

pub fn alert_subject(account: &AccountInfo) -> String {
    format!(
        "Google Ads Account {} ({}) misbehaved.",
        account.name, account.id
    )
}

pub fn alert_body(account: &AccountInfo, alert_lines: &[String], dashboard_url: &str) -> String {
    format!(
        "Your account {} ({}) is not performing as expected today: \n\n{}\n\n\
         Log into Google Ads and take a look.\n\nAlerts dashboard: {}",
        account.name,
        account.id,
        alert_lines.join("\n"),
        dashboard_url
    )
}
