use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_system_message(
        &self,
        subject: &str,
        html: &str,
        email: &str,
        name: &str,
    ) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    to_name: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Delivers mail by POSTing JSON to an HTTP relay.
pub struct HttpMailSender {
    client: reqwest::Client,
    relay_url: String,
    from: String,
}

impl HttpMailSender {
    pub fn new(relay_url: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            relay_url,
            from,
        }
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send_system_message(
        &self,
        subject: &str,
        html: &str,
        email: &str,
        name: &str,
    ) -> Result<()> {
        let message = RelayMessage {
            from: &self.from,
            to: email,
            to_name: name,
            subject,
            html,
        };

        let response = self
            .client
            .post(&self.relay_url)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("mail relay answered {}", response.status()));
        }

        Ok(())
    }
}

/// Writes messages to the log instead of sending them.
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_system_message(
        &self,
        subject: &str,
        html: &str,
        email: &str,
        name: &str,
    ) -> Result<()> {
        info!(to = %email, name = %name, subject = %subject, "📧 {}", html);
        Ok(())
    }
}
