// src/notify/email.rs
use anyhow::{Context, Result};
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{DeliveryReceipt, DigestSender, OutgoingDigest};
use crate::config::Settings;

const SENDER_NAME: &str = "News Digest";

pub struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpSender {
    /// STARTTLS relay on `SMTP_HOST:SMTP_PORT`. No connection is opened here.
    pub fn from_settings(s: &Settings) -> Result<Self> {
        let creds = Credentials::new(s.smtp.user.clone(), s.smtp.pass.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&s.smtp.host)
            .with_context(|| format!("invalid SMTP_HOST `{}`", s.smtp.host))?
            .port(s.smtp.port)
            .credentials(creds)
            .build();

        let mut from: Mailbox = s
            .email_from
            .parse()
            .with_context(|| format!("invalid sender address `{}`", s.email_from))?;
        if from.name.is_none() {
            from.name = Some(SENDER_NAME.to_string());
        }
        let to: Mailbox = s
            .email_to
            .parse()
            .with_context(|| format!("invalid DIGEST_EMAIL_TO `{}`", s.email_to))?;

        Ok(Self { mailer, from, to })
    }

    /// multipart/alternative: text/plain first, text/html preferred.
    pub fn build_message(&self, digest: &OutgoingDigest) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                digest.text.clone(),
                digest.html.clone(),
            ))
            .context("build email")
    }
}

/// Server response lines joined by spaces; the bare reply code when the server sent no text.
fn receipt_id<'a>(lines: impl Iterator<Item = &'a str>, code: impl std::fmt::Display) -> String {
    let id = lines.collect::<Vec<_>>().join(" ");
    if id.trim().is_empty() {
        code.to_string()
    } else {
        id
    }
}

#[async_trait::async_trait]
impl DigestSender for SmtpSender {
    async fn send(&self, digest: &OutgoingDigest) -> Result<DeliveryReceipt> {
        let msg = self.build_message(digest)?;
        tracing::info!(to = %self.to, subject = %digest.subject, "sending digest e-mail");
        let resp = self.mailer.send(msg).await.context("send email")?;

        Ok(DeliveryReceipt {
            id: receipt_id(resp.message(), resp.code()),
        })
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpSettings;

    fn settings(from: &str) -> Settings {
        Settings {
            news_api_key: "k".into(),
            smtp: SmtpSettings {
                host: "localhost".into(),
                port: 2525,
                user: "me@example.test".into(),
                pass: "p".into(),
            },
            email_to: "reader@example.test".into(),
            email_from: from.into(),
        }
    }

    fn digest() -> OutgoingDigest {
        OutgoingDigest {
            subject: "Daily news digest (2 articles) - 2025-03-01".into(),
            html: "<p>hi</p>".into(),
            text: "hi".into(),
        }
    }

    #[test]
    fn message_is_multipart_with_named_sender() {
        let sender = SmtpSender::from_settings(&settings("me@example.test")).unwrap();
        let raw = String::from_utf8(sender.build_message(&digest()).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: Daily news digest (2 articles) - 2025-03-01"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("News Digest"));
        assert!(raw.contains("reader@example.test"));
    }

    #[test]
    fn receipt_id_joins_server_lines() {
        let lines = ["2.0.0 OK", "queued as 4F2A1"];
        assert_eq!(receipt_id(lines.iter().copied(), 250), "2.0.0 OK queued as 4F2A1");
    }

    #[test]
    fn receipt_id_falls_back_to_code() {
        assert_eq!(receipt_id(std::iter::empty(), 250), "250");
        assert_eq!(receipt_id([""].into_iter(), "250"), "250");
    }

    #[test]
    fn bad_recipient_is_rejected() {
        let mut s = settings("me@example.test");
        s.email_to = "not an address".into();
        assert!(SmtpSender::from_settings(&s).is_err());
    }
}
