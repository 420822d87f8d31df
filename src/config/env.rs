// src/config/env.rs
//! Credentials and delivery settings read from the process environment.
//!
//! Required: `NEWS_API_KEY`, `SMTP_USER`, `SMTP_PASS`, `DIGEST_EMAIL_TO`.
//! Optional: `SMTP_HOST` (smtp.gmail.com), `SMTP_PORT` (587), `DIGEST_EMAIL_FROM` (= SMTP_USER).

use crate::error::RunError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

const REQUIRED: [&str; 4] = ["NEWS_API_KEY", "SMTP_USER", "SMTP_PASS", "DIGEST_EMAIL_TO"];

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

// Manual Debug so credentials never end up in logs.
impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    pub news_api_key: String,
    pub smtp: SmtpSettings,
    pub email_to: String,
    pub email_from: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("news_api_key", &"***")
            .field("smtp", &self.smtp)
            .field("email_to", &self.email_to)
            .field("email_from", &self.email_from)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, RunError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup. Every missing required key is reported at once;
    /// blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let missing: Vec<String> = REQUIRED
            .iter()
            .copied()
            .filter(|&k| get(k).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(RunError::ConfigurationMissing(missing));
        }

        let port = match get("SMTP_PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| {
                RunError::ConfigInvalid(anyhow::anyhow!("SMTP_PORT `{p}` is not a port: {e}"))
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let user = get("SMTP_USER").unwrap_or_default();
        Ok(Self {
            news_api_key: get("NEWS_API_KEY").unwrap_or_default(),
            smtp: SmtpSettings {
                host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port,
                user: user.clone(),
                pass: get("SMTP_PASS").unwrap_or_default(),
            },
            email_to: get("DIGEST_EMAIL_TO").unwrap_or_default(),
            email_from: get("DIGEST_EMAIL_FROM").unwrap_or(user),
        })
    }
}
