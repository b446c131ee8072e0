use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result};

/// Webhook delivery settings. When absent the bot long-polls instead;
/// handler behavior is identical either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Public base URL Telegram pushes updates to (e.g. "https://bot.example.com").
    pub public_url: String,
    /// Local bind address for the listener.
    pub bind: String,
    /// Local port for the listener.
    pub port: u16,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            public_url: String::new(),
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl WebhookConfig {
    /// Full callback URL registered with Telegram.
    #[must_use]
    pub fn callback_url(&self) -> String {
        format!("{}/webhook", self.public_url.trim_end_matches('/'))
    }
}

/// Bot configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Chat id every accepted upload and produced artifact is mirrored to.
    /// Telegram keeps files alive as long as some chat references them, so
    /// mirroring makes session file ids durable. Optional.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_chat_id: Option<i64>,

    /// Webhook mode settings; long polling when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            archive_chat_id: None,
            webhook: None,
        }
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .field("archive_chat_id", &self.archive_chat_id)
            .field("webhook", &self.webhook)
            .finish()
    }
}

impl BotConfig {
    /// Load from process environment variables.
    ///
    /// `BOT_TOKEN` is required. `ARCHIVE_CHAT_ID` is optional but must be a
    /// chat id integer when present. `WEBHOOK_URL` switches the bot into
    /// webhook mode; `WEBHOOK_BIND`/`WEBHOOK_PORT` adjust the listener.
    /// Any violation is a startup error, reported before connecting.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Testable core of [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("BOT_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::message("BOT_TOKEN is not set"))?;

        let archive_chat_id = match lookup("ARCHIVE_CHAT_ID") {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                Error::message(format!(
                    "ARCHIVE_CHAT_ID must be a chat id integer (e.g. -1001234567890), got {raw:?}"
                ))
            })?),
            None => None,
        };

        let webhook = match lookup("WEBHOOK_URL") {
            Some(public_url) if !public_url.is_empty() => {
                if !public_url.starts_with("http") {
                    return Err(Error::message(format!(
                        "WEBHOOK_URL must be an http(s) URL, got {public_url:?}"
                    )));
                }
                let mut webhook = WebhookConfig {
                    public_url,
                    ..WebhookConfig::default()
                };
                if let Some(bind) = lookup("WEBHOOK_BIND") {
                    webhook.bind = bind;
                }
                if let Some(port) = lookup("WEBHOOK_PORT") {
                    webhook.port = port.parse().map_err(|_| {
                        Error::message(format!("WEBHOOK_PORT must be a port number, got {port:?}"))
                    })?;
                }
                Some(webhook)
            },
            _ => None,
        };

        Ok(Self {
            token: Secret::new(token),
            archive_chat_id,
            webhook,
        })
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
