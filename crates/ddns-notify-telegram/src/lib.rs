// # Telegram Notifier
//
// Implements `Notifier` via the Telegram bot API `sendMessage` method.
//
// Fire-and-forget: the response body is ignored and every failure is logged
// at warn level, never returned. Nothing is sent unless both the bot token and
// the chat id are set.

use async_trait::async_trait;
use ddns_core::config::NotificationSettings;
use ddns_core::traits::Notifier;
use ddns_core::{Error, Result};
use std::time::Duration;

/// Telegram bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default HTTP timeout for notification requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Telegram notifier
#[derive(Debug)]
pub struct TelegramNotifier {
    api_base: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a notifier for the public bot API
    pub fn new() -> Result<Self> {
        Self::with_api_base(TELEGRAM_API_BASE)
    }

    /// Create a notifier for a custom API base (no trailing slash)
    pub fn with_api_base(api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into(),
            client,
        })
    }

    /// Build the `sendMessage` request without sending it
    pub fn build_request(
        &self,
        settings: &NotificationSettings,
        message: &str,
    ) -> reqwest::Result<reqwest::Request> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base, settings.telegram_bot_token
        );
        self.client
            .get(url)
            .query(&[
                ("chat_id", settings.telegram_chat_id.as_str()),
                ("text", message),
            ])
            .build()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, settings: &NotificationSettings, message: &str) {
        if !settings.is_enabled() {
            return;
        }

        let request = match self.build_request(settings, message) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Failed to build Telegram request: {}", e.without_url());
                return;
            }
        };

        // The bot token is part of the path, so the URL stays out of the log.
        match self.client.execute(request).await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!("Telegram notification rejected: {}", response.status());
            }
            Ok(_) => tracing::debug!("Telegram notification sent"),
            Err(e) => tracing::warn!("Failed to send Telegram notification: {}", e.without_url()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::{Path, RawQuery};
    use axum::routing::get;
    use std::sync::{Arc, Mutex};

    fn settings(token: &str, chat: &str) -> NotificationSettings {
        NotificationSettings {
            telegram_bot_token: token.to_string(),
            telegram_chat_id: chat.to_string(),
        }
    }

    #[test]
    fn request_puts_token_in_path_and_escapes_text() {
        let notifier = TelegramNotifier::new().unwrap();
        let request = notifier
            .build_request(&settings("123:abc", "-1001"), "Updated a.dns.navy: IPv4=, IPv6=2001:db8::1")
            .unwrap();

        assert_eq!(request.url().path(), "/bot123:abc/sendMessage");
        assert_eq!(
            request.url().query(),
            Some("chat_id=-1001&text=Updated+a.dns.navy%3A+IPv4%3D%2C+IPv6%3D2001%3Adb8%3A%3A1")
        );
    }

    #[tokio::test]
    async fn sends_to_loopback_server() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let app = Router::new().route(
            "/:bot/sendMessage",
            get(move |Path(bot): Path<String>, RawQuery(query): RawQuery| {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder
                        .lock()
                        .unwrap()
                        .push((bot, query.unwrap_or_default()));
                    "{\"ok\":true}"
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let notifier = TelegramNotifier::with_api_base(format!("http://{}", addr)).unwrap();
        notifier.notify(&settings("42:xyz", "7"), "hello world").await;
        notifier.notify(&settings("", "7"), "disabled").await;
        notifier.notify(&settings("42:xyz", ""), "disabled").await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![("bot42:xyz".to_string(), "chat_id=7&text=hello+world".to_string())]
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_swallowed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = TelegramNotifier::with_api_base(format!("http://{}", addr)).unwrap();
        notifier.notify(&settings("42:xyz", "7"), "lost").await;
    }
}
