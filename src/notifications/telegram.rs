use crate::config::Config;
use crate::models::{SwapContext, SwapRecord};
use crate::notifications::template::render_swap_message;
use crate::notifications::NotifyError;
use crate::traits::NotificationDispatcher;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            token,
            chat_id,
        }
    }

    /// `None` unless both the bot token and the chat id are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.telegram_token, &config.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some(Self::new(token.clone(), chat_id.clone())),
            _ => None,
        }
    }

    pub async fn send_message(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Telegram notification sent successfully");
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for TelegramNotifier {
    async fn dispatch(
        &self,
        address: &str,
        swap: &SwapRecord,
        context: &SwapContext,
    ) -> Result<(), NotifyError> {
        let message = render_swap_message(address, swap, context);
        self.send_message(&message).await
    }
}
