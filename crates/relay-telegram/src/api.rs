//! Raw HTTP calls to the Telegram Bot API.
//!
//! Covers `sendMessage`, `sendChatAction`, `answerCallbackQuery` and
//! `answerInlineQuery`. Chat ids are sent as numbers when they parse as
//! one, otherwise as strings (`@channelname`).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::TelegramError;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// One `article` result for `answerInlineQuery`.
#[derive(Debug, Clone, Serialize)]
pub struct InlineArticle {
    #[serde(rename = "type")]
    pub result_type: &'static str,
    pub id: String,
    pub title: String,
    pub description: String,
    pub input_message_content: InputTextContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputTextContent {
    pub message_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
}

impl InlineArticle {
    /// The single "research this" result offered for an inline query.
    pub fn research(query: &str) -> Self {
        Self {
            result_type: "article",
            id: "research_1".to_string(),
            title: format!("Research: {query}"),
            description: "Get comprehensive research on this topic".to_string(),
            input_message_content: InputTextContent {
                message_text: format!("🔍 Researching: {query}"),
                parse_mode: Some("Markdown"),
            },
        }
    }
}

/// Low-level Telegram Bot API client.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl TelegramApi {
    /// `base_url` is the Bot API host, normally `https://api.telegram.org`.
    pub fn new(bot_token: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), bot_token),
            timeout,
        }
    }

    /// Send one text message. Returns the HTTP status on success.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<u16, TelegramError> {
        let mut body = json!({
            "chat_id": chat_id_value(chat_id),
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        debug!(chat_id, len = text.chars().count(), "sendMessage");
        self.call("sendMessage", &body).await
    }

    pub async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<u16, TelegramError> {
        let body = json!({
            "chat_id": chat_id_value(chat_id),
            "action": action,
        });
        self.call("sendChatAction", &body).await
    }

    /// Acknowledge a callback query (dismisses the loading spinner on the button).
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<u16, TelegramError> {
        let mut body = json!({ "callback_query_id": callback_query_id });
        if let Some(t) = text {
            body["text"] = json!(t);
        }
        self.call("answerCallbackQuery", &body).await
    }

    pub async fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: &[InlineArticle],
    ) -> Result<u16, TelegramError> {
        let body = json!({
            "inline_query_id": inline_query_id,
            "results": results,
        });
        self.call("answerInlineQuery", &body).await
    }

    async fn call(&self, method: &str, body: &Value) -> Result<u16, TelegramError> {
        let resp = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .timeout(self.timeout)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        let parsed: Option<ApiResponse> = serde_json::from_str(&text).ok();

        let ok = (200..300).contains(&status) && parsed.as_ref().is_none_or(|r| r.ok);
        if ok {
            return Ok(status);
        }

        let description = parsed
            .and_then(|r| r.description)
            .unwrap_or_else(|| text.chars().take(200).collect());
        warn!(method, status, %description, "telegram api call failed");
        Err(TelegramError::Api {
            status,
            description,
        })
    }
}

fn chat_id_value(chat_id: &str) -> Value {
    match chat_id.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(chat_id),
    }
}
