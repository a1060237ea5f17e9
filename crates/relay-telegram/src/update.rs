//! Serde types for incoming Telegram updates.
//!
//! Only the fields the gateway reads are declared. Everything is optional
//! or defaulted so that trimmed-down updates (and unknown update kinds)
//! still parse.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub query: String,
}

impl Message {
    pub fn chat_id(&self) -> Option<i64> {
        self.chat.as_ref().map(|c| c.id)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_message_update_parses() {
        let u: Update = serde_json::from_value(
            json!({"message": {"from": {"id": 7}, "chat": {"id": 7}, "text": "/help"}}),
        )
        .unwrap();
        let msg = u.message.unwrap();
        assert_eq!(msg.chat_id(), Some(7));
        assert_eq!(msg.text(), Some("/help"));
        assert_eq!(msg.from.unwrap().id, 7);
        assert!(u.callback_query.is_none());
    }

    #[test]
    fn unknown_update_kinds_parse_to_empty() {
        let u: Update =
            serde_json::from_value(json!({"update_id": 1, "edited_message": {"text": "x"}}))
                .unwrap();
        assert!(u.message.is_none() && u.callback_query.is_none() && u.inline_query.is_none());
    }

    #[test]
    fn inline_query_defaults_empty_text() {
        let u: Update = serde_json::from_value(json!({"inline_query": {"id": "q1"}})).unwrap();
        assert_eq!(u.inline_query.unwrap().query, "");
    }
}
