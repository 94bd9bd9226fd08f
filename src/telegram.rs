//! Telegram Bot API adapter
//!
//! The only module that knows the platform's wire vocabulary. Outbound, it
//! implements the [`ChatTransport`] port over `sendMessage`; inbound, it
//! drives `getUpdates` long polling and adapts raw updates into
//! [`TransportEvent`]s. Poll and parse failures are logged and skipped; the
//! loop runs until the event channel closes.

use crate::domain_types::{ApiKey, ChatId, StickerFileId};
use crate::transport::{
    ChatTransport, IncomingCallback, IncomingCommand, InlineKeyboardMarkup, SendError, Sender,
    TransportEvent,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for one bot account
pub struct TelegramTransport {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramTransport {
    /// Creates a transport against the public Bot API endpoint
    #[must_use]
    pub fn new(api_key: &ApiKey) -> Self {
        Self::with_base_url("https://api.telegram.org", api_key)
    }

    /// Creates a transport against a custom endpoint (tests, gateways)
    #[must_use]
    pub fn with_base_url(base_url: &str, api_key: &ApiKey) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), api_key.reveal()),
        }
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value, SendError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::Connection {
                message: e.to_string(),
            })?;

        let mut body: Value = response.json().await.map_err(|e| SendError::Connection {
            message: e.to_string(),
        })?;

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
        } else {
            Err(SendError::Rejected {
                message: body
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown platform error")
                    .to_string(),
            })
        }
    }

    fn keyboard_payload(keyboard: &InlineKeyboardMarkup) -> Value {
        let rows: Vec<Value> = keyboard
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|button| {
                        json!({
                            "text": button.label,
                            "callback_data": button.callback.as_str(),
                        })
                    })
                    .collect()
            })
            .collect();
        json!({ "inline_keyboard": rows })
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), SendError> {
        self.call(
            "sendMessage",
            json!({ "chat_id": chat.as_i64(), "text": text }),
        )
        .await
        .map(|_| ())
    }

    async fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), SendError> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat.as_i64(),
                "text": text,
                "reply_markup": Self::keyboard_payload(&keyboard),
            }),
        )
        .await
        .map(|_| ())
    }
}

/// Drives `getUpdates` long polling until the event channel closes
pub async fn run_long_poll(
    transport: Arc<TelegramTransport>,
    events: mpsc::Sender<TransportEvent>,
    poll_timeout_secs: u64,
) {
    let mut offset: i64 = 0;
    loop {
        let payload = json!({ "timeout": poll_timeout_secs, "offset": offset });
        match transport.call("getUpdates", payload).await {
            Ok(result) => {
                for update in result.as_array().cloned().unwrap_or_default() {
                    if let Some(id) = update.get("update_id").and_then(Value::as_i64) {
                        offset = offset.max(id + 1);
                    }
                    let Some(event) = adapt_update(&update) else {
                        continue;
                    };
                    if events.send(event).await.is_err() {
                        info!("event channel closed, stopping long poll");
                        return;
                    }
                }
            }
            Err(error) => {
                warn!(%error, "getUpdates failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}

/// Adapts one raw update into a transport event, if it carries one
fn adapt_update(update: &Value) -> Option<TransportEvent> {
    if let Some(message) = update.get("message") {
        return adapt_message(message);
    }
    if let Some(query) = update.get("callback_query") {
        return adapt_callback(query);
    }
    None
}

fn adapt_sender(from: &Value) -> Option<Sender> {
    let id = from.get("id")?.as_i64()?;
    Some(Sender {
        id: ChatId::new(id),
        username: from
            .get("username")
            .and_then(Value::as_str)
            .map(String::from),
    })
}

fn adapt_message(message: &Value) -> Option<TransportEvent> {
    let text = message.get("text")?.as_str()?;
    let rest = text.strip_prefix('/')?;
    let mut tokens = rest.split_whitespace();
    // Group chats append the bot name: `/add@StickFixBot`.
    let name = tokens.next()?.split('@').next()?.to_string();
    let args: Vec<String> = tokens.map(String::from).collect();

    let chat = ChatId::new(message.get("chat")?.get("id")?.as_i64()?);
    let sender = message.get("from").and_then(adapt_sender);
    let replied_sticker = message
        .get("reply_to_message")
        .and_then(|reply| reply.get("sticker"))
        .and_then(|sticker| sticker.get("file_id"))
        .and_then(Value::as_str)
        .and_then(|id| StickerFileId::try_new(id.to_string()).ok());

    Some(TransportEvent::Command(IncomingCommand {
        name,
        sender,
        chat,
        args,
        replied_sticker,
    }))
}

fn adapt_callback(query: &Value) -> Option<TransportEvent> {
    let name = query.get("data")?.as_str()?.to_string();
    let sender = query.get("from").and_then(adapt_sender);
    Some(TransportEvent::Callback(IncomingCallback { name, sender }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_adapt_command_message_when_update_carries_text() {
        let update = json!({
            "update_id": 7,
            "message": {
                "text": "/add cat meme",
                "chat": { "id": 42 },
                "from": { "id": 42, "username": "alice" },
                "reply_to_message": { "sticker": { "file_id": "CAACAg" } },
            }
        });

        let Some(TransportEvent::Command(command)) = adapt_update(&update) else {
            panic!("expected a command event");
        };
        assert_eq!(command.name, "add");
        assert_eq!(command.args, vec!["cat", "meme"]);
        assert_eq!(command.chat, ChatId::new(42));
        assert_eq!(command.sender.unwrap().username.as_deref(), Some("alice"));
        assert_eq!(
            command.replied_sticker.unwrap().into_inner(),
            "CAACAg"
        );
    }

    #[test]
    fn test_should_strip_bot_suffix_when_command_is_addressed() {
        let update = json!({
            "message": {
                "text": "/start@StickFixBot",
                "chat": { "id": 1 },
                "from": { "id": 1 },
            }
        });

        let Some(TransportEvent::Command(command)) = adapt_update(&update) else {
            panic!("expected a command event");
        };
        assert_eq!(command.name, "start");
        assert!(command.sender.unwrap().username.is_none());
    }

    #[test]
    fn test_should_adapt_callback_query_when_update_carries_data() {
        let update = json!({
            "callback_query": {
                "data": "StartConfirmationYes",
                "from": { "id": 42, "username": "alice" },
            }
        });

        let Some(TransportEvent::Callback(callback)) = adapt_update(&update) else {
            panic!("expected a callback event");
        };
        assert_eq!(callback.name, "StartConfirmationYes");
        assert_eq!(callback.sender.unwrap().id, ChatId::new(42));
    }

    #[test]
    fn test_should_drop_update_when_not_a_command_or_callback() {
        assert!(adapt_update(&json!({ "message": { "text": "hello" } })).is_none());
        assert!(adapt_update(&json!({ "edited_message": {} })).is_none());
    }

    #[test]
    fn test_should_serialize_keyboard_when_building_reply_markup() {
        use crate::transport::CallbackName;
        let keyboard = InlineKeyboardMarkup::choice(
            "Yes",
            CallbackName::RevokeConfirmationYes,
            "No",
            CallbackName::RevokeConfirmationNo,
        );
        let payload = TelegramTransport::keyboard_payload(&keyboard);
        assert_eq!(
            payload["inline_keyboard"][0][0]["callback_data"],
            "RevokeConfirmationYes"
        );
        assert_eq!(payload["inline_keyboard"][0][1]["text"], "No");
    }
}
