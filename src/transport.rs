//! Chat-platform port consumed by the core
//!
//! The only transport vocabulary the core sees: an outbound send trait with
//! optional inline keyboards, and the inbound message/callback-query values
//! the dispatcher adapts into domain types. Concrete wire knowledge lives in
//! the adapter module.

use crate::domain_types::{ChatId, StickerFileId};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Stable identifiers of the inline-keyboard callbacks
///
/// The wire strings are part of the external contract; the platform echoes
/// them back verbatim when a button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackName {
    /// Consent to registration
    StartConfirmationYes,
    /// Decline registration
    StartConfirmationNo,
    /// Confirm revocation
    RevokeConfirmationYes,
    /// Abort revocation
    RevokeConfirmationNo,
    /// Switch private mode on
    PrivateModeEnabled,
    /// Switch private mode off
    PrivateModeDisabled,
    /// Switch shuffle on
    ShuffleEnabled,
    /// Switch shuffle off
    ShuffleDisabled,
}

impl CallbackName {
    /// All callback names, in declaration order
    pub const ALL: [Self; 8] = [
        Self::StartConfirmationYes,
        Self::StartConfirmationNo,
        Self::RevokeConfirmationYes,
        Self::RevokeConfirmationNo,
        Self::PrivateModeEnabled,
        Self::PrivateModeDisabled,
        Self::ShuffleEnabled,
        Self::ShuffleDisabled,
    ];

    /// The exact string carried on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartConfirmationYes => "StartConfirmationYes",
            Self::StartConfirmationNo => "StartConfirmationNo",
            Self::RevokeConfirmationYes => "RevokeConfirmationYes",
            Self::RevokeConfirmationNo => "RevokeConfirmationNo",
            Self::PrivateModeEnabled => "PrivateModeEnabledCallback",
            Self::PrivateModeDisabled => "PrivateModeDisabledCallback",
            Self::ShuffleEnabled => "ShuffleEnabledCallback",
            Self::ShuffleDisabled => "ShuffleDisabledCallback",
        }
    }

    /// Parses a wire string; matching is exact and case-sensitive
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for CallbackName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled button of an inline keyboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineKeyboardButton {
    /// Text shown on the button
    pub label: String,
    /// Callback echoed back when the button is pressed
    pub callback: CallbackName,
}

impl InlineKeyboardButton {
    /// Creates a button
    #[must_use]
    pub fn new(label: impl Into<String>, callback: CallbackName) -> Self {
        Self {
            label: label.into(),
            callback,
        }
    }
}

/// Ordered rows of inline-keyboard buttons sent with a prompt
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineKeyboardMarkup {
    rows: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// Creates an empty keyboard
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: append a row of buttons
    #[must_use]
    pub fn row(mut self, buttons: Vec<InlineKeyboardButton>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// The two-button confirmation row every prompt in the bot uses
    #[must_use]
    pub fn choice(
        accept_label: &str,
        accept: CallbackName,
        decline_label: &str,
        decline: CallbackName,
    ) -> Self {
        Self::new().row(vec![
            InlineKeyboardButton::new(accept_label, accept),
            InlineKeyboardButton::new(decline_label, decline),
        ])
    }

    /// The keyboard's rows, in send order
    #[must_use]
    pub fn rows(&self) -> &[Vec<InlineKeyboardButton>] {
        &self.rows
    }
}

/// Raised when the transport rejects or cannot deliver an outbound message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The platform answered with an error
    #[error("transport rejected message: {message}")]
    Rejected {
        /// Error description from the platform
        message: String,
    },
    /// The platform could not be reached
    #[error("transport unreachable: {message}")]
    Connection {
        /// Error description from the HTTP layer
        message: String,
    },
}

/// Outbound side of the chat-platform port
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a plain text message to a chat.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] when the platform rejects the message or is
    /// unreachable.
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), SendError>;

    /// Sends a prompt with an inline keyboard to a chat.
    ///
    /// # Errors
    ///
    /// Returns a [`SendError`] when the platform rejects the message or is
    /// unreachable.
    async fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), SendError>;
}

/// Identity of the account that produced an inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Platform-assigned id
    pub id: ChatId,
    /// Username, when the account has one
    pub username: Option<String>,
}

/// An inbound `/command` message, adapted from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    /// Command name without the leading slash
    pub name: String,
    /// Sending account, when the platform reported one
    pub sender: Option<Sender>,
    /// Chat the command arrived in
    pub chat: ChatId,
    /// Whitespace-separated tokens after the command
    pub args: Vec<String>,
    /// Sticker handle of the replied-to message, when present
    pub replied_sticker: Option<StickerFileId>,
}

/// An inbound callback-query (button press), adapted from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallback {
    /// The callback-name string echoed by the platform
    pub name: String,
    /// Pressing account, when the platform reported one
    pub sender: Option<Sender>,
}

/// One inbound transport event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A `/command` message
    Command(IncomingCommand),
    /// An inline-keyboard button press
    Callback(IncomingCallback),
}

/// An outbound message captured by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination chat
    pub chat: ChatId,
    /// Message text
    pub text: String,
    /// Inline keyboard, for prompts
    pub keyboard: Option<InlineKeyboardMarkup>,
}

/// Transport test double that records outbound traffic
///
/// Provides predictable behavior for tests: sends succeed and are recorded
/// in order, or fail uniformly after [`RecordingTransport::fail_sends`].
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing: AtomicBool,
}

impl RecordingTransport {
    /// Creates a recording transport whose sends succeed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail (or succeed again)
    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All messages sent so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the record lock is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("record lock poisoned").clone()
    }

    /// The most recent message, if any
    #[must_use]
    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent().pop()
    }

    fn record(&self, message: OutboundMessage) -> Result<(), SendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SendError::Rejected {
                message: "recording transport set to fail".to_string(),
            });
        }
        self.sent.lock().expect("record lock poisoned").push(message);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(&self, chat: ChatId, text: &str) -> Result<(), SendError> {
        self.record(OutboundMessage {
            chat,
            text: text.to_string(),
            keyboard: None,
        })
    }

    async fn send_prompt(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), SendError> {
        self.record(OutboundMessage {
            chat,
            text: text.to_string(),
            keyboard: Some(keyboard),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_emit_exact_wire_strings_when_serializing_callback_names() {
        let expected = [
            "StartConfirmationYes",
            "StartConfirmationNo",
            "RevokeConfirmationYes",
            "RevokeConfirmationNo",
            "PrivateModeEnabledCallback",
            "PrivateModeDisabledCallback",
            "ShuffleEnabledCallback",
            "ShuffleDisabledCallback",
        ];
        for (callback, wire) in CallbackName::ALL.into_iter().zip(expected) {
            assert_eq!(callback.as_str(), wire);
            assert_eq!(CallbackName::parse(wire), Some(callback));
        }
    }

    #[test]
    fn test_should_reject_case_variants_when_parsing_callback_names() {
        assert_eq!(CallbackName::parse("startconfirmationyes"), None);
        assert_eq!(CallbackName::parse("Unknown"), None);
    }

    #[test]
    fn test_should_keep_button_order_when_building_choice_row() {
        let keyboard = InlineKeyboardMarkup::choice(
            "Yes",
            CallbackName::StartConfirmationYes,
            "No",
            CallbackName::StartConfirmationNo,
        );
        let rows = keyboard.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].label, "Yes");
        assert_eq!(rows[0][0].callback, CallbackName::StartConfirmationYes);
        assert_eq!(rows[0][1].label, "No");
        assert_eq!(rows[0][1].callback, CallbackName::StartConfirmationNo);
    }
}
