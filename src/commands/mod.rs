//! Command and callback handlers
//!
//! Commands are the named `/…` entry points; callbacks answer the inline
//! keyboard buttons those commands emit. Both produce a two-variant result
//! used for logging and testability only; the dispatcher never re-raises
//! them.
//!
//! Two handler shapes exist. User-scoped commands first look the sender up
//! in the persistent store and run a registered or a not-registered branch.
//! The chat-scoped `add` command operates on the chat instead and does not
//! require registration.

pub mod add;
pub mod callbacks;
pub mod help;
pub mod private;
pub mod revoke;
pub mod shuffle;
pub mod start;

pub use add::AddCommand;
pub use callbacks::ConfirmationCallback;
pub use help::HelpCommand;
pub use private::PrivateCommand;
pub use revoke::RevokeCommand;
pub use shuffle::ShuffleCommand;
pub use start::StartCommand;

use crate::context::StickfixContext;
use crate::database::StoreError;
use crate::domain::state::UserEvent;
use crate::domain::user::{StickfixUser, TransitionResult};
use crate::domain_types::ChatId;
use crate::error::StickfixError;
use crate::storage::UserRecord;
use crate::transport::{CallbackName, IncomingCommand, InlineKeyboardMarkup};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Outcome of a command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The command ran to completion
    Success {
        /// User the command ran for
        user: ChatId,
        /// Log message
        message: String,
    },
    /// The command was refused or a collaborator failed
    Failure {
        /// User the command ran for
        user: ChatId,
        /// Log message
        message: String,
    },
}

impl CommandResult {
    /// Checks whether the command succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The log message carried by either variant
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }
}

/// Outcome of a callback invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    /// The transition was applied and the confirmation sent
    Success {
        /// User the callback ran for
        user: ChatId,
        /// Log message
        message: String,
    },
    /// The user was unknown, the transition was denied, or the send failed
    Failure {
        /// User the callback ran for
        user: ChatId,
        /// Log message
        message: String,
    },
}

impl CallbackResult {
    /// Checks whether the callback succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A named `/…` command
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name as typed by users, without the leading slash
    fn name(&self) -> &'static str;

    /// One-line description shown by `/help`
    fn description(&self) -> &'static str;

    /// Runs the command for the sending user.
    ///
    /// # Errors
    ///
    /// Returns a [`StickfixError`] only for fatal conditions; operational
    /// failures are reported through [`CommandResult::Failure`].
    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
        command: &IncomingCommand,
    ) -> Result<CommandResult, StickfixError>;
}

/// A handler answering one inline-keyboard callback
#[async_trait]
pub trait CallbackHandler: Send + Sync {
    /// The callback this handler answers
    fn name(&self) -> CallbackName;

    /// Runs the callback for the pressing user.
    ///
    /// # Errors
    ///
    /// Returns a [`StickfixError`] only for fatal conditions; operational
    /// failures are reported through [`CallbackResult::Failure`].
    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
    ) -> Result<CallbackResult, StickfixError>;
}

/// Looks the user up in the persistent store.
///
/// A missing row or a recoverable store failure both land in the
/// not-registered branch; only state resolution is surfaced.
pub(crate) async fn load_registered(
    ctx: &StickfixContext,
    chat_id: ChatId,
) -> Result<Option<UserRecord>, StickfixError> {
    match ctx.users.get_user(chat_id).await {
        Ok(record) => Ok(Some(record)),
        Err(StoreError::StateResolution { name }) => {
            Err(StickfixError::StateResolution { name })
        }
        Err(error) => {
            debug!(user = %chat_id, %error, "lookup failed, treating user as unregistered");
            Ok(None)
        }
    }
}

/// The interactive prompt every registered-user command emits
pub(crate) struct ConfirmationPrompt {
    /// What the user is doing, for the log line
    pub action: &'static str,
    /// Prompt text
    pub text: &'static str,
    /// Label of the accepting button
    pub accept_label: &'static str,
    /// Callback of the accepting button
    pub accept: CallbackName,
    /// Label of the declining button
    pub decline_label: &'static str,
    /// Callback of the declining button
    pub decline: CallbackName,
    /// Event fired after the prompt is delivered
    pub event: UserEvent,
}

/// Sends a confirmation prompt and, on delivery, fires the prompt's event.
///
/// A failed send leaves the user state untouched.
pub(crate) async fn prompt_and_transition(
    ctx: &StickfixContext,
    user: &mut StickfixUser,
    prompt: &ConfirmationPrompt,
) -> CommandResult {
    info!(
        user = %user.chat_id,
        username = %user.username,
        "user {} is doing {}", user.chat_id, prompt.action
    );

    let keyboard = InlineKeyboardMarkup::choice(
        prompt.accept_label,
        prompt.accept,
        prompt.decline_label,
        prompt.decline,
    );
    if let Err(error) = ctx
        .transport
        .send_prompt(user.chat_id, prompt.text, keyboard)
        .await
    {
        warn!(user = %user.chat_id, %error, "prompt send failed");
        return CommandResult::Failure {
            user: user.chat_id,
            message: format!("could not deliver the {} prompt", prompt.action),
        };
    }

    match user.apply(prompt.event, &ctx.users, &ctx.ephemeral).await {
        TransitionResult::Success { .. } => CommandResult::Success {
            user: user.chat_id,
            message: format!("{} prompt delivered", prompt.action),
        },
        TransitionResult::Failure { current } => CommandResult::Failure {
            user: user.chat_id,
            message: format!("{} is not allowed from state {current}", prompt.action),
        },
    }
}
