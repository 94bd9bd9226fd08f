//! The `/start` registration command
//!
//! Inverts the usual polarity of user-scoped commands: the not-registered
//! branch is the happy path. A fresh user is parked in the ephemeral store
//! and asked for consent; the registered branch only greets.

use crate::commands::{
    CommandHandler, CommandResult, ConfirmationPrompt, load_registered, prompt_and_transition,
};
use crate::context::StickfixContext;
use crate::domain::state::UserEvent;
use crate::domain::user::StickfixUser;
use crate::error::StickfixError;
use crate::transport::{CallbackName, IncomingCommand};
use async_trait::async_trait;
use tracing::warn;

const WELCOME_PROMPT: &str =
    "Welcome to StickFix! Do you want to register? Your chat id and username will be stored.";
const WELCOME_BACK: &str = "Welcome back to StickFix!";

const PROMPT: ConfirmationPrompt = ConfirmationPrompt {
    action: "registration",
    text: WELCOME_PROMPT,
    accept_label: "Yes",
    accept: CallbackName::StartConfirmationYes,
    decline_label: "No",
    decline: CallbackName::StartConfirmationNo,
    event: UserEvent::Start,
};

/// Handler of `/start`
pub struct StartCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    fn name(&self) -> &'static str {
        "start"
    }

    fn description(&self) -> &'static str {
        "Register with StickFix"
    }

    async fn execute(
        &self,
        ctx: &StickfixContext,
        mut user: StickfixUser,
        _command: &IncomingCommand,
    ) -> Result<CommandResult, StickfixError> {
        if load_registered(ctx, user.chat_id).await?.is_some() {
            if let Err(error) = ctx.transport.send_message(user.chat_id, WELCOME_BACK).await {
                warn!(user = %user.chat_id, %error, "welcome-back send failed");
                return Ok(CommandResult::Failure {
                    user: user.chat_id,
                    message: "could not deliver the welcome-back message".to_string(),
                });
            }
            return Ok(CommandResult::Success {
                user: user.chat_id,
                message: "already registered, greeted".to_string(),
            });
        }

        Ok(prompt_and_transition(ctx, &mut user, &PROMPT).await)
    }
}
