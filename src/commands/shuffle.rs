//! The `/shuffle` ordering-mode command

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

const SHUFFLE_PROMPT: &str = "Do you want to enable or disable shuffle mode?";
const NOT_REGISTERED: &str =
    "You are not registered in the database, cannot set shuffle mode";

const PROMPT: ConfirmationPrompt = ConfirmationPrompt {
    action: "shuffle selection",
    text: SHUFFLE_PROMPT,
    accept_label: "Enable",
    accept: CallbackName::ShuffleEnabled,
    decline_label: "Disable",
    decline: CallbackName::ShuffleDisabled,
    event: UserEvent::Shuffle,
};

/// Handler of `/shuffle`
pub struct ShuffleCommand;

#[async_trait]
impl CommandHandler for ShuffleCommand {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn description(&self) -> &'static str {
        "Toggle shuffled ordering of your stickers"
    }

    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
        _command: &IncomingCommand,
    ) -> Result<CommandResult, StickfixError> {
        let Some(record) = load_registered(ctx, user.chat_id).await? else {
            if let Err(error) = ctx.transport.send_message(user.chat_id, NOT_REGISTERED).await {
                warn!(user = %user.chat_id, %error, "not-registered notice send failed");
            }
            return Ok(CommandResult::Failure {
                user: user.chat_id,
                message: "not registered".to_string(),
            });
        };

        let mut user = record.to_user();
        Ok(prompt_and_transition(ctx, &mut user, &PROMPT).await)
    }
}
