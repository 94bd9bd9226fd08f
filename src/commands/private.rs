//! The `/private` visibility-mode command

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

const PRIVATE_PROMPT: &str = "Do you want to enable or disable private mode?";
const NOT_REGISTERED: &str =
    "You are not registered in the database, cannot set private mode";

const PROMPT: ConfirmationPrompt = ConfirmationPrompt {
    action: "private-mode selection",
    text: PRIVATE_PROMPT,
    accept_label: "Enable",
    accept: CallbackName::PrivateModeEnabled,
    decline_label: "Disable",
    decline: CallbackName::PrivateModeDisabled,
    event: UserEvent::PrivateMode,
};

/// Handler of `/private`
pub struct PrivateCommand;

#[async_trait]
impl CommandHandler for PrivateCommand {
    fn name(&self) -> &'static str {
        "private"
    }

    fn description(&self) -> &'static str {
        "Toggle private visibility of your stickers"
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
