//! The `/revoke` command

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

const REVOKE_PROMPT: &str = "Do you really want to revoke your registration?";
const NOT_REGISTERED: &str =
    "You are not registered in the database, cannot revoke registration";

const PROMPT: ConfirmationPrompt = ConfirmationPrompt {
    action: "revocation",
    text: REVOKE_PROMPT,
    accept_label: "Yes",
    accept: CallbackName::RevokeConfirmationYes,
    decline_label: "No",
    decline: CallbackName::RevokeConfirmationNo,
    event: UserEvent::Revoke,
};

/// Handler of `/revoke`
pub struct RevokeCommand;

#[async_trait]
impl CommandHandler for RevokeCommand {
    fn name(&self) -> &'static str {
        "revoke"
    }

    fn description(&self) -> &'static str {
        "Revoke your registration"
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
