//! The `/help` command

use crate::commands::{CommandHandler, CommandResult};
use crate::context::StickfixContext;
use crate::domain::user::StickfixUser;
use crate::error::StickfixError;
use crate::transport::IncomingCommand;
use async_trait::async_trait;
use tracing::warn;

const HELP_TEXT: &str = "StickFix commands:\n\
    /start - register with StickFix\n\
    /revoke - revoke your registration\n\
    /private - toggle private visibility of your stickers\n\
    /shuffle - toggle shuffled ordering of your stickers\n\
    /add <tag>... - reply to a sticker to file it under tags\n\
    /help - show this message";

/// Handler of `/help`
pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Show the available commands"
    }

    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
        command: &IncomingCommand,
    ) -> Result<CommandResult, StickfixError> {
        if let Err(error) = ctx.transport.send_message(command.chat, HELP_TEXT).await {
            warn!(chat = %command.chat, %error, "help send failed");
            return Ok(CommandResult::Failure {
                user: user.chat_id,
                message: "could not deliver the help text".to_string(),
            });
        }
        Ok(CommandResult::Success {
            user: user.chat_id,
            message: "help delivered".to_string(),
        })
    }
}
