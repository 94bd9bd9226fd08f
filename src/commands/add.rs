//! The `/add` sticker-filing command
//!
//! Chat-scoped: registration is not required. The command must arrive as a
//! reply to a sticker message; the tokens after the command become the tags
//! the sticker is filed under. Stickers of unregistered senders are owned
//! by the default/public user.

use crate::commands::{CommandHandler, CommandResult, load_registered};
use crate::context::StickfixContext;
use crate::domain::user::StickfixUser;
use crate::domain_types::{ChatId, StickerTag};
use crate::error::StickfixError;
use crate::transport::IncomingCommand;
use async_trait::async_trait;
use tracing::{info, warn};

const REPLY_REQUIRED: &str = "Please reply to a sticker message to add it.";
const TAGS_REQUIRED: &str = "Please provide at least one tag of up to 50 characters.";
const STORE_FAILED: &str = "Could not add the sticker.";
const ADDED: &str = "Sticker added.";

/// Handler of `/add <tag>…`
pub struct AddCommand;

impl AddCommand {
    /// Tokenizes command arguments into valid tags; any oversized token
    /// invalidates the whole invocation.
    fn parse_tags(args: &[String]) -> Option<Vec<StickerTag>> {
        let tags: Vec<StickerTag> = args
            .iter()
            .filter_map(|token| StickerTag::try_new(token.clone()).ok())
            .collect();
        (!tags.is_empty() && tags.len() == args.len()).then_some(tags)
    }
}

#[async_trait]
impl CommandHandler for AddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn description(&self) -> &'static str {
        "Reply to a sticker to file it under the given tags"
    }

    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
        command: &IncomingCommand,
    ) -> Result<CommandResult, StickfixError> {
        let Some(sticker) = &command.replied_sticker else {
            if let Err(error) = ctx.transport.send_message(command.chat, REPLY_REQUIRED).await {
                warn!(chat = %command.chat, %error, "reply-required notice send failed");
            }
            return Ok(CommandResult::Failure {
                user: user.chat_id,
                message: "no replied-to sticker".to_string(),
            });
        };

        let Some(tags) = Self::parse_tags(&command.args) else {
            if let Err(error) = ctx.transport.send_message(command.chat, TAGS_REQUIRED).await {
                warn!(chat = %command.chat, %error, "tags-required notice send failed");
            }
            return Ok(CommandResult::Failure {
                user: user.chat_id,
                message: "no valid tags".to_string(),
            });
        };

        let owner = if load_registered(ctx, user.chat_id).await?.is_some() {
            user.chat_id
        } else {
            ChatId::default_user()
        };

        match ctx.stickers.add_sticker(owner, sticker, &tags).await {
            Ok(count) => {
                info!(chat = %command.chat, %owner, count, "sticker filed");
                if let Err(error) = ctx.transport.send_message(command.chat, ADDED).await {
                    warn!(chat = %command.chat, %error, "confirmation send failed");
                }
                Ok(CommandResult::Success {
                    user: user.chat_id,
                    message: format!("sticker filed under {count} tags"),
                })
            }
            Err(error) => {
                warn!(chat = %command.chat, %error, "sticker store rejected the add");
                if let Err(error) = ctx.transport.send_message(command.chat, STORE_FAILED).await {
                    warn!(chat = %command.chat, %error, "failure notice send failed");
                }
                Ok(CommandResult::Failure {
                    user: user.chat_id,
                    message: error.to_string(),
                })
            }
        }
    }
}
