//! The `idea` command: file the message text as a card on the project board.

use async_trait::async_trait;
use tracing::error;

use crate::application::context::BotContext;
use crate::application::registry::Command;
use crate::domain::error::HeraldError;
use crate::domain::types::{ChatMessage, CommandReply};
use crate::strings;

const THUMBS_UP: &str = "\u{1F44D}";
const THUMBS_DOWN: &str = "\u{1F44E}";

pub struct Idea;

#[async_trait]
impl Command for Idea {
    async fn run(
        &self,
        ctx: &BotContext,
        _msg: &ChatMessage,
        rest: &str,
        _args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        let title = rest.trim();
        if title.is_empty() {
            return Ok(CommandReply::text(strings::NOTHING_DOING));
        }
        let Some(board) = &ctx.board else {
            return Ok(CommandReply::text(strings::BOARD_UNCONFIGURED));
        };

        // The outcome is signalled by reaction alone; a failure should not
        // spam the channel with an error reply.
        match board.create_card(title).await {
            Ok(()) => Ok(CommandReply::reaction(THUMBS_UP)),
            Err(err) => {
                error!("card creation failed: {err}");
                Ok(CommandReply::reaction(THUMBS_DOWN))
            }
        }
    }
}
