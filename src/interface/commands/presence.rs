//! The status family: set the bot's presence text. `status` takes the text
//! verbatim; the activity variants prefix it with their verb.

use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::application::registry::Command;
use crate::domain::error::HeraldError;
use crate::domain::types::{ChatMessage, CommandReply, IGNORE};
use crate::strings;

pub struct SetPresence {
    prefix: Option<&'static str>,
    /// `listening to X` reads better than `listening X`; a leading `to` in
    /// the argument text is folded into the prefix instead of doubled.
    strips_to: bool,
}

impl SetPresence {
    pub fn bare() -> Self {
        Self {
            prefix: None,
            strips_to: false,
        }
    }

    pub fn playing() -> Self {
        Self {
            prefix: Some("Playing"),
            strips_to: false,
        }
    }

    pub fn streaming() -> Self {
        Self {
            prefix: Some("Streaming"),
            strips_to: false,
        }
    }

    pub fn listening() -> Self {
        Self {
            prefix: Some("Listening to"),
            strips_to: true,
        }
    }

    pub fn watching() -> Self {
        Self {
            prefix: Some("Watching"),
            strips_to: false,
        }
    }

    fn status_text(&self, rest: &str) -> String {
        let mut text = rest.trim();
        if self.strips_to {
            if let Some(stripped) = text.strip_prefix("to ") {
                text = stripped.trim_start();
            }
        }
        match self.prefix {
            Some(prefix) => format!("{prefix} {text}"),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl Command for SetPresence {
    async fn run(
        &self,
        ctx: &BotContext,
        _msg: &ChatMessage,
        rest: &str,
        _args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        if rest.trim().is_empty() {
            return Ok(CommandReply::text(strings::NOTHING_DOING));
        }
        ctx.chat.set_presence(&self.status_text(rest)).await?;
        Ok(CommandReply::text(IGNORE))
    }
}
