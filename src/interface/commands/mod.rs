//! # Built-in Commands
//!
//! Stock command tables. Everything here lands in the restricted table; the
//! open table starts empty and is populated by extensions only.

use std::sync::Arc;

use crate::application::registry::CommandSet;
use crate::domain::error::HeraldError;
use crate::domain::types::CommandReply;
use crate::strings;

pub mod board;
pub mod presence;
pub mod streams;

struct Help;

#[async_trait::async_trait]
impl crate::application::registry::Command for Help {
    async fn run(
        &self,
        _ctx: &crate::application::context::BotContext,
        _msg: &crate::domain::types::ChatMessage,
        _rest: &str,
        _args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        Ok(CommandReply::text(strings::HELP))
    }
}

/// Builds the stock command tables.
pub fn builtin() -> CommandSet {
    let mut set = CommandSet::new();
    set.register_restricted("help", Arc::new(Help));
    set.register_restricted("add", Arc::new(streams::Subscribe::adding()));
    set.register_restricted("remove", Arc::new(streams::Subscribe::removing()));
    set.register_restricted("announce", Arc::new(streams::Announce));
    set.register_restricted("list", Arc::new(streams::List));
    set.register_restricted("resub", Arc::new(streams::Resub));
    set.register_restricted("idea", Arc::new(board::Idea));
    set.register_restricted("status", Arc::new(presence::SetPresence::bare()));
    set.register_restricted("playing", Arc::new(presence::SetPresence::playing()));
    set.register_restricted("streaming", Arc::new(presence::SetPresence::streaming()));
    set.register_restricted("listening", Arc::new(presence::SetPresence::listening()));
    set.register_restricted("watching", Arc::new(presence::SetPresence::watching()));
    set
}
