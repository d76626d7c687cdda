//! # Command Router
//!
//! Turns an inbound chat message into a command invocation. The routing
//! order mirrors how the bot presents itself to users: relay channels are
//! copied first, then mention-triggered commands run, then the extension's
//! fallback predicate gets a look, and finally the canned greeting covers
//! messages nobody claimed.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::application::context::BotContext;
use crate::domain::error::HeraldError;
use crate::domain::types::{ChatMessage, CommandReply, IGNORE};
use crate::strings;

pub struct Router {
    ctx: Arc<BotContext>,
}

impl Router {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Routes one inbound message end to end, including posting the reply.
    /// Relay-channel traffic is copied and goes no further; it is never
    /// treated as a command.
    pub async fn route(&self, msg: &ChatMessage) -> Result<(), HeraldError> {
        if self.relay(msg).await {
            return Ok(());
        }

        let marker = self.ctx.chat.bot_marker();
        if !msg.body.contains(&marker) {
            // Without a mention only the extension gets a look at the text.
            self.ctx.fallback_claims(msg).await;
            return Ok(());
        }

        let command_text = msg.body.replace(&marker, "");
        let command_text = command_text.trim_start();
        let in_command_channel = self
            .ctx
            .config
            .chat
            .command_channels
            .iter()
            .any(|channel| channel == &msg.channel_name);

        let reply = self.dispatch(msg, command_text, in_command_channel).await;
        self.deliver(msg, reply).await
    }

    /// Resolves and runs the named command, mapping handler failures to an
    /// apologetic reply. Help is shown for unresolved names, but only inside
    /// command channels; elsewhere an unknown name stays silent so casual
    /// chatter mentioning the bot gets the greeting instead.
    async fn dispatch(
        &self,
        msg: &ChatMessage,
        command_text: &str,
        in_command_channel: bool,
    ) -> CommandReply {
        let mut words = command_text.split_whitespace();
        let Some(first_word) = words.next() else {
            // A bare mention in a command channel is an unresolved command
            // too, so it gets the help listing.
            if in_command_channel {
                return CommandReply::text(strings::HELP);
            }
            return CommandReply::none();
        };
        let name = first_word.to_lowercase();
        let args: Vec<String> = words.map(str::to_string).collect();

        let Some(command) = self.ctx.commands.resolve(&name, in_command_channel) else {
            if in_command_channel {
                return CommandReply::text(strings::HELP);
            }
            return CommandReply::none();
        };

        // Everything after the command name, whitespace intact.
        let rest = command_text.replacen(first_word, "", 1);
        let rest = rest.trim_start();

        debug!("running command '{name}' from {}", msg.sender);
        match command.run(&self.ctx, msg, rest, &args).await {
            Ok(reply) => reply,
            Err(err) => {
                error!("command '{name}' failed: {err}");
                CommandReply::text(strings::COMMAND_FAILED)
            }
        }
    }

    async fn deliver(&self, msg: &ChatMessage, reply: CommandReply) -> Result<(), HeraldError> {
        if reply.is_empty() {
            if self.ctx.fallback_claims(msg).await {
                return Ok(());
            }
            let greeting = strings::greeting(&self.ctx.config.chat.greeting, &msg.sender_mention);
            self.ctx
                .chat
                .send_message(&msg.channel_name, &greeting)
                .await?;
            return Ok(());
        }

        if let Some(text) = &reply.text {
            if text != IGNORE {
                self.ctx.chat.send_message(&msg.channel_name, text).await?;
            }
        }
        if let Some(key) = &reply.reaction {
            self.ctx.chat.add_reaction(&msg.to_ref(), key).await?;
        }
        Ok(())
    }

    /// Copies relay-channel traffic verbatim. Returns true when the message
    /// arrived in the relay-in channel, whether or not the copy succeeded;
    /// a send failure is logged.
    async fn relay(&self, msg: &ChatMessage) -> bool {
        let chat_config = &self.ctx.config.chat;
        let (Some(channel_in), Some(channel_out)) =
            (&chat_config.relay_channel_in, &chat_config.relay_channel_out)
        else {
            return false;
        };
        if &msg.channel_name != channel_in {
            return false;
        }
        info!("relaying message from {channel_in} to {channel_out}");
        if let Err(err) = self.ctx.chat.send_message(channel_out, &msg.body).await {
            error!("relay to {channel_out} failed: {err}");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        command_message, plain_message, test_context, MockChat, MockProvider,
    };

    fn router_with(provider: MockProvider) -> (Router, Arc<MockChat>) {
        let chat = Arc::new(MockChat::default());
        let ctx = test_context(chat.clone(), Arc::new(provider));
        (Router::new(Arc::new(ctx)), chat)
    }

    #[tokio::test]
    async fn unknown_name_in_command_channel_shows_help() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = command_message("bot-ops", "frobnicate");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.starts_with("At your service"));
    }

    #[tokio::test]
    async fn unknown_name_outside_command_channel_greets() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = command_message("general", "frobnicate");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "What-ho, @alice:example.org!");
        assert!(!sent[0].1.contains("At your service"));
    }

    #[tokio::test]
    async fn restricted_command_only_runs_in_command_channel() {
        let (router, chat) = router_with(MockProvider::with_user("7", "streamer", "Streamer"));
        let msg = command_message("general", "add streamer");
        router.route(&msg).await.unwrap();
        // `add` resolves only in the restricted table, so the bot greets.
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "What-ho, @alice:example.org!");
    }

    #[tokio::test]
    async fn add_posts_request_and_records_pending() {
        let (router, chat) = router_with(MockProvider::with_user("7", "streamer", "Streamer"));
        let msg = command_message("bot-ops", "add streamer");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Streamer"));
        let state = router.context().state.lock().await;
        assert_eq!(state.pending_len(), 1);
    }

    #[tokio::test]
    async fn no_mention_stays_silent() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = plain_message("general", "just chatting about herald things");
        router.route(&msg).await.unwrap();
        assert!(chat.sent_bodies().is_empty());
    }

    #[tokio::test]
    async fn relay_channel_copies_verbatim() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = plain_message("lobby-in", "hello from the other side");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("lobby-out".to_string(), msg.body.clone()));
    }

    #[tokio::test]
    async fn ignore_sentinel_suppresses_reply_but_keeps_reaction() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = command_message("bot-ops", "idea teach the bot to dance");
        router.route(&msg).await.unwrap();
        // The idea command replies with a reaction only.
        assert!(chat.sent_bodies().is_empty());
        assert_eq!(chat.reactions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bare_mention_greets() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = command_message("general", "");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, "What-ho, @alice:example.org!");
    }

    #[tokio::test]
    async fn command_names_match_case_insensitively() {
        let (router, chat) = router_with(MockProvider::with_user("7", "streamer", "Streamer"));
        let msg = command_message("bot-ops", "ADD streamer");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Streamer"));
        assert!(!sent[0].1.starts_with("At your service"));
    }

    #[tokio::test]
    async fn bare_mention_in_command_channel_shows_help() {
        let (router, chat) = router_with(MockProvider::default());
        let msg = command_message("bot-ops", "");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.starts_with("At your service"));
    }

    #[tokio::test]
    async fn relay_channel_message_is_never_a_command() {
        let (router, chat) = router_with(MockProvider::default());
        // A mention in the relay-in channel is copied and nothing else; no
        // greeting or command reply lands back in the source channel.
        let msg = command_message("lobby-in", "hello there");
        router.route(&msg).await.unwrap();
        let sent = chat.sent_bodies();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], ("lobby-out".to_string(), msg.body.clone()));
    }
}
