//! Streamer management commands: add, remove, announce, list and resub.

use async_trait::async_trait;
use tracing::info;

use crate::application::announce;
use crate::application::context::BotContext;
use crate::application::registry::Command;
use crate::domain::error::HeraldError;
use crate::domain::types::{ChatMessage, CommandReply, ProviderUser, SubscriptionMode};
use crate::strings;

fn display_names(users: &[ProviderUser]) -> String {
    users
        .iter()
        .map(|user| user.display_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `add` / `remove`: ask the provider to start or stop webhook notifications
/// for the named users. The request message is remembered so the eventual
/// hub confirmation can mark it with a reaction.
pub struct Subscribe {
    mode: SubscriptionMode,
}

impl Subscribe {
    pub fn adding() -> Self {
        Self {
            mode: SubscriptionMode::Subscribe,
        }
    }

    pub fn removing() -> Self {
        Self {
            mode: SubscriptionMode::Unsubscribe,
        }
    }
}

#[async_trait]
impl Command for Subscribe {
    async fn run(
        &self,
        ctx: &BotContext,
        msg: &ChatMessage,
        _rest: &str,
        args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        let users = ctx.provider.lookup_users(args).await?;
        if users.is_empty() {
            return Ok(CommandReply::text(strings::NO_USERS_FOUND));
        }

        let accepted = ctx.provider.subscribe(&users, self.mode).await?;
        if accepted.is_empty() {
            return Ok(CommandReply::text(strings::NOTHING_DOING));
        }

        // The eventual hub confirmation is keyed on the first accepted user;
        // confirmations for the others arrive and are dropped as unmatched.
        {
            let mut state = ctx.state.lock().await;
            state.record_pending(accepted[0].id.clone(), msg.to_ref());
        }
        info!(
            "{} request for {} users accepted",
            self.mode.as_hub_mode(),
            accepted.len()
        );

        let names = display_names(&accepted);
        Ok(match self.mode {
            SubscriptionMode::Subscribe => CommandReply::text(strings::subscribed(&names)),
            SubscriptionMode::Unsubscribe => CommandReply::text(strings::unsubscribed(&names)),
        })
    }
}

/// `announce`: immediately announce any currently live streams for the named
/// users, without touching subscriptions.
pub struct Announce;

#[async_trait]
impl Command for Announce {
    async fn run(
        &self,
        ctx: &BotContext,
        _msg: &ChatMessage,
        _rest: &str,
        args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        let streams = ctx.provider.current_streams(args).await?;
        if streams.is_empty() {
            return Ok(CommandReply::text(strings::NOTHING_DOING));
        }
        announce::announce_streams(ctx, &streams).await;

        let ids: Vec<String> = streams.iter().map(|s| s.user_id.clone()).collect();
        let users = ctx.provider.users_by_id(&ids).await?;
        Ok(CommandReply::text(strings::announced(&display_names(
            &users,
        ))))
    }
}

/// `list`: the users the provider currently notifies us about.
pub struct List;

#[async_trait]
impl Command for List {
    async fn run(
        &self,
        ctx: &BotContext,
        _msg: &ChatMessage,
        _rest: &str,
        _args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        let users = ctx.provider.subscriptions().await?;
        if users.is_empty() {
            return Ok(CommandReply::text(strings::LIST_EMPTY));
        }
        Ok(CommandReply::text(strings::subscription_list(
            &display_names(&users),
        )))
    }
}

/// `resub`: renew the webhook lease for every current subscription.
pub struct Resub;

#[async_trait]
impl Command for Resub {
    async fn run(
        &self,
        ctx: &BotContext,
        _msg: &ChatMessage,
        _rest: &str,
        _args: &[String],
    ) -> Result<CommandReply, HeraldError> {
        let users = ctx.provider.subscriptions().await?;
        if users.is_empty() {
            return Ok(CommandReply::text(strings::RESUB_LOST));
        }

        let accepted = ctx
            .provider
            .subscribe(&users, SubscriptionMode::Subscribe)
            .await?;
        if accepted.is_empty() {
            return Ok(CommandReply::text(strings::NOTHING_DOING));
        }
        Ok(CommandReply::text(strings::subscribed(&display_names(
            &accepted,
        ))))
    }
}
