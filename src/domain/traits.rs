//! # Domain Traits
//!
//! Abstract interfaces for the external collaborators: the chat platform
//! gateway, the streaming provider and the project board. The dispatch core
//! only ever talks to these traits; concrete implementations live in the
//! infrastructure layer.

use async_trait::async_trait;

use crate::domain::error::HeraldError;
use crate::domain::types::{LiveStream, MessageRef, ProviderUser, SubscriptionMode};

/// Abstract interface to the persistent chat server.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// The literal marker whose presence in a message body addresses the bot.
    fn bot_marker(&self) -> String;

    /// Post a message to a channel by display name.
    async fn send_message(&self, channel: &str, content: &str)
    -> Result<MessageRef, HeraldError>;

    /// Best-effort removal of a previously posted message.
    async fn delete_message(&self, message: &MessageRef) -> Result<(), HeraldError>;

    /// Attach a reaction to a message.
    async fn add_reaction(&self, message: &MessageRef, key: &str) -> Result<(), HeraldError>;

    /// Update the bot's presence/status text.
    async fn set_presence(&self, status: &str) -> Result<(), HeraldError>;
}

/// Abstract interface to the video-streaming provider's API.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<ProviderUser>, HeraldError>;

    async fn users_by_id(&self, ids: &[String]) -> Result<Vec<ProviderUser>, HeraldError>;

    async fn get_user(&self, id: &str) -> Result<ProviderUser, HeraldError>;

    /// Human-readable game/category title. Falls back to a canned title when
    /// the lookup fails, so callers never have to handle an error here.
    async fn game_title(&self, game_id: &str, user_id: &str) -> String;

    /// Streams currently live for the given logins.
    async fn current_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, HeraldError>;

    /// Request webhook notifications for the given users; returns the subset
    /// the provider accepted.
    async fn subscribe(
        &self,
        users: &[ProviderUser],
        mode: SubscriptionMode,
    ) -> Result<Vec<ProviderUser>, HeraldError>;

    /// All users this bot currently has webhook subscriptions for.
    async fn subscriptions(&self) -> Result<Vec<ProviderUser>, HeraldError>;
}

/// Abstract interface to the project board.
#[async_trait]
pub trait BoardClient: Send + Sync {
    async fn create_card(&self, title: &str) -> Result<(), HeraldError>;
}
