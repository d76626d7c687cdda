//! # Core Types
//!
//! Wire-level and in-memory types shared by the webhook receiver, the relay
//! and the bot's dispatch core.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Query parameter carrying the target chat-server id in webhook callbacks.
pub const PARAM_SERVER: &str = "herald.server";
/// Query parameter carrying the external streamer/user id in webhook callbacks.
pub const PARAM_USER_ID: &str = "herald.user_id";

/// Reserved sentinel: a command returning this text suppresses the reply
/// while still allowing its reaction to be applied.
pub const IGNORE: &str = "IGNORE";

/// Reaction applied to the originating message when a subscribe/unsubscribe
/// request is confirmed by the provider.
pub const CONFIRM_REACTION: &str = "\u{1F5A4}";

/// A notification handed from the webhook receiver to the bot process.
///
/// Serialized as a JSON object with a mandatory `action` tag plus
/// action-specific fields; this is the payload format on the OS queue.
/// Each event is produced by the receiver and consumed exactly once by the
/// event dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum NotificationEvent {
    /// A stream-live delivery. `data` is the raw provider payload.
    Stream {
        #[serde(default)]
        args: HashMap<String, String>,
        data: Vec<serde_json::Value>,
        id: String,
    },
    /// Provider acknowledged a subscription request.
    Subscribe {
        #[serde(default)]
        args: HashMap<String, String>,
    },
    /// Provider acknowledged an unsubscription request.
    Unsubscribe {
        #[serde(default)]
        args: HashMap<String, String>,
    },
}

impl NotificationEvent {
    /// The external user id a confirmation refers to, if the callback query
    /// carried one.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            NotificationEvent::Stream { args, .. }
            | NotificationEvent::Subscribe { args }
            | NotificationEvent::Unsubscribe { args } => {
                args.get(PARAM_USER_ID).map(String::as_str)
            }
        }
    }
}

/// Reference to a posted chat message, sufficient to delete it or react to it
/// later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub room_id: String,
    pub event_id: String,
}

/// An inbound chat message as seen by the command router.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub room_id: String,
    pub event_id: String,
    /// Display name of the channel the message arrived in.
    pub channel_name: String,
    pub sender: String,
    /// Mention text for addressing the author in a reply.
    pub sender_mention: String,
    pub body: String,
}

impl ChatMessage {
    pub fn to_ref(&self) -> MessageRef {
        MessageRef {
            room_id: self.room_id.clone(),
            event_id: self.event_id.clone(),
        }
    }
}

/// A user record from the streaming provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// One entry of a stream-live payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveStream {
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub game_id: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Provider stream type; anything other than `live` (or empty) is a VOD
    /// rerun and is skipped by the announcer.
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// Whether a provider request asks to start or stop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionMode {
    Subscribe,
    Unsubscribe,
}

impl SubscriptionMode {
    pub fn as_hub_mode(self) -> &'static str {
        match self {
            SubscriptionMode::Subscribe => "subscribe",
            SubscriptionMode::Unsubscribe => "unsubscribe",
        }
    }
}

/// What a command handler produced: an optional reply and an optional
/// reaction to the triggering message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandReply {
    pub text: Option<String>,
    pub reaction: Option<String>,
}

impl CommandReply {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            reaction: None,
        }
    }

    pub fn reaction(key: impl Into<String>) -> Self {
        Self {
            text: None,
            reaction: Some(key.into()),
        }
    }

    /// True when the handler produced neither output, which makes the router
    /// fall through to the fallback predicate and the canned greeting.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.reaction.is_none()
    }
}
