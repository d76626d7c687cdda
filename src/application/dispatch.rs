//! # Event Dispatcher
//!
//! Consumes the raw payloads the relay thread pushes onto the in-process
//! channel and turns them into bot actions: stream announcements, or the
//! confirmation reaction for a completed subscribe/unsubscribe request.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::application::announce;
use crate::application::context::BotContext;
use crate::domain::error::HeraldError;
use crate::domain::types::{NotificationEvent, CONFIRM_REACTION};

/// Drains the relay channel until the sending side disappears.
pub async fn run(ctx: Arc<BotContext>, mut rx: UnboundedReceiver<String>) {
    info!("event dispatcher running");
    while let Some(raw) = rx.recv().await {
        if let Err(err) = handle_raw(&ctx, &raw).await {
            error!("notification handling failed: {err}");
        }
    }
    info!("event dispatcher stopped, relay channel closed");
}

async fn handle_raw(ctx: &BotContext, raw: &str) -> Result<(), HeraldError> {
    let event: NotificationEvent = serde_json::from_str(raw)
        .map_err(|err| HeraldError::Decode(format!("bad notification payload: {err}")))?;
    handle_event(ctx, event).await
}

pub async fn handle_event(ctx: &BotContext, event: NotificationEvent) -> Result<(), HeraldError> {
    match event {
        NotificationEvent::Stream { data, id, .. } => {
            info!("stream notification {id} with {} entries", data.len());
            announce::handle_stream_data(ctx, &data).await
        }
        NotificationEvent::Subscribe { .. } | NotificationEvent::Unsubscribe { .. } => {
            confirm_request(ctx, event.user_id()).await
        }
    }
}

/// Marks the originating request message with the confirmation reaction and
/// retires the pending entry. A confirmation with no matching pending entry
/// is dropped; duplicate hub acknowledgments arrive in practice.
async fn confirm_request(ctx: &BotContext, user_id: Option<&str>) -> Result<(), HeraldError> {
    let Some(user_id) = user_id else {
        warn!("confirmation without a user id, ignoring");
        return Ok(());
    };
    let message = {
        let mut state = ctx.state.lock().await;
        state.take_pending(user_id)
    };
    match message {
        Some(message) => {
            info!("request for user {user_id} confirmed");
            ctx.chat.add_reaction(&message, CONFIRM_REACTION).await
        }
        None => {
            info!("confirmation for user {user_id} with no pending request");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{test_context, MockChat, MockProvider};
    use crate::domain::types::{MessageRef, PARAM_USER_ID};
    use std::collections::HashMap;

    fn ctx_with_pending(user_id: &str) -> (BotContext, Arc<MockChat>) {
        let chat = Arc::new(MockChat::default());
        let ctx = test_context(chat.clone(), Arc::new(MockProvider::default()));
        let pending = MessageRef {
            room_id: "!bot-ops".into(),
            event_id: "$request".into(),
        };
        ctx.state
            .try_lock()
            .unwrap()
            .record_pending(user_id, pending);
        (ctx, chat)
    }

    fn subscribe_event(user_id: &str) -> NotificationEvent {
        let mut args = HashMap::new();
        args.insert(PARAM_USER_ID.to_string(), user_id.to_string());
        NotificationEvent::Subscribe { args }
    }

    #[tokio::test]
    async fn confirmation_reacts_and_retires_pending() {
        let (ctx, chat) = ctx_with_pending("7");
        handle_event(&ctx, subscribe_event("7")).await.unwrap();
        let reactions = chat.reactions.lock().unwrap();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].1, CONFIRM_REACTION);
        assert_eq!(reactions[0].0.event_id, "$request");
        drop(reactions);
        assert_eq!(ctx.state.lock().await.pending_len(), 0);
    }

    #[tokio::test]
    async fn duplicate_confirmation_is_a_no_op() {
        let (ctx, chat) = ctx_with_pending("7");
        handle_event(&ctx, subscribe_event("7")).await.unwrap();
        handle_event(&ctx, subscribe_event("7")).await.unwrap();
        assert_eq!(chat.reactions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn confirmation_for_unknown_user_is_ignored() {
        let (ctx, chat) = ctx_with_pending("7");
        handle_event(&ctx, subscribe_event("999")).await.unwrap();
        assert!(chat.reactions.lock().unwrap().is_empty());
        assert_eq!(ctx.state.lock().await.pending_len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_decode_error() {
        let chat = Arc::new(MockChat::default());
        let ctx = test_context(chat, Arc::new(MockProvider::default()));
        let err = handle_raw(&ctx, "not json").await.unwrap_err();
        assert!(matches!(err, HeraldError::Decode(_)));
    }

    #[tokio::test]
    async fn stream_event_routes_to_the_announcer() {
        let chat = Arc::new(MockChat::default());
        let provider = Arc::new(MockProvider::with_user("7", "streamer", "Streamer"));
        let ctx = test_context(chat.clone(), provider);
        let raw = r#"{"action":"stream","args":{},"data":[{"user_id":"7","title":"run","game_id":"g1","started_at":"2026-08-23T10:00:00Z","type":"live"}],"id":"n1"}"#;
        handle_raw(&ctx, raw).await.unwrap();
        assert_eq!(chat.sent_bodies().len(), 1);
    }
}
