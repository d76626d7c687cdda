//! Shared test doubles for the dispatch core: a recording chat gateway, a
//! canned stream provider and a canned project board.

use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::context::BotContext;
use crate::application::state::BotState;
use crate::domain::config::AppConfig;
use crate::domain::error::HeraldError;
use crate::domain::traits::{BoardClient, ChatGateway, StreamProvider};
use crate::domain::types::{
    ChatMessage, LiveStream, MessageRef, ProviderUser, SubscriptionMode,
};

pub const SAMPLE_CONFIG: &str = r#"
chat:
  server: "42"
  homeserver: https://matrix.example.org
  username: herald
  password: hunter2
  greeting: What-ho,
  command_channels: [bot-ops]
  relay_channel_in: lobby-in
  relay_channel_out: lobby-out
channels:
  default: announcements
  overrides:
    special: special-streams
provider:
  client_id: abc
  secret: shh
  webhook_uri: https://example.org/cgi-bin/herald-webhook
  app_token: tok
"#;

pub fn sample_config() -> AppConfig {
    serde_yaml::from_str(SAMPLE_CONFIG).unwrap()
}

#[derive(Default)]
pub struct MockChat {
    pub sent: StdMutex<Vec<(String, String, MessageRef)>>,
    pub deleted: StdMutex<Vec<MessageRef>>,
    pub reactions: StdMutex<Vec<(MessageRef, String)>>,
    pub presence: StdMutex<Vec<String>>,
    counter: AtomicUsize,
}

impl MockChat {
    pub fn sent_bodies(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(channel, content, _)| (channel.clone(), content.clone()))
            .collect()
    }
}

#[async_trait]
impl ChatGateway for MockChat {
    fn bot_marker(&self) -> String {
        "@herald:example.org".to_string()
    }

    async fn send_message(
        &self,
        channel: &str,
        content: &str,
    ) -> Result<MessageRef, HeraldError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let message = MessageRef {
            room_id: format!("!{channel}"),
            event_id: format!("$evt-{n}"),
        };
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), content.to_string(), message.clone()));
        Ok(message)
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), HeraldError> {
        self.deleted.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn add_reaction(&self, message: &MessageRef, key: &str) -> Result<(), HeraldError> {
        self.reactions
            .lock()
            .unwrap()
            .push((message.clone(), key.to_string()));
        Ok(())
    }

    async fn set_presence(&self, status: &str) -> Result<(), HeraldError> {
        self.presence.lock().unwrap().push(status.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MockProvider {
    pub users: Vec<ProviderUser>,
    pub streams: Vec<LiveStream>,
    pub subscribe_calls: StdMutex<Vec<(Vec<String>, SubscriptionMode)>>,
}

impl MockProvider {
    pub fn with_user(id: &str, login: &str, display_name: &str) -> Self {
        Self {
            users: vec![ProviderUser {
                id: id.to_string(),
                login: login.to_string(),
                display_name: display_name.to_string(),
                profile_image_url: String::new(),
            }],
            ..Default::default()
        }
    }
}

#[async_trait]
impl StreamProvider for MockProvider {
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<ProviderUser>, HeraldError> {
        Ok(self
            .users
            .iter()
            .filter(|u| logins.contains(&u.login))
            .cloned()
            .collect())
    }

    async fn users_by_id(&self, ids: &[String]) -> Result<Vec<ProviderUser>, HeraldError> {
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn get_user(&self, id: &str) -> Result<ProviderUser, HeraldError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| HeraldError::NotFound(format!("user {id}")))
    }

    async fn game_title(&self, _game_id: &str, _user_id: &str) -> String {
        "Chess".to_string()
    }

    async fn current_streams(&self, _logins: &[String]) -> Result<Vec<LiveStream>, HeraldError> {
        Ok(self.streams.clone())
    }

    async fn subscribe(
        &self,
        users: &[ProviderUser],
        mode: SubscriptionMode,
    ) -> Result<Vec<ProviderUser>, HeraldError> {
        self.subscribe_calls
            .lock()
            .unwrap()
            .push((users.iter().map(|u| u.id.clone()).collect(), mode));
        Ok(users.to_vec())
    }

    async fn subscriptions(&self) -> Result<Vec<ProviderUser>, HeraldError> {
        Ok(self.users.clone())
    }
}

#[derive(Default)]
pub struct MockBoard {
    pub created: StdMutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl BoardClient for MockBoard {
    async fn create_card(&self, title: &str) -> Result<(), HeraldError> {
        if self.fail {
            return Err(HeraldError::Network("board down".into()));
        }
        self.created.lock().unwrap().push(title.to_string());
        Ok(())
    }
}

/// A context wired to mocks, with the built-in command tables.
pub fn test_context(chat: Arc<MockChat>, provider: Arc<MockProvider>) -> BotContext {
    BotContext {
        config: sample_config(),
        chat,
        provider,
        board: Some(Arc::new(MockBoard::default())),
        state: Arc::new(Mutex::new(BotState::default())),
        commands: crate::interface::commands::builtin(),
        extension: None,
    }
}

/// An inbound message carrying the bot mention plus the given command text.
pub fn command_message(channel: &str, text: &str) -> ChatMessage {
    ChatMessage {
        room_id: format!("!{channel}"),
        event_id: "$trigger".to_string(),
        channel_name: channel.to_string(),
        sender: "@alice:example.org".to_string(),
        sender_mention: "@alice:example.org".to_string(),
        body: format!("@herald:example.org {text}"),
    }
}

pub fn plain_message(channel: &str, body: &str) -> ChatMessage {
    ChatMessage {
        room_id: format!("!{channel}"),
        event_id: "$plain".to_string(),
        channel_name: channel.to_string(),
        sender: "@alice:example.org".to_string(),
        sender_mention: "@alice:example.org".to_string(),
        body: body.to_string(),
    }
}

pub fn live_stream(user_id: &str) -> LiveStream {
    LiveStream {
        user_id: user_id.to_string(),
        title: "speedrun".to_string(),
        game_id: "g1".to_string(),
        started_at: chrono::Utc::now(),
        kind: "live".to_string(),
        thumbnail_url: String::new(),
    }
}
