//! # Matrix Gateway
//!
//! `ChatGateway` backed by the Matrix client-server API. Channels are
//! addressed by display name and resolved against the joined rooms of the
//! configured homeserver; rooms on other servers are invisible to the bot.

use anyhow::{Context, Result};
use async_trait::async_trait;
use matrix_sdk::ruma::api::client::presence::set_presence;
use matrix_sdk::ruma::events::reaction::ReactionEventContent;
use matrix_sdk::ruma::events::relation::Annotation;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::presence::PresenceState;
use matrix_sdk::ruma::{EventId, OwnedEventId, OwnedRoomId, RoomId};
use matrix_sdk::{Client, room::Room};

use crate::domain::config::ChatConfig;
use crate::domain::error::HeraldError;
use crate::domain::traits::ChatGateway;
use crate::domain::types::MessageRef;

pub struct MatrixGateway {
    client: Client,
    /// Server name rooms must belong to.
    server: String,
    /// Full user id, the mention marker in message bodies.
    marker: String,
}

/// Builds the client and logs in with the configured credentials.
pub async fn connect(config: &ChatConfig) -> Result<(Client, MatrixGateway)> {
    let client = Client::builder()
        .homeserver_url(&config.homeserver)
        .build()
        .await
        .context("failed to build matrix client")?;

    client
        .matrix_auth()
        .login_username(&config.username, &config.password)
        .send()
        .await
        .context("matrix login failed")?;

    tracing::info!("logged in as {}", config.username);

    let marker = format!("@{}:{}", config.username, config.server);
    let gateway = MatrixGateway {
        client: client.clone(),
        server: config.server.clone(),
        marker,
    };
    Ok((client, gateway))
}

impl MatrixGateway {
    /// True when the room belongs to the configured server. Everything else
    /// the account happens to be joined to is ignored.
    pub fn on_configured_server(&self, room: &Room) -> bool {
        room.room_id().server_name().map(|name| name.as_str()) == Some(self.server.as_str())
    }

    fn room_by_name(&self, name: &str) -> Result<Room, HeraldError> {
        self.client
            .joined_rooms()
            .into_iter()
            .filter(|room| self.on_configured_server(room))
            .find(|room| room.name().as_deref() == Some(name))
            .ok_or_else(|| HeraldError::NotFound(format!("channel '{name}'")))
    }

    fn room_by_id(&self, room_id: &str) -> Result<Room, HeraldError> {
        let room_id: OwnedRoomId = RoomId::parse(room_id)
            .map_err(|err| HeraldError::Decode(format!("bad room id: {err}")))?;
        self.client
            .get_room(&room_id)
            .ok_or_else(|| HeraldError::NotFound(format!("room {room_id}")))
    }

    fn parse_event_id(event_id: &str) -> Result<OwnedEventId, HeraldError> {
        EventId::parse(event_id)
            .map_err(|err| HeraldError::Decode(format!("bad event id: {err}")))
    }
}

#[async_trait]
impl ChatGateway for MatrixGateway {
    fn bot_marker(&self) -> String {
        self.marker.clone()
    }

    async fn send_message(
        &self,
        channel: &str,
        content: &str,
    ) -> Result<MessageRef, HeraldError> {
        let room = self.room_by_name(channel)?;
        let response = room
            .send(RoomMessageEventContent::text_markdown(content))
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        Ok(MessageRef {
            room_id: room.room_id().to_string(),
            event_id: response.event_id.to_string(),
        })
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), HeraldError> {
        let room = self.room_by_id(&message.room_id)?;
        let event_id = Self::parse_event_id(&message.event_id)?;
        room.redact(&event_id, None, None)
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        Ok(())
    }

    async fn add_reaction(&self, message: &MessageRef, key: &str) -> Result<(), HeraldError> {
        let room = self.room_by_id(&message.room_id)?;
        let event_id = Self::parse_event_id(&message.event_id)?;
        room.send(ReactionEventContent::new(Annotation::new(
            event_id,
            key.to_string(),
        )))
        .await
        .map_err(|err| HeraldError::Network(err.to_string()))?;
        Ok(())
    }

    async fn set_presence(&self, status: &str) -> Result<(), HeraldError> {
        let user_id = self
            .client
            .user_id()
            .ok_or_else(|| HeraldError::Auth("not logged in".to_string()))?;
        let mut request = set_presence::v3::Request::new(user_id.to_owned(), PresenceState::Online);
        request.status_msg = Some(status.to_string());
        self.client
            .send(request)
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        Ok(())
    }
}
