//! # Twitch Client
//!
//! Helix API client plus the webhook-hub subscription calls. Callback URIs
//! embed the target server id and the streamer's user id as query
//! parameters, which is how hub confirmations and deliveries find their way
//! back to the right bot instance.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::domain::config::ProviderConfig;
use crate::domain::error::HeraldError;
use crate::domain::traits::StreamProvider;
use crate::domain::types::{
    LiveStream, ProviderUser, SubscriptionMode, PARAM_SERVER, PARAM_USER_ID,
};

const HELIX: &str = "https://api.twitch.tv/helix";
/// Webhook lease requested from the hub, in seconds (ten days).
const LEASE_SECONDS: u64 = 864_000;
/// Category title used when the lookup fails or the stream has no category.
const UNKNOWN_GAME: &str = "something mysterious";

/// Helix wraps every response in a `data` array, paginated listings add a
/// cursor.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Vec<T>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Deserialize, Default)]
struct Pagination {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct Game {
    name: String,
}

#[derive(Deserialize)]
struct HubSubscription {
    topic: String,
    callback: String,
}

pub struct TwitchClient {
    http: reqwest::Client,
    config: ProviderConfig,
    /// Chat-server id baked into callback URIs.
    server: String,
}

impl TwitchClient {
    pub fn new(config: ProviderConfig, server: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            server: server.into(),
        }
    }

    async fn helix_get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, HeraldError> {
        let response = self
            .http
            .get(format!("{HELIX}/{path}"))
            .header("Client-ID", &self.config.client_id)
            .bearer_auth(&self.config.app_token)
            .query(query)
            .send()
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(HeraldError::Network(format!(
                "helix {path} returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|err| HeraldError::Decode(err.to_string()))
    }

    /// The public callback URI for one streamer, carrying the routing
    /// parameters the webhook receiver requires.
    fn callback_for(&self, user_id: &str) -> Result<String, HeraldError> {
        let mut url = Url::parse(&self.config.webhook_uri)
            .map_err(|err| HeraldError::Decode(format!("bad webhook uri: {err}")))?;
        url.query_pairs_mut()
            .append_pair(PARAM_SERVER, &self.server)
            .append_pair(PARAM_USER_ID, user_id);
        Ok(url.into())
    }

    fn topic_for(user_id: &str) -> String {
        format!("{HELIX}/streams?user_id={user_id}")
    }

    /// One hub request per user; the hub acknowledges with 202 and confirms
    /// asynchronously through the webhook.
    async fn hub_request(
        &self,
        user: &ProviderUser,
        mode: SubscriptionMode,
    ) -> Result<(), HeraldError> {
        let body = serde_json::json!({
            "hub.callback": self.callback_for(&user.id)?,
            "hub.mode": mode.as_hub_mode(),
            "hub.topic": Self::topic_for(&user.id),
            "hub.lease_seconds": LEASE_SECONDS,
            "hub.secret": self.config.secret,
        });
        let response = self
            .http
            .post(format!("{HELIX}/webhooks/hub"))
            .header("Client-ID", &self.config.client_id)
            .bearer_auth(&self.config.app_token)
            .json(&body)
            .send()
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(HeraldError::Network(format!(
                "hub rejected {} for {}: {}",
                mode.as_hub_mode(),
                user.login,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl StreamProvider for TwitchClient {
    async fn lookup_users(&self, logins: &[String]) -> Result<Vec<ProviderUser>, HeraldError> {
        if logins.is_empty() {
            return Ok(Vec::new());
        }
        let query: Vec<(&str, &str)> =
            logins.iter().map(|login| ("login", login.as_str())).collect();
        Ok(self.helix_get::<ProviderUser>("users", &query).await?.data)
    }

    async fn users_by_id(&self, ids: &[String]) -> Result<Vec<ProviderUser>, HeraldError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("id", id.as_str())).collect();
        Ok(self.helix_get::<ProviderUser>("users", &query).await?.data)
    }

    async fn get_user(&self, id: &str) -> Result<ProviderUser, HeraldError> {
        self.helix_get::<ProviderUser>("users", &[("id", id)])
            .await?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| HeraldError::NotFound(format!("user {id}")))
    }

    async fn game_title(&self, game_id: &str, user_id: &str) -> String {
        if game_id.is_empty() {
            return UNKNOWN_GAME.to_string();
        }
        match self.helix_get::<Game>("games", &[("id", game_id)]).await {
            Ok(envelope) => envelope
                .data
                .into_iter()
                .next()
                .map(|game| game.name)
                .unwrap_or_else(|| UNKNOWN_GAME.to_string()),
            Err(err) => {
                warn!("game lookup {game_id} for user {user_id} failed: {err}");
                UNKNOWN_GAME.to_string()
            }
        }
    }

    async fn current_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, HeraldError> {
        if logins.is_empty() {
            return Ok(Vec::new());
        }
        let query: Vec<(&str, &str)> = logins
            .iter()
            .map(|login| ("user_login", login.as_str()))
            .collect();
        Ok(self.helix_get::<LiveStream>("streams", &query).await?.data)
    }

    async fn subscribe(
        &self,
        users: &[ProviderUser],
        mode: SubscriptionMode,
    ) -> Result<Vec<ProviderUser>, HeraldError> {
        let mut accepted = Vec::new();
        for user in users {
            match self.hub_request(user, mode).await {
                Ok(()) => {
                    info!("hub accepted {} for {}", mode.as_hub_mode(), user.login);
                    accepted.push(user.clone());
                }
                Err(err) => warn!("{err}"),
            }
        }
        Ok(accepted)
    }

    async fn subscriptions(&self) -> Result<Vec<ProviderUser>, HeraldError> {
        // The listing covers every subscription of the application token;
        // keep only the ones whose callback targets this server.
        let marker = format!("{PARAM_SERVER}={}", self.server);
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut query: Vec<(&str, &str)> = vec![("first", "100")];
            if let Some(cursor) = &cursor {
                query.push(("after", cursor.as_str()));
            }
            let envelope = self
                .helix_get::<HubSubscription>("webhooks/subscriptions", &query)
                .await?;
            for sub in &envelope.data {
                if !sub.callback.contains(&marker) {
                    continue;
                }
                if let Some((_, id)) = sub.topic.rsplit_once("user_id=") {
                    ids.push(id.to_string());
                }
            }
            match envelope.pagination.cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.users_by_id(&ids).await
    }
}
