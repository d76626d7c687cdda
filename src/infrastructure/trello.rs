//! # Trello Client
//!
//! Minimal board client: new cards land at the top of the configured ideas
//! list. Credentials travel as query parameters, which is how the Trello
//! REST API wants them.

use async_trait::async_trait;

use crate::domain::config::BoardConfig;
use crate::domain::error::HeraldError;
use crate::domain::traits::BoardClient;

const CARDS_URL: &str = "https://api.trello.com/1/cards";

pub struct TrelloClient {
    http: reqwest::Client,
    config: BoardConfig,
}

impl TrelloClient {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl BoardClient for TrelloClient {
    async fn create_card(&self, title: &str) -> Result<(), HeraldError> {
        let response = self
            .http
            .post(CARDS_URL)
            .query(&[
                ("key", self.config.key.as_str()),
                ("token", self.config.token.as_str()),
                ("idList", self.config.idea_list.as_str()),
                ("name", title),
                ("pos", "top"),
            ])
            .send()
            .await
            .map_err(|err| HeraldError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(HeraldError::Network(format!(
                "card creation returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
