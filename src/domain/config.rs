//! # Configuration
//!
//! Loading and parsing of the bot's configuration file (`herald.yaml`).
//! Ownership of the values is external; the core only consumes them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// Main application configuration structure.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub chat: ChatConfig,
    pub channels: ChannelPolicy,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub board: Option<BoardConfig>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Chat-server settings: identity, command channels and the relay pair.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Chat-server id. Scopes the OS queue name and the webhook callbacks.
    pub server: String,
    pub homeserver: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Channels where the restricted command table applies.
    #[serde(default)]
    pub command_channels: Vec<String>,
    /// Optional pair: messages arriving in `relay_channel_in` are copied
    /// verbatim to `relay_channel_out`.
    #[serde(default)]
    pub relay_channel_in: Option<String>,
    #[serde(default)]
    pub relay_channel_out: Option<String>,
    /// Name of a compiled-in extension to activate at startup.
    #[serde(default)]
    pub extension: Option<String>,
}

fn default_greeting() -> String {
    "What-ho,".to_string()
}

/// Per-streamer channel routing.
///
/// The default channel is single-slot: a new announcement replaces the
/// previous one. Override channels accumulate history and never delete.
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelPolicy {
    pub default: String,
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl ChannelPolicy {
    /// Resolves the target channel for a streamer login. The second element
    /// is true when the prior announcement should be deleted.
    pub fn resolve(&self, login: &str) -> (&str, bool) {
        match self.overrides.get(login) {
            Some(channel) => (channel.as_str(), false),
            None => (self.default.as_str(), true),
        }
    }
}

/// Streaming-provider (Twitch) credentials and webhook endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    /// Shared secret used to sign webhook deliveries.
    pub secret: String,
    /// Public callback URI registered with the provider hub.
    pub webhook_uri: String,
    /// App access token for the subscriptions listing endpoint.
    pub app_token: String,
}

/// Project-board (Trello) credentials.
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    pub key: String,
    pub token: String,
    pub idea_list: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub log_file: Option<String>,
    /// Directory holding the per-server dedup window files.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    /// Prefix of the OS queue name, `/<prefix>_<server>`.
    #[serde(default = "default_queue_prefix")]
    pub queue_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            state_dir: default_state_dir(),
            queue_prefix: default_queue_prefix(),
        }
    }
}

fn default_state_dir() -> String {
    "/var/lib/herald".to_string()
}

fn default_queue_prefix() -> String {
    "herald".to_string()
}
