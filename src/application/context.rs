//! # Dispatch Context
//!
//! One context object threaded through every handler call, owning the
//! configuration, the external collaborators, the command tables and the
//! mutable bot state. Nothing in the dispatch core reaches for globals.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::registry::{CommandSet, Extension};
use crate::application::state::BotState;
use crate::domain::config::AppConfig;
use crate::domain::traits::{BoardClient, ChatGateway, StreamProvider};

pub struct BotContext {
    pub config: AppConfig,
    pub chat: Arc<dyn ChatGateway>,
    pub provider: Arc<dyn StreamProvider>,
    pub board: Option<Arc<dyn BoardClient>>,
    pub state: Arc<Mutex<BotState>>,
    pub commands: CommandSet,
    pub extension: Option<Arc<dyn Extension>>,
}

impl BotContext {
    /// Runs the extension's fallback predicate, if an extension is loaded.
    /// Returns true when the message was claimed as handled.
    pub async fn fallback_claims(&self, msg: &crate::domain::types::ChatMessage) -> bool {
        match &self.extension {
            Some(extension) => extension.check_message(self, msg).await,
            None => false,
        }
    }
}
