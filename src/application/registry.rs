//! # Command Registration
//!
//! Two tables of named command handlers: the restricted table applies only
//! inside the configured command channels, the open table applies anywhere.
//! Both are built once at startup from the built-ins plus an optional
//! extension; later registration of a name overwrites the earlier one.
//!
//! Extensions are an explicit plugin interface rather than symbol-name
//! discovery: an extension is initialized with the configuration, supplies
//! the router's fallback predicate, and lists the commands it contributes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::domain::config::AppConfig;
use crate::domain::error::HeraldError;
use crate::domain::types::{ChatMessage, CommandReply};

/// A named chat command. `rest` is the message text with the command name
/// removed once; `args` are the whitespace-split positional arguments.
#[async_trait]
pub trait Command: Send + Sync {
    async fn run(
        &self,
        ctx: &BotContext,
        msg: &ChatMessage,
        rest: &str,
        args: &[String],
    ) -> Result<CommandReply, HeraldError>;
}

/// A compiled-in extension, selected by name in the configuration.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Explicit initialization with the full configuration.
    fn init(&mut self, config: &AppConfig) -> Result<(), HeraldError>;

    /// Fallback predicate for messages no command handled (or that carry no
    /// bot mention at all). Returns true to claim the message.
    async fn check_message(&self, ctx: &BotContext, msg: &ChatMessage) -> bool;

    /// Commands to merge into the restricted table; entries overwrite
    /// built-ins of the same name.
    fn commands(&self) -> Vec<(String, Arc<dyn Command>)>;
}

#[derive(Clone, Default)]
pub struct CommandSet {
    restricted: HashMap<String, Arc<dyn Command>>,
    open: HashMap<String, Arc<dyn Command>>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_restricted(&mut self, name: impl Into<String>, command: Arc<dyn Command>) {
        self.restricted.insert(name.into(), command);
    }

    pub fn register_open(&mut self, name: impl Into<String>, command: Arc<dyn Command>) {
        self.open.insert(name.into(), command);
    }

    /// Looks a name up in the table selected by the message's channel kind.
    pub fn resolve(&self, name: &str, in_command_channel: bool) -> Option<Arc<dyn Command>> {
        if in_command_channel {
            self.restricted.get(name).cloned()
        } else {
            self.open.get(name).cloned()
        }
    }

    pub fn merge(&mut self, extension: &dyn Extension) {
        for (name, command) in extension.commands() {
            tracing::info!("extension command '{name}' registered");
            self.register_restricted(name, command);
        }
    }
}

/// Resolves and initializes the named extension. An unknown name or a failed
/// init is startup-fatal by policy.
pub fn load_extension(
    name: &str,
    config: &AppConfig,
) -> Result<Arc<dyn Extension>, HeraldError> {
    let mut extension = registry_entry(name)
        .ok_or_else(|| HeraldError::Extension(format!("unknown extension '{name}'")))?;
    extension.init(config)?;
    Ok(Arc::from(extension))
}

fn registry_entry(_name: &str) -> Option<Box<dyn Extension>> {
    // No extensions are compiled into the stock build; deployments add
    // entries here.
    None
}
