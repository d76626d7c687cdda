//! # Herald
//!
//! A chat-operations bot that announces live streams inside a persistent chat
//! server and reacts to user commands. The crate splits into:
//! - Domain: configuration, types, traits, errors
//! - Webhook: the stateless notification receiver (auth + dedup)
//! - Relay: the OS message queue and the thread/event-loop bridge
//! - Application: event dispatch, command routing, announcement state
//! - Infrastructure: Matrix, Twitch, Trello
//! - Interface: built-in command handlers

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod relay;
pub mod strings;
pub mod webhook;
