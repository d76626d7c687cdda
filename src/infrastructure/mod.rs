//! # Infrastructure Layer
//!
//! Concrete clients for the external services: the Matrix chat server, the
//! Twitch helix API and the Trello board. Each implements its domain trait;
//! nothing above this layer knows which service it is talking to.

pub mod matrix;
pub mod trello;
pub mod twitch;
