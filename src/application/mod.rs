//! # Application Layer
//!
//! The bot's dispatch core: shared state, the notification dispatcher, the
//! command router and the stream announcement logic. Everything here runs on
//! the event loop; handlers only suspend at awaited gateway/provider calls.

pub mod announce;
pub mod context;
pub mod dispatch;
pub mod registry;
pub mod router;
pub mod state;

#[cfg(test)]
pub mod testing;
