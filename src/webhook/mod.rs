//! # Webhook Receiver
//!
//! The stateless side of the notification pipeline. The receiver binary is
//! invoked once per external HTTP request, authenticates and deduplicates the
//! notification, and pushes accepted events onto the OS message queue for the
//! bot process. It holds no in-memory state between invocations.

pub mod dedup;
pub mod receiver;
pub mod signature;
