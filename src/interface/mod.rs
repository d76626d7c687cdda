//! # Interface Layer
//!
//! The chat-facing command handlers. Each command is a small struct
//! implementing the `Command` trait; the builders here assemble the stock
//! tables the router dispatches against.

pub mod commands;
