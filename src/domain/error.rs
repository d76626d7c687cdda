//! # Error Kinds
//!
//! Explicit error taxonomy for downstream calls and the webhook pipeline.
//!
//! Handling policy by kind:
//! - `Auth`, `Network`, `Decode`, `NotFound`, `Io`, `Queue`: logged at the
//!   call site and the surrounding command/event continues with a
//!   user-visible failure response where one applies.
//! - `Extension`: startup-fatal; surfaced immediately from `main`.
//!
//! No error terminates the event loop or the relay thread.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("authentication failure: {0}")]
    Auth(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("decode failure: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("queue failure: {0}")]
    Queue(String),
    #[error("extension failure: {0}")]
    Extension(String),
}

impl HeraldError {
    /// Only extension load failures abort startup; everything else is
    /// logged and processing continues.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HeraldError::Extension(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_extension_failures_are_fatal() {
        assert!(HeraldError::Extension("missing".into()).is_fatal());
        assert!(!HeraldError::Network("timeout".into()).is_fatal());
        assert!(!HeraldError::Decode("bad json".into()).is_fatal());
        assert!(!HeraldError::NotFound("channel".into()).is_fatal());
    }
}
