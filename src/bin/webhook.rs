//! # Webhook Receiver Binary
//!
//! CGI-style entry point: the web server execs this once per inbound hub
//! request, with the HTTP details in the environment and the body on stdin.
//! It authenticates and deduplicates the request, pushes at most one event
//! onto the target server's OS queue and prints the HTTP response to stdout.
//! The process holds no state beyond the dedup window files.

use std::env;
use std::io::Read;

use anyhow::{Context, Result};

use herald::relay;
use herald::webhook::dedup::DedupStore;
use herald::webhook::receiver::{Receiver, WebhookRequest};

const DEFAULT_STATE_DIR: &str = "/var/lib/herald";
const DEFAULT_QUEUE_PREFIX: &str = "herald";

fn request_from_env() -> Result<WebhookRequest> {
    let method = env::var("REQUEST_METHOD").unwrap_or_else(|_| "GET".to_string());
    let query = env::var("QUERY_STRING").unwrap_or_default();
    let signature = env::var("HTTP_X_HUB_SIGNATURE").ok();
    let notification_id = env::var("HTTP_TWITCH_NOTIFICATION_ID").ok();

    let mut body = Vec::new();
    if method != "GET" {
        std::io::stdin()
            .read_to_end(&mut body)
            .context("failed to read request body")?;
    }

    Ok(WebhookRequest {
        method,
        query,
        body,
        signature,
        notification_id,
    })
}

/// Stdout is the HTTP response, so logs go to a file when `HERALD_LOG_DIR`
/// is set and to stderr otherwise.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    match env::var("HERALD_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "webhook.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
            None
        }
    }
}

fn main() -> Result<()> {
    let _log_guard = init_tracing();

    let secret = env::var("HERALD_TWITCH_SECRET").context("HERALD_TWITCH_SECRET is not set")?;
    let state_dir =
        env::var("HERALD_STATE_DIR").unwrap_or_else(|_| DEFAULT_STATE_DIR.to_string());
    let queue_prefix =
        env::var("HERALD_QUEUE_PREFIX").unwrap_or_else(|_| DEFAULT_QUEUE_PREFIX.to_string());

    let request = request_from_env()?;
    let store = DedupStore::new(&state_dir);
    let outcome = Receiver::new(secret.as_bytes(), &store).handle(&request);

    if let Some((server, event)) = outcome.event {
        let queue = relay::queue_name(&queue_prefix, &server);
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(e) = relay::send(&queue, payload.as_bytes()) {
                    tracing::error!("enqueue on {queue} failed: {e}");
                }
            }
            Err(e) => tracing::error!("event serialization failed: {e}"),
        }
    }

    // The response is always a success; verification failures are not
    // distinguishable from the outside.
    print!(
        "Content-Type: text/plain\nStatus: 200 OK\n\n{}",
        outcome.response
    );
    Ok(())
}
