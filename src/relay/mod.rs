//! # IPC Relay
//!
//! Bridges the stateless webhook receiver process and the bot's event loop
//! through a named POSIX message queue. The receiver pushes fire-and-forget;
//! inside the bot a dedicated worker thread blocks on the queue and forwards
//! each decoded message into a tokio channel, which is the only data shared
//! between the thread and the event loop.

use std::ffi::CString;
use std::thread;
use std::time::Duration;

use nix::mqueue::{MQ_OFlag, MqAttr, MqdT, mq_open, mq_receive, mq_send};
use nix::sys::stat::Mode;
use tokio::sync::mpsc;

use crate::domain::error::HeraldError;

const MAX_MESSAGES: i64 = 10;
const MESSAGE_SIZE: i64 = 8192;

/// Name of the OS queue for a chat server: `/<prefix>_<server>`.
pub fn queue_name(prefix: &str, server: &str) -> String {
    format!("/{prefix}_{server}")
}

fn open(name: &str, flags: MQ_OFlag) -> Result<MqdT, HeraldError> {
    let c_name = CString::new(name)
        .map_err(|e| HeraldError::Queue(format!("bad queue name {name}: {e}")))?;
    let attr = MqAttr::new(0, MAX_MESSAGES, MESSAGE_SIZE, 0);
    mq_open(
        c_name.as_c_str(),
        flags | MQ_OFlag::O_CREAT,
        Mode::from_bits_truncate(0o666),
        Some(&attr),
    )
    .map_err(|e| HeraldError::Queue(format!("mq_open {name}: {e}")))
}

/// Pushes one payload onto the named queue, creating it if needed. No
/// acknowledgment; queue-full behavior is the OS's.
pub fn send(name: &str, payload: &[u8]) -> Result<(), HeraldError> {
    let queue = open(name, MQ_OFlag::O_WRONLY)?;
    mq_send(&queue, payload, 0).map_err(|e| HeraldError::Queue(format!("mq_send {name}: {e}")))
}

/// Opens (or creates) the queue for receiving and widens its permissions so
/// the unprivileged receiver process can enqueue, then starts the worker
/// thread. The thread loops forever: blocking-receive, decode UTF-8, hand
/// off through the channel. It only exits when the consumer side is gone.
pub fn spawn_receiver(
    name: String,
    tx: mpsc::UnboundedSender<String>,
) -> Result<thread::JoinHandle<()>, HeraldError> {
    let queue = open(&name, MQ_OFlag::O_RDONLY)?;
    widen_permissions(&name);
    thread::Builder::new()
        .name("mq-relay".to_string())
        .spawn(move || {
            tracing::info!("queue {name} receiving");
            let mut buffer = vec![0u8; MESSAGE_SIZE as usize];
            loop {
                let mut priority = 0u32;
                match mq_receive(&queue, &mut buffer, &mut priority) {
                    Ok(len) => match std::str::from_utf8(&buffer[..len]) {
                        Ok(text) => {
                            tracing::info!("queue message: '{text}'");
                            if tx.send(text.to_string()).is_err() {
                                tracing::info!("event loop gone, relay thread exiting");
                                break;
                            }
                        }
                        Err(e) => tracing::warn!("non-UTF-8 queue message dropped: {e}"),
                    },
                    Err(e) => {
                        tracing::error!("mq_receive on {name}: {e}");
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        })
        .map_err(|e| HeraldError::Queue(format!("relay thread: {e}")))
}

/// Queues live under /dev/mqueue on Linux; 0666 lets the webhook receiver,
/// running as a different user, send to us. Failure is logged, not fatal.
fn widen_permissions(name: &str) {
    use std::os::unix::fs::PermissionsExt;
    let path = format!("/dev/mqueue{name}");
    if let Err(e) = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o666)) {
        tracing::warn!("couldn't set permissions on {path}: {e}");
    }
}
