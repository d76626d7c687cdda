//! Notification deduplication.
//!
//! The provider may redeliver the same notification; the receiver keeps a
//! bounded window of the most recent notification ids per chat server,
//! persisted between invocations of the stateless process as a JSON array
//! on disk.
//!
//! The read-modify-write cycle has no cross-process locking; two concurrent
//! invocations for the same server can both miss an id and both append it.
//! Known weakness, kept as-is.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of ids the window retains.
pub const WINDOW_CAPACITY: usize = 16;

/// Ordered window of recently seen notification ids, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupWindow {
    ids: VecDeque<String>,
}

impl DedupWindow {
    /// Builds a window from persisted ids, keeping only the newest
    /// `WINDOW_CAPACITY` entries.
    pub fn from_ids(ids: Vec<String>) -> Self {
        let mut ids: VecDeque<String> = ids.into();
        while ids.len() > WINDOW_CAPACITY {
            ids.pop_front();
        }
        Self { ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|seen| seen == id)
    }

    /// Appends an id, evicting the oldest entry once the window is full.
    pub fn record(&mut self, id: impl Into<String>) {
        self.ids.push_back(id.into());
        while self.ids.len() > WINDOW_CAPACITY {
            self.ids.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

/// Durable storage for per-server dedup windows.
pub struct DedupStore {
    dir: PathBuf,
}

impl DedupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, server: &str) -> PathBuf {
        self.dir.join(format!("notifications_{server}.json"))
    }

    /// Loads the window for a server. A missing or unreadable file yields an
    /// empty window (fail-open) so delivery is never silently lost.
    pub fn load(&self, server: &str) -> DedupWindow {
        let path = self.path(server);
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(ids) => DedupWindow::from_ids(ids),
                Err(e) => {
                    tracing::warn!("corrupt dedup file {}: {e}", path.display());
                    DedupWindow::default()
                }
            },
            Err(_) => {
                tracing::info!("no dedup file yet at {}", path.display());
                DedupWindow::default()
            }
        }
    }

    pub fn save(&self, server: &str, window: &DedupWindow) -> std::io::Result<()> {
        let ids: Vec<&str> = window.ids().collect();
        let content = serde_json::to_string(&ids)?;
        fs::write(self.path(server), content)
    }

    /// Read, test membership, append and persist if new. Returns true when
    /// the id is a duplicate. Persistence failures are logged and the id is
    /// treated as new.
    pub fn check_and_record(&self, server: &str, id: &str) -> bool {
        let mut window = self.load(server);
        if window.contains(id) {
            tracing::info!("duplicate notification id '{id}' for server {server}");
            return true;
        }
        window.record(id);
        if let Err(e) = self.save(server, &window) {
            tracing::error!("failed to persist dedup window for server {server}: {e}");
        }
        false
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
