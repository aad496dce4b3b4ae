//! Status cache — latest known status per channel.
//!
//! Written by the poller only, read by every HTTP handler. Entries are
//! replaced whole under the write lock and cloned out under the read
//! lock, so a reader never sees half of an update.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Cached outcome of the most recent conclusive probe of a channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChannelStatus {
    Live {
        channel_id: String,
        channel_name: String,
        watch_url: String,
        checked_at: DateTime<Utc>,
    },
    Offline {
        channel_id: String,
        channel_name: String,
        checked_at: DateTime<Utc>,
    },
    /// The extractor was turned away by bot detection.
    Blocked {
        channel_id: String,
        channel_name: String,
        checked_at: DateTime<Utc>,
    },
}

impl ChannelStatus {
    pub fn channel_id(&self) -> &str {
        match self {
            Self::Live { channel_id, .. }
            | Self::Offline { channel_id, .. }
            | Self::Blocked { channel_id, .. } => channel_id,
        }
    }

    pub fn channel_name(&self) -> &str {
        match self {
            Self::Live { channel_name, .. }
            | Self::Offline { channel_name, .. }
            | Self::Blocked { channel_name, .. } => channel_name,
        }
    }

    /// Only live entries carry a watch URL.
    pub fn watch_url(&self) -> Option<&str> {
        match self {
            Self::Live { watch_url, .. } => Some(watch_url),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Shared map from channel id to its latest [`ChannelStatus`].
///
/// A missing entry means the channel has not been probed yet or its last
/// probe was inconclusive.
#[derive(Clone, Default)]
pub struct StatusCache {
    entries: Arc<RwLock<HashMap<String, ChannelStatus>>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for the status's channel.
    pub async fn put(&self, status: ChannelStatus) {
        let mut entries = self.entries.write().await;
        entries.insert(status.channel_id().to_string(), status);
    }

    /// Forget a channel's entry.
    pub async fn clear(&self, channel_id: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(channel_id);
    }

    /// Copy of every entry, for handlers that need a consistent view.
    pub async fn snapshot(&self) -> HashMap<String, ChannelStatus> {
        let entries = self.entries.read().await;
        entries.clone()
    }

    pub async fn blocked_count(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|s| s.is_blocked()).count()
    }
}
