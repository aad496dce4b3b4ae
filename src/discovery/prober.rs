//! Status prober — one extractor call per channel, classified.
//!
//! The prober never fails: every extractor outcome is folded into a
//! [`ProbeResult`] so a sweep always gets through all channels.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::adapters::{ExtractOptions, ExtractionError, LiveExtractor};
use crate::registry::{self, ChannelSpec};

/// Longest slice of an extractor message that goes into the logs.
const LOG_MESSAGE_LIMIT: usize = 200;

/// Classified outcome of probing one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Live { channel_name: String, watch_url: String },
    Offline { channel_name: String },
    /// Bot detection / sign-in wall; name is the registry fallback.
    Blocked { channel_name: String },
    /// Inconclusive for any other reason.
    Unknown { reason: String },
}

/// True if an extractor message means we were turned away as a bot.
pub fn is_bot_detection(message: &str) -> bool {
    message.contains("Sign in to confirm") || message.to_lowercase().contains("bot")
}

pub struct StatusProber {
    extractor: Arc<dyn LiveExtractor>,
    options: ExtractOptions,
}

impl StatusProber {
    pub fn new(extractor: Arc<dyn LiveExtractor>, options: ExtractOptions) -> Self {
        Self { extractor, options }
    }

    pub async fn probe(&self, channel: &ChannelSpec) -> ProbeResult {
        info!(channel_id = channel.id, "🔍 Checking channel...");

        let info = match self
            .extractor
            .extract_live_info(&channel.live_url(), &self.options)
            .await
        {
            Ok(info) => info,
            Err(ExtractionError::Download(msg)) => {
                warn!(
                    channel_id = channel.id,
                    extractor = self.extractor.name(),
                    "⚠️ Download error: {}",
                    truncate(&msg, LOG_MESSAGE_LIMIT)
                );
                if is_bot_detection(&msg) {
                    warn!(channel_id = channel.id, "🤖 Bot detection triggered");
                    return ProbeResult::Blocked { channel_name: channel.name.to_string() };
                }
                return ProbeResult::Unknown { reason: truncate(&msg, LOG_MESSAGE_LIMIT).to_string() };
            }
            Err(e) => {
                error!(
                    channel_id = channel.id,
                    extractor = self.extractor.name(),
                    "❌ Error checking channel: {}",
                    e
                );
                return ProbeResult::Unknown { reason: e.to_string() };
            }
        };

        let channel_name = info.channel_name.unwrap_or_else(|| channel.name.to_string());
        if !info.is_live {
            return ProbeResult::Offline { channel_name };
        }

        match info.video_id {
            Some(video_id) => {
                info!(channel_id = channel.id, "✅ Found live stream");
                ProbeResult::Live { channel_name, watch_url: registry::watch_url(&video_id) }
            }
            None => {
                warn!(channel_id = channel.id, "Live stream reported without a video id");
                ProbeResult::Unknown { reason: "live stream without video id".into() }
            }
        }
    }
}

/// Cut to at most `max` chars without splitting a code point.
fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
