//! Live-info extractor trait — the boundary to the external extractor.
//!
//! The prober hands an extractor a channel's live URL and gets back
//! whether a stream is up, who is streaming, and the video id. The only
//! implementation in production is [`ytdlp::YtDlpExtractor`]; tests plug
//! in scripted extractors.

use async_trait::async_trait;
use thiserror::Error;

pub mod ytdlp;

// ── Core Types ──────────────────────────────────────────────────────

/// What the extractor learned about a channel's live URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveInfo {
    pub is_live: bool,
    pub channel_name: Option<String>,
    pub video_id: Option<String>,
}

/// Options passed through to the extractor on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Per-socket timeout in seconds
    pub socket_timeout_secs: u64,
    /// Retries performed inside the extractor, not by the caller
    pub retries: u32,
    pub user_agent: String,
    pub referer: String,
    /// Player clients the YouTube extractor should try, in order
    pub player_clients: Vec<String>,
    /// Formats/manifests the YouTube extractor may skip
    pub skip: Vec<String>,
    /// Extra request headers as (name, value) pairs
    pub headers: Vec<(String, String)>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            socket_timeout_secs: 10,
            retries: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
            referer: "https://www.youtube.com/".into(),
            player_clients: vec!["android".into(), "web".into()],
            skip: vec!["hls".into(), "dash".into(), "translated_subs".into()],
            headers: vec![
                ("Accept-Language".into(), "en-US,en;q=0.9".into()),
                (
                    "Accept".into(),
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into(),
                ),
            ],
        }
    }
}

/// Failure reported by an extractor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extractor ran and reported a download/extraction failure.
    #[error("download error: {0}")]
    Download(String),

    #[error("extractor timed out after {0}s")]
    Timeout(u64),

    #[error("failed to start extractor: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("unreadable extractor output: {0}")]
    Parse(#[from] serde_json::Error),
}

// ── Extractor Trait ─────────────────────────────────────────────────

/// Resolves a channel's live URL into live-stream metadata.
///
/// One call per invocation. Any retrying happens inside the
/// implementation according to [`ExtractOptions::retries`].
#[async_trait]
pub trait LiveExtractor: Send + Sync {
    /// Short identifier for logs (e.g., "yt-dlp").
    fn name(&self) -> &str;

    async fn extract_live_info(
        &self,
        url: &str,
        opts: &ExtractOptions,
    ) -> Result<LiveInfo, ExtractionError>;
}
