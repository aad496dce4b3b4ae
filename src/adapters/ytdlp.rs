//! yt-dlp adapter — runs the `yt-dlp` binary and reads its JSON dump.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::*;

/// Slack on top of the extractor's own worst case before we kill it.
const TIMEOUT_GRACE_SECS: u64 = 5;

pub struct YtDlpExtractor {
    binary: PathBuf,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

#[async_trait]
impl LiveExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn extract_live_info(
        &self,
        url: &str,
        opts: &ExtractOptions,
    ) -> Result<LiveInfo, ExtractionError> {
        let budget = outer_timeout(opts);
        let mut cmd = Command::new(&self.binary);
        cmd.args(build_args(url, opts))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(url, binary = %self.binary.display(), "Running yt-dlp");
        let output = tokio::time::timeout(budget, cmd.output())
            .await
            .map_err(|_| ExtractionError::Timeout(budget.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Download(error_message(&stderr)));
        }

        parse_info(&output.stdout)
    }
}

/// Worst case for the extractor's own retry loop, plus grace.
fn outer_timeout(opts: &ExtractOptions) -> Duration {
    let attempts = u64::from(opts.retries) + 1;
    Duration::from_secs(opts.socket_timeout_secs * attempts + TIMEOUT_GRACE_SECS)
}

/// Command-line arguments equivalent to the extraction options.
fn build_args(url: &str, opts: &ExtractOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--dump-single-json".into(),
        "--skip-download".into(),
        "--no-warnings".into(),
        "--socket-timeout".into(),
        opts.socket_timeout_secs.to_string(),
        "--retries".into(),
        opts.retries.to_string(),
        "--user-agent".into(),
        opts.user_agent.clone(),
        "--referer".into(),
        opts.referer.clone(),
    ];

    let mut youtube_args = Vec::new();
    if !opts.player_clients.is_empty() {
        youtube_args.push(format!("player_client={}", opts.player_clients.join(",")));
    }
    if !opts.skip.is_empty() {
        youtube_args.push(format!("skip={}", opts.skip.join(",")));
    }
    if !youtube_args.is_empty() {
        args.push("--extractor-args".into());
        args.push(format!("youtube:{}", youtube_args.join(";")));
    }

    for (name, value) in &opts.headers {
        args.push("--add-header".into());
        args.push(format!("{}:{}", name, value));
    }

    args.push(url.to_string());
    args
}

/// Pull the `ERROR:` lines out of yt-dlp's stderr, or fall back to all of it.
fn error_message(stderr: &str) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .filter_map(|l| l.trim().strip_prefix("ERROR:"))
        .map(str::trim)
        .collect();
    if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("\n")
    }
}

fn parse_info(stdout: &[u8]) -> Result<LiveInfo, ExtractionError> {
    let body: serde_json::Value = serde_json::from_slice(stdout)?;
    let text = |field: &str| body[field].as_str().filter(|s| !s.is_empty()).map(str::to_string);

    Ok(LiveInfo {
        is_live: body["is_live"].as_bool().unwrap_or(false),
        channel_name: text("channel").or_else(|| text("uploader")),
        video_id: text("id"),
    })
}
