//! Command-line configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::adapters::ExtractOptions;
use crate::discovery::poller::PollSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind the HTTP API on
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Path to the yt-dlp binary
    #[arg(long, default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Pause after each channel probe
    #[arg(long, default_value_t = 1)]
    pub channel_pause_secs: u64,

    /// Rest between sweeps
    #[arg(long, default_value_t = 60)]
    pub sweep_interval_secs: u64,

    /// Rest after a sweep that saw too many bot detections
    #[arg(long, default_value_t = 300)]
    pub cooldown_secs: u64,

    /// Bot detections tolerated before cooling down
    #[arg(long, default_value_t = 5)]
    pub blocked_threshold: u32,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub yt_dlp: PathBuf,
    pub extract: ExtractOptions,
    pub poll: PollSettings,
    pub log_json: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            listen_addr: SocketAddr::new(args.bind, args.port),
            yt_dlp: args.yt_dlp,
            extract: ExtractOptions::default(),
            poll: PollSettings {
                channel_pause: Duration::from_secs(args.channel_pause_secs),
                sweep_interval: Duration::from_secs(args.sweep_interval_secs),
                cooldown: Duration::from_secs(args.cooldown_secs),
                blocked_threshold: args.blocked_threshold,
            },
            log_json: args.log_json,
        }
    }
}
