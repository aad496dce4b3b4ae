//! Channel registry — the static set of channels we monitor.
//!
//! Every channel the poller sweeps is described here by its YouTube
//! channel id and a fallback display name. The table is compiled in and
//! iterated in declaration order on every sweep.

// ── Channel Spec ────────────────────────────────────────────────────

/// Static description of a monitored channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// YouTube channel id (e.g., "UCmxQ_3W5b9kSfpmROqGJ0rA")
    pub id: &'static str,
    /// Display name used when the extractor does not report one
    pub name: &'static str,
}

impl ChannelSpec {
    /// The channel's "/live" URL, which redirects to the current stream.
    pub fn live_url(&self) -> String {
        format!("https://www.youtube.com/channel/{}/live", self.id)
    }
}

/// Canonical watch URL for a video.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

// ── Static Registry ─────────────────────────────────────────────────

/// All channels in the LCU, in sweep order.
pub static LCU_CHANNELS: &[ChannelSpec] = &[
    ChannelSpec { id: "UC7WRbUmD6W-dCP_UlDbhI4A", name: "LolcowTechTalk" },
    ChannelSpec { id: "UCmxQ_3W5b9kSfpmROqGJ0rA", name: "LolcowLive" },
    ChannelSpec { id: "UC2xdmM3rcLFD_iN46H8y-6w", name: "LolcowBalls" },
    ChannelSpec { id: "UCUENzb0fUK-6uvLL3zD08Jw", name: "LolcowRewind" },
    ChannelSpec { id: "UCBQgQPjVx4wgszEmGR5cPJg", name: "LolcowCafe" },
    ChannelSpec { id: "UCOzrx6iM9qQ4lIzf7BbkuCQ", name: "LolcowQueens" },
    ChannelSpec { id: "UChcQ2TIYiihd9B4H50eRVlQ", name: "LolcowAussy" },
    ChannelSpec { id: "UCRh4qe6HGD10ZsyG56eUdHA", name: "LolcowMilkers" },
    ChannelSpec { id: "UC9NU92OuAiSLvAarnqZEoUw", name: "LolcowTest" },
    ChannelSpec { id: "UCW5AOoyYnirhluLJBpdKE9g", name: "LolcowDolls" },
    ChannelSpec { id: "UCU3iQ0uiduxtArm9337dXug", name: "LolcowNerds" },
    ChannelSpec { id: "UCAXmJMnzByOtsdOZKnnF8bQ", name: "LolcowChubby" },
];

/// Immutable, ordered view over a channel table.
///
/// Cheap to copy; the poller and the HTTP handlers each hold one.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRegistry {
    channels: &'static [ChannelSpec],
}

impl ChannelRegistry {
    pub const fn new(channels: &'static [ChannelSpec]) -> Self {
        Self { channels }
    }

    /// The compiled-in LCU table.
    pub const fn lcu() -> Self {
        Self::new(LCU_CHANNELS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ChannelSpec> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
