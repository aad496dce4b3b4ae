//! Live-status poller — sweeps every channel, forever.
//!
//! Channels are probed strictly one at a time with a short pause after
//! each, so the extractor never bursts against YouTube. After every sweep
//! the poller either rests for the normal interval or, when bot detection
//! has piled up, cools down for much longer.
//!
//! The blocked counter carries over between sweeps and is only reset
//! after a cool-down. A handful of blocks per sweep therefore adds up
//! until it trips the threshold.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::prober::{ProbeResult, StatusProber};
use crate::cache::{ChannelStatus, StatusCache};
use crate::registry::{ChannelRegistry, ChannelSpec};

// ── Settings ────────────────────────────────────────────────────────

/// Timing and backoff knobs for the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause after each channel's probe
    pub channel_pause: Duration,
    /// Rest between sweeps in normal operation
    pub sweep_interval: Duration,
    /// Rest between sweeps once too many blocks were seen
    pub cooldown: Duration,
    /// Blocked outcomes tolerated before cooling down (strictly more trips it)
    pub blocked_threshold: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            channel_pause: Duration::from_secs(1),
            sweep_interval: Duration::from_secs(60),
            cooldown: Duration::from_secs(300),
            blocked_threshold: 5,
        }
    }
}

/// How long to rest after a sweep, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPause {
    Normal(Duration),
    CoolDown(Duration),
}

impl SweepPause {
    pub fn duration(&self) -> Duration {
        match *self {
            SweepPause::Normal(d) | SweepPause::CoolDown(d) => d,
        }
    }

    pub fn is_cool_down(&self) -> bool {
        matches!(self, SweepPause::CoolDown(_))
    }
}

impl PollSettings {
    /// Pick the rest after a sweep given the running blocked count.
    pub fn next_pause(&self, blocked: u32) -> SweepPause {
        if blocked > self.blocked_threshold {
            SweepPause::CoolDown(self.cooldown)
        } else {
            SweepPause::Normal(self.sweep_interval)
        }
    }
}

// ── Poller ──────────────────────────────────────────────────────────

/// Outcome counts for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub live: usize,
    pub offline: usize,
    pub blocked: usize,
    pub unknown: usize,
}

pub struct Poller {
    registry: ChannelRegistry,
    prober: StatusProber,
    cache: StatusCache,
    settings: PollSettings,
    blocked: u32,
    sweeps: u64,
}

impl Poller {
    pub fn new(
        registry: ChannelRegistry,
        prober: StatusProber,
        cache: StatusCache,
        settings: PollSettings,
    ) -> Self {
        Self { registry, prober, cache, settings, blocked: 0, sweeps: 0 }
    }

    /// Sweep and rest until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            channels = self.registry.len(),
            interval_secs = self.settings.sweep_interval.as_secs(),
            "📡 Live-status poller starting"
        );
        if self.registry.is_empty() {
            warn!("No channels registered — sweeps will be empty");
        }

        loop {
            let Some(report) = self.sweep(&shutdown).await else { break };
            info!(
                sweep = self.sweeps,
                live = report.live,
                offline = report.offline,
                blocked = report.blocked,
                unknown = report.unknown,
                blocked_total = self.blocked,
                "📡 Sweep complete"
            );

            if !self.rest(&shutdown).await {
                break;
            }
        }

        info!(sweeps = self.sweeps, "Live-status poller stopped");
    }

    /// Probe every channel once, in registry order, writing each result
    /// to the cache. Returns `None` if cancelled part way.
    pub async fn sweep(&mut self, shutdown: &CancellationToken) -> Option<SweepReport> {
        self.sweeps += 1;
        info!(sweep = self.sweeps, "🔁 Checking all channels...");

        let registry = self.registry;
        let mut report = SweepReport::default();
        for channel in registry.iter() {
            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return None,
                result = self.prober.probe(channel) => result,
            };
            self.record(channel, result, &mut report).await;

            if !pause(self.settings.channel_pause, shutdown).await {
                return None;
            }
        }
        Some(report)
    }

    /// Rest after a sweep. Returns `false` if cancelled while resting.
    pub async fn rest(&mut self, shutdown: &CancellationToken) -> bool {
        let next = self.settings.next_pause(self.blocked);
        match next {
            SweepPause::CoolDown(d) => warn!(
                blocked = self.blocked,
                wait_secs = d.as_secs(),
                "⏳ Too many bot detections, cooling down"
            ),
            SweepPause::Normal(d) => debug!(wait_secs = d.as_secs(), "Next sweep scheduled"),
        }

        if !pause(next.duration(), shutdown).await {
            return false;
        }
        if next.is_cool_down() {
            self.blocked = 0;
        }
        true
    }

    async fn record(&mut self, channel: &ChannelSpec, result: ProbeResult, report: &mut SweepReport) {
        let channel_id = channel.id.to_string();
        let checked_at = Utc::now();

        match result {
            ProbeResult::Live { channel_name, watch_url } => {
                report.live += 1;
                info!(channel = %channel_name, url = %watch_url, "✅ LIVE");
                self.cache
                    .put(ChannelStatus::Live { channel_id, channel_name, watch_url, checked_at })
                    .await;
            }
            ProbeResult::Offline { channel_name } => {
                report.offline += 1;
                debug!(channel = %channel_name, "Offline");
                self.cache
                    .put(ChannelStatus::Offline { channel_id, channel_name, checked_at })
                    .await;
            }
            ProbeResult::Blocked { channel_name } => {
                report.blocked += 1;
                self.blocked += 1;
                warn!(channel_id = channel.id, blocked_total = self.blocked, "🚫 Bot detection");
                self.cache
                    .put(ChannelStatus::Blocked { channel_id, channel_name, checked_at })
                    .await;
            }
            ProbeResult::Unknown { reason } => {
                report.unknown += 1;
                info!(channel_id = channel.id, channel = channel.name, %reason, "❌ No status");
                self.cache.clear(&channel_id).await;
            }
        }
    }
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
async fn pause(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::Instant;

    use super::*;
    use crate::adapters::ExtractOptions;
    use crate::discovery::testing::{Reply, ScriptedExtractor};

    static PAIR: &[ChannelSpec] = &[
        ChannelSpec { id: "UC_A", name: "Alpha" },
        ChannelSpec { id: "UC_B", name: "Bravo" },
    ];

    static TRIO: &[ChannelSpec] = &[
        ChannelSpec { id: "UC_1", name: "One" },
        ChannelSpec { id: "UC_2", name: "Two" },
        ChannelSpec { id: "UC_3", name: "Three" },
    ];

    static SIX: &[ChannelSpec] = &[
        ChannelSpec { id: "UC_1", name: "One" },
        ChannelSpec { id: "UC_2", name: "Two" },
        ChannelSpec { id: "UC_3", name: "Three" },
        ChannelSpec { id: "UC_4", name: "Four" },
        ChannelSpec { id: "UC_5", name: "Five" },
        ChannelSpec { id: "UC_6", name: "Six" },
    ];

    fn poller(
        channels: &'static [ChannelSpec],
        extractor: &Arc<ScriptedExtractor>,
    ) -> (Poller, StatusCache) {
        let cache = StatusCache::new();
        let prober = StatusProber::new(extractor.clone(), ExtractOptions::default());
        let poller = Poller::new(
            ChannelRegistry::new(channels),
            prober,
            cache.clone(),
            PollSettings::default(),
        );
        (poller, cache)
    }

    #[test]
    fn test_next_pause_threshold_is_strict() {
        let settings = PollSettings::default();
        assert_eq!(settings.next_pause(0), SweepPause::Normal(Duration::from_secs(60)));
        assert_eq!(settings.next_pause(5), SweepPause::Normal(Duration::from_secs(60)));
        assert_eq!(settings.next_pause(6), SweepPause::CoolDown(Duration::from_secs(300)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_populates_cache() {
        let extractor = Arc::new(ScriptedExtractor::new());
        extractor.always("UC_A", Reply::live("A", "u1"));
        extractor.always("UC_B", Reply::Bot);
        let (mut poller, cache) = poller(PAIR, &extractor);

        let report = poller.sweep(&CancellationToken::new()).await.unwrap();
        assert_eq!(report, SweepReport { live: 1, offline: 0, blocked: 1, unknown: 0 });
        assert_eq!(poller.blocked, 1);

        let snapshot = cache.snapshot().await;
        let a = &snapshot["UC_A"];
        assert!(matches!(a, ChannelStatus::Live { .. }));
        assert_eq!(a.watch_url(), Some("https://www.youtube.com/watch?v=u1"));

        let b = &snapshot["UC_B"];
        assert!(b.is_blocked());
        assert_eq!(b.channel_name(), "Bravo");
        assert!(b.watch_url().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_clears_previous_entry() {
        let extractor = Arc::new(ScriptedExtractor::new());
        extractor.then("UC_A", Reply::live("A", "u1"));
        extractor.then("UC_A", Reply::Download("Video unavailable".into()));
        let (mut poller, cache) = poller(PAIR, &extractor);
        let shutdown = CancellationToken::new();

        poller.sweep(&shutdown).await.unwrap();
        assert!(matches!(cache.snapshot().await.get("UC_A"), Some(ChannelStatus::Live { .. })));

        let report = poller.sweep(&shutdown).await.unwrap();
        assert_eq!(report.unknown, 1);
        let snapshot = cache.snapshot().await;
        assert!(!snapshot.contains_key("UC_A"));
        // B has no script and reads as offline
        assert!(matches!(snapshot.get("UC_B"), Some(ChannelStatus::Offline { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_pause_per_channel_regardless_of_outcome() {
        let extractor = Arc::new(ScriptedExtractor::new());
        extractor.always("UC_1", Reply::Bot);
        extractor.always("UC_2", Reply::Timeout);
        extractor.always("UC_3", Reply::live("Three", "v3"));
        let (mut poller, _cache) = poller(TRIO, &extractor);

        let start = Instant::now();
        poller.sweep(&CancellationToken::new()).await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        let calls = extractor.calls();
        let ids: Vec<_> = calls.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["UC_1", "UC_2", "UC_3"]);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_secs(1));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_six_blocks_trigger_cool_down_and_reset() {
        let extractor = Arc::new(ScriptedExtractor::new());
        for channel in SIX {
            extractor.always(channel.id, Reply::Bot);
        }
        let (mut poller, cache) = poller(SIX, &extractor);
        let shutdown = CancellationToken::new();

        poller.sweep(&shutdown).await.unwrap();
        assert_eq!(poller.blocked, 6);
        assert_eq!(cache.blocked_count().await, 6);

        let start = Instant::now();
        assert!(poller.rest(&shutdown).await);
        assert_eq!(start.elapsed(), Duration::from_secs(300));
        assert_eq!(poller.blocked, 0);
    }

    // The counter is only reset by a cool-down, never by an ordinary
    // sweep: three blocks per sweep trip the threshold on the second one.
    #[tokio::test(start_paused = true)]
    async fn test_blocked_count_carries_across_normal_sweeps() {
        let extractor = Arc::new(ScriptedExtractor::new());
        for channel in TRIO {
            extractor.always(channel.id, Reply::Bot);
        }
        let (poller, _cache) = poller(TRIO, &extractor);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poller.run(shutdown.clone()));

        // Sweeps start at 0s, 63s (normal rest), 366s (cool-down), 429s.
        tokio::time::sleep(Duration::from_secs(400)).await;
        shutdown.cancel();
        handle.await.unwrap();

        let calls = extractor.calls();
        assert_eq!(calls.len(), 9);
        assert_eq!(calls[3].1 - calls[2].1, Duration::from_secs(61));
        assert_eq!(calls[6].1 - calls[5].1, Duration::from_secs(301));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_rest_stops_loop() {
        let extractor = Arc::new(ScriptedExtractor::new());
        let (poller, cache) = poller(PAIR, &extractor);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poller.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(10)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(extractor.calls().len(), 2);
        assert_eq!(cache.snapshot().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_sweep_returns_none() {
        let extractor = Arc::new(ScriptedExtractor::new());
        let (mut poller, _cache) = poller(TRIO, &extractor);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        assert!(poller.sweep(&shutdown).await.is_none());
        assert!(extractor.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_channel_pause_stops_sweep() {
        let extractor = Arc::new(ScriptedExtractor::new());
        let (poller, cache) = poller(TRIO, &extractor);
        let shutdown = CancellationToken::new();
        let start = Instant::now();
        let handle = tokio::spawn(poller.run(shutdown.clone()));

        // Probes at 0s and 1s; at 1.5s the poller sits in the pause after UC_2
        tokio::time::sleep(Duration::from_millis(1500)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(1500));
        let ids: Vec<_> = extractor.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["UC_1", "UC_2"]);
        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert!(!snapshot.contains_key("UC_3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_cool_down_keeps_count() {
        let extractor = Arc::new(ScriptedExtractor::new());
        for channel in SIX {
            extractor.always(channel.id, Reply::Bot);
        }
        let (mut poller, _cache) = poller(SIX, &extractor);
        let shutdown = CancellationToken::new();
        poller.sweep(&shutdown).await.unwrap();

        let canceller = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(100)).await;
                shutdown.cancel();
            })
        };

        let start = Instant::now();
        assert!(!poller.rest(&shutdown).await);
        assert_eq!(start.elapsed(), Duration::from_secs(100));
        // Interrupted cool-down does not count as served
        assert_eq!(poller.blocked, 6);
        canceller.await.unwrap();
    }
}
