// src/ingest/collector.rs
//! Poll cycle: reload config → fetch/parse/filter every enabled source →
//! dedup → notify → sleep. Paused by the control channel between cycles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

use crate::config::{Settings, SettingsSource, SourceConfig};
use crate::control::PauseFlag;
use crate::error::{ConfigError, FetchError, SourceError};
use crate::heartbeat::HeartbeatScheduler;
use crate::ingest::dedup::DedupCache;
use crate::ingest::providers::{AdapterFactory, SiteAdapters};
use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};
use crate::notify::{NotificationSink, GREETING_BODY, GREETING_SUBJECT};

/// Characters of a failing document attached to the operator notification.
pub const SNAPSHOT_CHARS: usize = 4000;

const DEFAULT_SLEEP: Duration = Duration::from_secs(600);
const DEFAULT_PAUSE_CHECK: Duration = Duration::from_secs(60);

/// Adapter plus its runtime state. `enabled` drops to false after a failure
/// and is restored by the next reload. Until its first successful read a
/// source is `seeded = false`: that read is recorded, not sent.
struct ActiveSource {
    config: SourceConfig,
    fetch_timeout: Duration,
    adapter: Box<dyn SourceAdapter>,
    enabled: bool,
    seeded: bool,
}

struct Failure {
    error: SourceError,
    document: Option<RawDocument>,
}

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Listings that passed the per-source filters.
    pub fetched: usize,
    /// Of those, not seen before.
    pub fresh: usize,
    /// Listing notifications the sink accepted.
    pub sent: usize,
    /// Descriptions recorded without notification (a source's first successful read).
    pub seeded: usize,
    /// Sources that failed this cycle.
    pub failed: Vec<SiteId>,
    pub greeted: bool,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct Collector {
    settings: Arc<dyn SettingsSource>,
    factory: Arc<dyn AdapterFactory>,
    sink: Arc<dyn NotificationSink>,
    pause: PauseFlag,
    dedup: DedupCache,
    heartbeat: HeartbeatScheduler,
    clock: fn() -> NaiveDateTime,
    sources: Vec<ActiveSource>,
    sleep_time: Duration,
    pause_check: Duration,
}

impl Collector {
    pub fn new(
        settings: Arc<dyn SettingsSource>,
        sink: Arc<dyn NotificationSink>,
        pause: PauseFlag,
    ) -> Self {
        Self {
            settings,
            factory: Arc::new(SiteAdapters),
            sink,
            pause,
            dedup: DedupCache::default(),
            heartbeat: HeartbeatScheduler::new(local_now().date()),
            clock: local_now,
            sources: Vec::new(),
            sleep_time: DEFAULT_SLEEP,
            pause_check: DEFAULT_PAUSE_CHECK,
        }
    }

    pub fn with_factory(mut self, factory: Arc<dyn AdapterFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replace the wall clock used for the daily greeting.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self.heartbeat = HeartbeatScheduler::new(clock().date());
        self
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    /// Sources that failed in the latest cycle; they are retried after the next reload.
    pub fn disabled_sources(&self) -> Vec<SiteId> {
        self.sources
            .iter()
            .filter(|s| !s.enabled)
            .map(|s| s.adapter.site())
            .collect()
    }

    /// Runs until a configuration error; that error is fatal for the process.
    pub async fn run(mut self) -> Result<(), ConfigError> {
        loop {
            let wait = self.tick().await?;
            tokio::time::sleep(wait).await;
        }
    }

    /// One scheduler step. Returns how long to sleep before the next one.
    pub async fn tick(&mut self) -> Result<Duration, ConfigError> {
        if self.pause.is_paused() {
            debug!("collection paused");
            return Ok(self.pause_check);
        }
        self.run_cycle().await?;
        Ok(self.sleep_time)
    }

    pub async fn run_cycle(&mut self) -> Result<CycleReport, ConfigError> {
        let settings = self.settings.load()?;
        self.sleep_time = settings.main.sleep_time;
        self.pause_check = settings.main.pause_check;
        self.refresh_sources(&settings)?;

        info!(sources = self.sources.len(), "collecting projects");
        counter!("collector_cycles_total").increment(1);
        let mut report = CycleReport::default();

        if let Some(at) = settings.main.hello_time {
            if self.heartbeat.is_due((self.clock)(), at) {
                deliver(self.sink.as_ref(), GREETING_SUBJECT, GREETING_BODY).await;
                report.greeted = true;
            }
        }

        let mut aggregate: Vec<Listing> = Vec::new();
        for source in self.sources.iter_mut() {
            let site = source.adapter.site();
            debug!(%site, "processing source");

            match collect(source.adapter.as_ref(), source.fetch_timeout).await {
                Ok(mut listings) => {
                    counter!("listings_parsed_total", "site" => site.as_str())
                        .increment(listings.len() as u64);
                    report.fetched += listings.len();
                    if source.seeded {
                        aggregate.append(&mut listings);
                        continue;
                    }
                    for listing in &listings {
                        self.dedup.record(&listing.description);
                    }
                    source.seeded = true;
                    report.seeded += listings.len();
                    info!(
                        %site,
                        seeded = listings.len(),
                        "first read of source: current listings recorded, nothing sent"
                    );
                }
                Err(failure) => {
                    source.enabled = false;
                    report.failed.push(site);
                    report_failure(self.sink.as_ref(), source.adapter.as_ref(), &failure).await;
                }
            }
        }

        let dedup = &mut self.dedup;
        let fresh: Vec<Listing> = aggregate
            .into_iter()
            .filter(|l| dedup.admit(&l.description))
            .collect();
        report.fresh = fresh.len();
        counter!("listings_new_total").increment(fresh.len() as u64);
        info!(
            received = report.fetched,
            fresh = report.fresh,
            "projects received"
        );

        for listing in &fresh {
            if deliver(self.sink.as_ref(), &listing.subject(), &listing.render_body()).await {
                report.sent += 1;
            }
        }

        Ok(report)
    }

    /// Keep adapters whose config entry is unchanged and switch them back on;
    /// build fresh ones for new or edited entries. Config order is preserved.
    fn refresh_sources(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let fetch_timeout = settings.main.fetch_timeout;
        let mut previous = std::mem::take(&mut self.sources);
        let mut next = Vec::with_capacity(settings.sources.len());

        for cfg in settings.sources.iter().filter(|s| s.enabled) {
            let reuse = previous
                .iter()
                .position(|p| p.config == *cfg && p.fetch_timeout == fetch_timeout);
            match reuse {
                Some(pos) => {
                    let mut kept = previous.remove(pos);
                    if !kept.enabled {
                        info!(site = %cfg.site, "re-enabling source after reload");
                        kept.enabled = true;
                    }
                    next.push(kept);
                }
                None => {
                    debug!(site = %cfg.site, "building source adapter");
                    next.push(ActiveSource {
                        config: cfg.clone(),
                        fetch_timeout,
                        adapter: self.factory.build(cfg, fetch_timeout)?,
                        enabled: true,
                        seeded: false,
                    });
                }
            }
        }

        self.sources = next;
        Ok(())
    }
}

/// fetch → parse (parse applies the source's relevance filter).
async fn collect(
    adapter: &dyn SourceAdapter,
    fetch_timeout: Duration,
) -> Result<Vec<Listing>, Failure> {
    let t0 = Instant::now();
    let fetched = tokio::time::timeout(fetch_timeout, adapter.fetch()).await;
    histogram!("source_fetch_ms", "site" => adapter.site().as_str())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);

    let document = match fetched {
        Ok(Ok(doc)) => doc,
        Ok(Err(e)) => {
            return Err(Failure {
                error: e.into(),
                document: None,
            })
        }
        Err(_elapsed) => {
            return Err(Failure {
                error: FetchError::Timeout(fetch_timeout).into(),
                document: None,
            })
        }
    };

    adapter.parse(&document).map_err(|e| Failure {
        error: e.into(),
        document: Some(document),
    })
}

fn snapshot(body: &str) -> String {
    body.chars().take(SNAPSHOT_CHARS).collect()
}

async fn report_failure(sink: &dyn NotificationSink, adapter: &dyn SourceAdapter, failure: &Failure) {
    let site = adapter.site();
    let err = &failure.error;
    error!(
        %site,
        endpoint = adapter.endpoint(),
        class = err.class(),
        error = %err,
        "{} on source; disabled until the next reload",
        err.kind()
    );
    counter!("source_errors_total", "site" => site.as_str(), "kind" => err.metric_kind())
        .increment(1);

    let subject = format!("PM: {} for {}", err.kind(), site);
    let mut body = format!("{}: {}", err.class(), err);

    if let (SourceError::Parse(_), Some(doc)) = (err, failure.document.as_ref()) {
        let snap = snapshot(&doc.body);
        warn!(%site, url = %doc.url, document = %snap, "document that failed to parse");
        body.push_str("\n\n--- document snapshot ---\n");
        body.push_str(&snap);
    }

    deliver(sink, &subject, &body).await;
}

/// Delivery failures are logged and counted, never propagated.
async fn deliver(sink: &dyn NotificationSink, subject: &str, body: &str) -> bool {
    match sink.send(subject, body).await {
        Ok(()) => {
            counter!("notifications_sent_total").increment(1);
            true
        }
        Err(e) => {
            warn!(error = %e, %subject, "notification not delivered");
            counter!("notifications_failed_total").increment(1);
            false
        }
    }
}
