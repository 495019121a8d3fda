//! Background poll scheduler.
//!
//! Runs three periodic loops: feed polls for every registered source, price
//! polls for the configured tickers, and a retention sweep over stored
//! records. Loops never overlap themselves; a cycle that outlives its
//! interval simply causes the next tick to be skipped.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::events::{DomainEvent, DomainEventSink};
use crate::prices::PriceSnapshot;
use crate::providers::{FeedProvider, PriceProvider};
use crate::records::{Record, RecordRepositoryTrait};
use crate::sources::{Source, SourceKind, SourceRepositoryTrait};
use crate::tickers::TickerRepositoryTrait;

/// Poll cadences and retention horizon for the background loops.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often every feed source is polled
    pub feed_interval: Duration,
    /// How often ticker prices are refreshed
    pub price_interval: Duration,
    /// How often the retention sweep runs
    pub cleanup_interval: Duration,
    /// Records created earlier than this before now are swept
    pub retention: chrono::Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            feed_interval: Duration::from_secs(60),
            price_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(60 * 60),
            retention: chrono::Duration::hours(24),
        }
    }
}

/// Outcome of polling one source, used to derive connectivity.
enum PollOutcome {
    /// Batch fetched and stored
    Stored(usize),
    /// Upstream answered with nothing new
    Empty,
    /// Poll failed; `connectivity` is true when the failure looks like the
    /// machine being offline rather than the provider misbehaving
    Failed { connectivity: bool },
}

struct RunningLoops {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// Drives the background sync for feeds, prices, and retention.
///
/// All collaborators are trait objects, so hosts can wire real repositories
/// and HTTP clients while tests substitute in-memory fakes.
pub struct PollScheduler {
    sources: Arc<dyn SourceRepositoryTrait>,
    records: Arc<dyn RecordRepositoryTrait>,
    tickers: Arc<dyn TickerRepositoryTrait>,
    feed: Arc<dyn FeedProvider>,
    prices: Arc<dyn PriceProvider>,
    sink: Arc<dyn DomainEventSink>,
    config: SchedulerConfig,
    snapshot: Mutex<PriceSnapshot>,
    online: Mutex<bool>,
    loops: Mutex<Option<RunningLoops>>,
}

impl PollScheduler {
    pub fn new(
        sources: Arc<dyn SourceRepositoryTrait>,
        records: Arc<dyn RecordRepositoryTrait>,
        tickers: Arc<dyn TickerRepositoryTrait>,
        feed: Arc<dyn FeedProvider>,
        prices: Arc<dyn PriceProvider>,
        sink: Arc<dyn DomainEventSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            sources,
            records,
            tickers,
            feed,
            prices,
            sink,
            config,
            snapshot: Mutex::new(PriceSnapshot::new()),
            // Assume connectivity until a cycle proves otherwise
            online: Mutex::new(true),
            loops: Mutex::new(None),
        }
    }

    /// Starts the three poll loops. Each fires immediately, then on its
    /// configured interval. Calling `start` on a running scheduler is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut loops = self.lock_loops();
        if loops.is_some() {
            debug!("Poll scheduler already running");
            return;
        }

        info!(
            "Starting poll scheduler (feeds every {:?}, prices every {:?}, cleanup every {:?})",
            self.config.feed_interval, self.config.price_interval, self.config.cleanup_interval
        );

        // Announce the current connectivity assumption so subscribers start
        // from a known value
        self.sink
            .emit(DomainEvent::network_status(self.is_online()));

        let (shutdown_tx, _) = watch::channel(false);
        let handles = vec![
            self.spawn_feed_loop(shutdown_tx.subscribe()),
            self.spawn_price_loop(shutdown_tx.subscribe()),
            self.spawn_cleanup_loop(shutdown_tx.subscribe()),
        ];

        *loops = Some(RunningLoops {
            shutdown: shutdown_tx,
            handles,
        });
    }

    /// Stops the poll loops, letting any in-flight cycle finish first.
    /// Safe to call repeatedly or before `start`.
    pub async fn stop(&self) {
        let running = self.lock_loops().take();
        match running {
            Some(running) => {
                info!("Stopping poll scheduler");
                let _ = running.shutdown.send(true);
                for handle in running.handles {
                    if let Err(e) = handle.await {
                        warn!("Poll loop terminated abnormally: {}", e);
                    }
                }
            }
            None => debug!("Poll scheduler is not running"),
        }
    }

    /// The latest merged price snapshot.
    pub fn current_prices(&self) -> PriceSnapshot {
        self.lock_snapshot().clone()
    }

    /// The connectivity state derived from recent poll outcomes.
    pub fn is_online(&self) -> bool {
        *self.lock_online()
    }

    /// Polls every feed source once, isolating failures per source.
    pub async fn run_feed_cycle(&self) {
        let sources = match self.sources.list_sources() {
            Ok(sources) => sources,
            Err(e) => {
                error!("Feed cycle aborted, could not list sources: {}", e);
                return;
            }
        };

        let pollable: Vec<Source> = sources
            .into_iter()
            .filter(|source| {
                if source.kind != SourceKind::Feed {
                    debug!("Skipping source '{}': not a feed", source.id);
                    return false;
                }
                if source.upstream_account_id.is_none() {
                    debug!("Skipping source '{}': no upstream account id", source.id);
                    return false;
                }
                true
            })
            .collect();

        if pollable.is_empty() {
            debug!("Feed cycle found no pollable sources");
            return;
        }

        debug!("Polling {} feed sources", pollable.len());
        let outcomes = join_all(pollable.iter().map(|source| self.poll_source(source))).await;

        let stored_total: usize = outcomes
            .iter()
            .map(|outcome| match outcome {
                PollOutcome::Stored(stored) => *stored,
                _ => 0,
            })
            .sum();
        if stored_total > 0 {
            debug!("Feed cycle stored {} records in total", stored_total);
        }

        let any_success = outcomes
            .iter()
            .any(|outcome| !matches!(outcome, PollOutcome::Failed { .. }));
        let all_connectivity = outcomes
            .iter()
            .all(|outcome| matches!(outcome, PollOutcome::Failed { connectivity: true }));

        if any_success {
            self.set_online(true);
        } else if all_connectivity {
            // Every source failed in a way that looks like being offline
            self.set_online(false);
        }
    }

    /// Refreshes ticker prices and merges the result into the held snapshot.
    pub async fn run_price_cycle(&self) {
        let tickers = match self.tickers.list_tickers() {
            Ok(tickers) => tickers,
            Err(e) => {
                error!("Price cycle aborted, could not list tickers: {}", e);
                return;
            }
        };
        if tickers.is_empty() {
            debug!("Price cycle found no configured tickers");
            return;
        }

        let ids: Vec<String> = tickers.into_iter().map(|ticker| ticker.id).collect();
        let fresh = match self.prices.fetch_prices(&ids).await {
            Some(fresh) if !fresh.is_empty() => fresh,
            _ => {
                debug!("Price poll produced no data, keeping previous snapshot");
                return;
            }
        };

        let merged = {
            let mut held = self.lock_snapshot();
            held.merge(fresh);
            held.clone()
        };
        self.set_online(true);
        self.sink.emit(DomainEvent::price_update(merged));
    }

    /// Deletes records older than the retention horizon. Failures are logged
    /// and never interrupt the loop.
    pub async fn run_cleanup_cycle(&self) {
        let cutoff = Utc::now() - self.config.retention;
        match self.records.delete_older_than(cutoff).await {
            Ok(0) => debug!("Retention sweep found nothing to remove"),
            Ok(removed) => info!(
                "Retention sweep removed {} records older than {}",
                removed, cutoff
            ),
            Err(e) => error!("Retention sweep failed: {}", e),
        }
    }

    async fn poll_source(&self, source: &Source) -> PollOutcome {
        let account_id = match source.upstream_account_id.as_deref() {
            Some(account_id) => account_id,
            // Filtered out by the cycle; kept as a guard for direct callers
            None => return PollOutcome::Empty,
        };

        let batch = match self
            .feed
            .fetch_batch(account_id, source.cursor.as_deref())
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Feed poll failed for source '{}': {}", source.id, e);
                let connectivity = e.is_connectivity();
                self.sink
                    .emit(DomainEvent::source_error(source.id.clone(), e.to_string()));
                return PollOutcome::Failed { connectivity };
            }
        };

        if batch.is_empty() {
            debug!("Source '{}' has nothing new", source.id);
            return PollOutcome::Empty;
        }

        // Providers only know the upstream account id; bind the batch to the
        // source it was fetched for.
        let records: Vec<Record> = batch
            .into_iter()
            .map(|mut record| {
                record.source_id = source.id.clone();
                record
            })
            .collect();

        // Upstream order is most-recent-first, so the first id is the cursor
        let newest_id = records[0].id.clone();

        let stored = match self.records.upsert_records(&records).await {
            Ok(stored) => stored,
            Err(e) => {
                error!("Failed to store records for source '{}': {}", source.id, e);
                self.sink
                    .emit(DomainEvent::source_error(source.id.clone(), e.to_string()));
                return PollOutcome::Failed {
                    connectivity: false,
                };
            }
        };

        if let Err(e) = self.sources.advance_cursor(&source.id, &newest_id).await {
            error!(
                "Failed to advance cursor for source '{}': {}",
                source.id, e
            );
            self.sink
                .emit(DomainEvent::source_error(source.id.clone(), e.to_string()));
            return PollOutcome::Failed {
                connectivity: false,
            };
        }

        info!(
            "Stored {} new records for source '{}' (cursor now {})",
            stored, source.id, newest_id
        );
        self.sink
            .emit(DomainEvent::new_records(source.id.clone(), records));
        PollOutcome::Stored(stored)
    }

    fn spawn_feed_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(scheduler.config.feed_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => scheduler.run_feed_cycle().await,
                    _ = shutdown.changed() => {
                        debug!("Feed loop stopped");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_price_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(scheduler.config.price_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => scheduler.run_price_cycle().await,
                    _ = shutdown.changed() => {
                        debug!("Price loop stopped");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_cleanup_loop(self: &Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(scheduler.config.cleanup_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => scheduler.run_cleanup_cycle().await,
                    _ = shutdown.changed() => {
                        debug!("Cleanup loop stopped");
                        break;
                    }
                }
            }
        })
    }

    fn set_online(&self, is_online: bool) {
        let mut held = self.lock_online();
        if *held != is_online {
            *held = is_online;
            drop(held);
            info!("Connectivity changed: online={}", is_online);
            self.sink.emit(DomainEvent::network_status(is_online));
        }
    }

    fn lock_snapshot(&self) -> MutexGuard<'_, PriceSnapshot> {
        self.snapshot.lock().unwrap_or_else(|poisoned| {
            warn!("Price snapshot mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_online(&self) -> MutexGuard<'_, bool> {
        self.online.lock().unwrap_or_else(|poisoned| {
            warn!("Connectivity mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_loops(&self) -> MutexGuard<'_, Option<RunningLoops>> {
        self.loops.lock().unwrap_or_else(|poisoned| {
            warn!("Scheduler loop mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
