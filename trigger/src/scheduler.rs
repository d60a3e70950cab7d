//! # Real-time Scheduler
//!
//! Debounced queue in front of [`TriggerEngine`] for streaming input.
//!
//! - **Idle**: queue empty, no flush task.
//! - **Buffering**: queue non-empty, flush task ticking every `debounce_delay`.
//!
//! The first tick fires `debounce_delay` after the arming item arrived. Each tick drains the
//! queue. Items older than `debounce_delay` are dropped as stale and counted; the rest go
//! through the pipeline one at a time, and each result is sent on the channel returned by
//! [`RealTimeScheduler::new`]. A tick that finds the queue empty ends the task and returns
//! the scheduler to Idle.
//!
//! Age is measured at the tick's scheduled instant, so timer jitter never makes an item
//! stale. When the loop was busy for more than a full period (a sequential run waiting out
//! `min_trigger_interval`), age is measured at the moment of the drain instead.
//!
//! With `allow_concurrent = false`, successive pipeline runs are at least
//! `min_trigger_interval` apart. With `allow_concurrent = true`, each item runs in its own
//! task; they still take turns on the engine lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use trigger_core::{ConversationContext, EntryPayload, InjectionResult, RealTimeOptions};

use crate::engine::TriggerEngine;

/// Engine handle shared between the scheduler and its callers.
pub type SharedEngine<P> = Arc<Mutex<TriggerEngine<P>>>;

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Buffering,
}

/// A queued context and the moment it arrived.
#[derive(Debug)]
pub struct Pending {
    pub ctx: ConversationContext,
    pub arrived_at: Instant,
}

#[derive(Default)]
struct Buffer {
    pending: VecDeque<Pending>,
    armed: bool,
}

struct Shared<P> {
    engine: SharedEngine<P>,
    options: RealTimeOptions,
    buffer: Mutex<Buffer>,
    last_run: Mutex<Option<Instant>>,
    results: mpsc::UnboundedSender<InjectionResult<P>>,
    dropped: AtomicU64,
}

/// Debounces contexts into the engine pipeline.
pub struct RealTimeScheduler<P> {
    shared: Arc<Shared<P>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<P: EntryPayload> RealTimeScheduler<P> {
    /// Creates the scheduler and the receiver its results are published on.
    pub fn new(
        engine: SharedEngine<P>,
        options: RealTimeOptions,
    ) -> (Self, mpsc::UnboundedReceiver<InjectionResult<P>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            shared: Arc::new(Shared {
                engine,
                options,
                buffer: Mutex::new(Buffer::default()),
                last_run: Mutex::new(None),
                results: tx,
                dropped: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        };
        (scheduler, rx)
    }

    /// Queues `ctx`, arming the flush task if idle.
    ///
    /// When real-time mode is disabled the pipeline runs immediately and the result is
    /// published before this returns.
    pub async fn enqueue(&self, ctx: ConversationContext) {
        if !self.shared.options.enabled {
            let result = self.shared.engine.lock().await.process_message(&ctx).await;
            self.shared.publish(result);
            return;
        }

        let arrived_at = Instant::now();
        let mut buffer = self.shared.buffer.lock().await;
        buffer.pending.push_back(Pending { ctx, arrived_at });
        if buffer.armed {
            return;
        }
        buffer.armed = true;
        debug!(pending = buffer.pending.len(), "scheduler: idle -> buffering");

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move { run_flush_loop(shared, arrived_at).await });
        // Set under the buffer lock: an armed buffer always has its task handle.
        *self.task.lock().await = Some(handle);
    }

    pub async fn state(&self) -> SchedulerState {
        if self.shared.buffer.lock().await.armed {
            SchedulerState::Buffering
        } else {
            SchedulerState::Idle
        }
    }

    /// Number of contexts waiting for the next tick.
    pub async fn pending_len(&self) -> usize {
        self.shared.buffer.lock().await.pending.len()
    }

    /// Contexts discarded as stale so far.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Cancels the flush task and clears the queue. In-flight items publish nothing.
    pub async fn stop(&self) {
        let mut buffer = self.shared.buffer.lock().await;
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }
        buffer.armed = false;
        let cleared = buffer.pending.len();
        buffer.pending.clear();
        drop(buffer);
        info!(cleared, "scheduler stopped");
    }
}

impl<P> Drop for RealTimeScheduler<P> {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

impl<P: EntryPayload> Shared<P> {
    fn publish(&self, result: InjectionResult<P>) {
        if self.results.send(result).is_err() {
            debug!("scheduler: result receiver dropped");
        }
    }

    fn period(&self) -> Duration {
        self.options.debounce_delay().max(Duration::from_millis(1))
    }

    async fn wait_min_interval(&self) {
        let min_interval = self.options.min_trigger_interval();
        let mut last_run = self.last_run.lock().await;
        if let Some(last) = *last_run {
            let ready_at = last + min_interval;
            if Instant::now() < ready_at {
                time::sleep_until(ready_at).await;
            }
        }
        *last_run = Some(Instant::now());
    }
}

async fn run_flush_loop<P: EntryPayload>(shared: Arc<Shared<P>>, armed_at: Instant) {
    let period = shared.period();
    let mut ticker = time::interval_at(armed_at + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight: JoinSet<()> = JoinSet::new();

    loop {
        let tick_at = ticker.tick().await;

        let drained: Vec<Pending> = {
            let mut buffer = shared.buffer.lock().await;
            if buffer.pending.is_empty() {
                if in_flight.is_empty() {
                    buffer.armed = false;
                    debug!("scheduler: buffering -> idle");
                    return;
                }
                drop(buffer);
                while in_flight.join_next().await.is_some() {}
                continue;
            }
            buffer.pending.drain(..).collect()
        };

        let measured_at = age_reference(tick_at, Instant::now(), period);
        let (fresh, stale) = partition_stale(drained, measured_at, period);
        if stale > 0 {
            shared.dropped.fetch_add(stale as u64, Ordering::Relaxed);
            warn!(stale, "scheduler: dropped stale contexts");
        }
        info!(count = fresh.len(), "step: scheduler flush");

        for pending in fresh {
            if shared.options.allow_concurrent {
                let shared = Arc::clone(&shared);
                in_flight.spawn(async move {
                    let result = shared.engine.lock().await.process_message(&pending.ctx).await;
                    shared.publish(result);
                });
            } else {
                shared.wait_min_interval().await;
                let result = shared.engine.lock().await.process_message(&pending.ctx).await;
                shared.publish(result);
            }
        }
    }
}

/// Instant item ages are measured at: the scheduled tick, or `drained_at` when the tick
/// fired more than a full `period` late.
fn age_reference(tick_at: Instant, drained_at: Instant, period: Duration) -> Instant {
    if drained_at.saturating_duration_since(tick_at) > period {
        drained_at
    } else {
        tick_at
    }
}

/// Splits `items` into those at most `max_age` old at `now`, and the count of older ones.
pub fn partition_stale(
    items: Vec<Pending>,
    now: Instant,
    max_age: Duration,
) -> (Vec<Pending>, usize) {
    let total = items.len();
    let fresh: Vec<Pending> = items
        .into_iter()
        .filter(|p| now.saturating_duration_since(p.arrived_at) <= max_age)
        .collect();
    let stale = total - fresh.len();
    (fresh, stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(arrived_at: Instant) -> Pending {
        Pending {
            ctx: ConversationContext::new("x"),
            arrived_at,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn partition_drops_only_older_than_max_age() {
        let start = Instant::now();
        time::advance(Duration::from_millis(1000)).await;
        let now = Instant::now();

        let items = vec![
            pending(start),
            pending(now - Duration::from_millis(300)),
            pending(now - Duration::from_millis(301)),
            pending(now),
        ];
        let (fresh, stale) = partition_stale(items, now, Duration::from_millis(300));
        assert_eq!(stale, 2);
        assert_eq!(fresh.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ages_use_the_scheduled_tick_unless_a_period_late() {
        let period = Duration::from_millis(300);
        time::advance(Duration::from_secs(1)).await;
        let tick_at = Instant::now();

        let jittered = tick_at + Duration::from_millis(2);
        assert_eq!(age_reference(tick_at, jittered, period), tick_at);

        let arming = pending(tick_at - period);
        let (fresh, stale) =
            partition_stale(vec![arming], age_reference(tick_at, jittered, period), period);
        assert_eq!((fresh.len(), stale), (1, 0));

        let busy = tick_at + Duration::from_millis(700);
        assert_eq!(age_reference(tick_at, busy, period), busy);
    }
}
