//! Integration tests for `RealTimeScheduler`, mostly on tokio's paused clock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, timeout, Instant};
use trigger::{
    ConversationContext, MatchConfig, RealTimeOptions, RealTimeScheduler, SchedulerState,
    SharedEngine, TriggerConfig, TriggerEngine, TriggerEntry, WorldBookPayload,
};

fn shared_engine() -> SharedEngine<WorldBookPayload> {
    let mut engine = TriggerEngine::new(TriggerConfig {
        matching: MatchConfig {
            injection_cooldown_ms: 0,
            ..MatchConfig::default()
        },
        ..TriggerConfig::default()
    });
    engine
        .load_entries(vec![
            TriggerEntry::new("elf", "Elves live long.", WorldBookPayload::default())
                .with_primary_keys(["elf"]),
        ])
        .unwrap();
    Arc::new(Mutex::new(engine))
}

fn options(allow_concurrent: bool) -> RealTimeOptions {
    RealTimeOptions {
        enabled: true,
        debounce_delay_ms: 300,
        min_trigger_interval_ms: 1000,
        allow_concurrent,
    }
}

#[tokio::test(start_paused = true)]
async fn disabled_mode_processes_immediately() {
    let (scheduler, mut rx) = RealTimeScheduler::new(
        shared_engine(),
        RealTimeOptions {
            enabled: false,
            ..RealTimeOptions::default()
        },
    );

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    let result = rx.try_recv().unwrap();
    assert_eq!(result.injected_count, 1);
    assert_eq!(scheduler.state().await, SchedulerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn debounced_context_is_processed_after_delay() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));
    let start = Instant::now();

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    assert_eq!(scheduler.state().await, SchedulerState::Buffering);
    assert_eq!(scheduler.pending_len().await, 1);

    let result = rx.recv().await.unwrap();
    assert_eq!(result.injected_count, 1);
    assert!(start.elapsed() >= Duration::from_millis(300));

    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(scheduler.state().await, SchedulerState::Idle);
    assert_eq!(scheduler.dropped_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn sequential_runs_respect_min_interval() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    scheduler.enqueue(ConversationContext::new("another elf")).await;

    rx.recv().await.unwrap();
    let first_at = Instant::now();
    rx.recv().await.unwrap();
    assert!(first_at.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_skip_min_interval() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(true));
    let start = Instant::now();

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    scheduler.enqueue(ConversationContext::new("another elf")).await;

    rx.recv().await.unwrap();
    rx.recv().await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn contexts_waiting_past_the_delay_are_dropped() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    scheduler.enqueue(ConversationContext::new("another elf")).await;
    time::sleep(Duration::from_millis(400)).await;
    // Arrives while the second run waits out the min interval; stale by the next tick.
    scheduler.enqueue(ConversationContext::new("a third elf")).await;
    time::sleep(Duration::from_secs(3)).await;

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
    assert_eq!(scheduler.dropped_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_clears_queue_and_cancels() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    scheduler.stop().await;
    assert_eq!(scheduler.pending_len().await, 0);
    assert_eq!(scheduler.state().await, SchedulerState::Idle);

    time::sleep(Duration::from_secs(1)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn enqueue_after_stop_rearms() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));

    scheduler.enqueue(ConversationContext::new("an elf")).await;
    scheduler.stop().await;
    scheduler.enqueue(ConversationContext::new("another elf")).await;
    assert_eq!(scheduler.state().await, SchedulerState::Buffering);

    let result = rx.recv().await.unwrap();
    assert_eq!(result.injected_count, 1);
    time::sleep(Duration::from_secs(1)).await;
    assert_eq!(scheduler.state().await, SchedulerState::Idle);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spaced_contexts_on_real_clock_are_all_processed() {
    let (scheduler, mut rx) = RealTimeScheduler::new(
        shared_engine(),
        RealTimeOptions {
            enabled: true,
            debounce_delay_ms: 50,
            min_trigger_interval_ms: 0,
            allow_concurrent: false,
        },
    );

    for _ in 0..5 {
        scheduler.enqueue(ConversationContext::new("an elf")).await;
        let result = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("result within a second")
            .unwrap();
        assert_eq!(result.injected_count, 1);
    }
    assert_eq!(scheduler.dropped_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn burst_on_real_clock_is_fully_processed() {
    let (scheduler, mut rx) = RealTimeScheduler::new(
        shared_engine(),
        RealTimeOptions {
            enabled: true,
            debounce_delay_ms: 50,
            min_trigger_interval_ms: 0,
            allow_concurrent: false,
        },
    );

    for _ in 0..5 {
        scheduler.enqueue(ConversationContext::new("an elf")).await;
    }
    for _ in 0..5 {
        let result = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("result within a second")
            .unwrap();
        assert_eq!(result.injected_count, 1);
    }
    assert_eq!(scheduler.dropped_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn drop_aborts_flush_task() {
    let (scheduler, mut rx) = RealTimeScheduler::new(shared_engine(), options(false));
    scheduler.enqueue(ConversationContext::new("an elf")).await;
    drop(scheduler);
    assert!(rx.recv().await.is_none());
}
