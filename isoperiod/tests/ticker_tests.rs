//! Ticker behavior under a paused Tokio clock.
//!
//! These tests cover the notification stream's lifecycle:
//! - Budget exhaustion closes the stream
//! - Cancellation via stop, stop handles, shutdown and drop
//! - Best-effort delivery (slow consumers lose ticks)
//! - Guarded restarts

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use isoperiod::{
    Ending, FixedClock, Period, PeriodError, Ticker, TickerConfig, TickerState, TryRecvError,
};
use jiff::Zoned;
use tokio::time::Instant;

fn period(s: &str) -> Period {
    s.parse().expect("valid period")
}

fn parse_zoned(s: &str) -> Zoned {
    s.parse().expect("valid zoned datetime")
}

// =============================================================================
// Budget exhaustion
// =============================================================================

#[tokio::test(start_paused = true)]
async fn bounded_stream_ends_after_budget() {
    let mut ticker = Ticker::new(period("R3/PT1S"));
    let mut ticks = ticker.start().unwrap();

    let mut received = 0;
    while ticks.recv().await.is_some() {
        received += 1;
    }

    assert_eq!(received, 3);
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Exhausted));
    assert_eq!(ticker.state(), TickerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn ticks_arrive_one_interval_apart() {
    let config = TickerConfig::default().interval(Duration::from_millis(250));
    let mut ticker = Ticker::with_config(period("R2/PT1S"), config);
    let started = Instant::now();
    let mut ticks = ticker.start().unwrap();

    ticks.recv().await.unwrap();
    let first = started.elapsed();
    assert!(first >= Duration::from_millis(250) && first < Duration::from_millis(300));
    ticks.recv().await.unwrap();
    let second = started.elapsed();
    assert!(second >= Duration::from_millis(500) && second < Duration::from_millis(550));
    assert!(ticks.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_after_natural_end_is_noop() {
    let mut ticker = Ticker::new(period("R1/PT1S"));
    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());
    assert!(ticks.recv().await.is_none());
    ticker.join().await.unwrap();

    ticker.stop();
    assert_eq!(ticker.state(), TickerState::Stopped);
    assert_eq!(ticker.shutdown().await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn never_budget_emits_nothing() {
    let mut ticker = Ticker::new(period("P1D"));
    let ticks = ticker.start().unwrap();
    let all: Vec<Zoned> = ticks.collect().await;
    assert!(all.is_empty());
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Exhausted));
}

#[tokio::test(start_paused = true)]
async fn ticks_are_a_stream() {
    let mut ticker = Ticker::new(period("R4/PT1S"));
    let ticks = ticker.start().unwrap();
    let all: Vec<Zoned> = ticks.collect().await;
    assert_eq!(all.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn ticks_are_stamped_by_clock() {
    let at = parse_zoned("2023-01-01T00:00:00+00:00[UTC]");
    let mut ticker =
        Ticker::new(period("R2/PT1S")).with_clock(Arc::new(FixedClock::new(at.clone())));
    let ticks = ticker.start().unwrap();
    let all: Vec<Zoned> = ticks.collect().await;
    assert_eq!(all, vec![at.clone(), at]);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn stop_ends_unbounded_stream() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());
    assert!(ticks.recv().await.is_some());

    let stopped_at = Instant::now();
    ticker.stop();
    assert!(ticks.recv().await.is_none());
    assert!(stopped_at.elapsed() < Duration::from_secs(1));

    assert_eq!(ticker.shutdown().await.unwrap(), Some(Ending::Cancelled));
    assert_eq!(ticker.state(), TickerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_handle_cancels_from_another_task() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let mut ticks = ticker.start().unwrap();
    let handle = ticker.stop_handle();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.stop();
    });

    let mut received = 0;
    while ticks.recv().await.is_some() {
        received += 1;
    }
    assert_eq!(received, 2);
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn stop_handle_taken_before_start() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let handle = ticker.stop_handle();
    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());

    handle.stop();
    assert!(ticks.recv().await.is_none());
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Cancelled));
    assert_eq!(ticker.state(), TickerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_handle_follows_restart() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let handle = ticker.stop_handle();

    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());
    handle.stop();
    assert!(ticks.recv().await.is_none());
    ticker.join().await.unwrap();

    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());
    handle.stop();
    assert!(ticks.recv().await.is_none());
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_and_reports() {
    let mut ticker = Ticker::new(period("R100/PT1S"));
    let _ticks = ticker.start().unwrap();
    assert_eq!(ticker.state(), TickerState::Running);
    assert_eq!(ticker.shutdown().await.unwrap(), Some(Ending::Cancelled));
    assert_eq!(ticker.state(), TickerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn dropping_ticker_ends_stream() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let mut ticks = ticker.start().unwrap();
    assert!(ticks.recv().await.is_some());
    drop(ticker);
    assert!(ticks.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn shutdown_without_start() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    assert_eq!(ticker.shutdown().await.unwrap(), None);
    assert_eq!(ticker.state(), TickerState::Idle);
}

// =============================================================================
// Back-pressure
// =============================================================================

#[tokio::test(start_paused = true)]
async fn slow_consumer_loses_ticks() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let mut ticks = ticker.start().unwrap();

    // Ticks at 1s..=5s: the first fills the buffer, the other four are dropped.
    tokio::time::sleep(Duration::from_millis(5500)).await;
    assert_eq!(ticker.dropped_ticks(), 4);

    assert!(ticks.try_recv().is_ok());
    assert_eq!(ticks.try_recv(), Err(TryRecvError::Empty));

    ticker.shutdown().await.unwrap();
    assert_eq!(ticks.try_recv(), Err(TryRecvError::Disconnected));
}

#[tokio::test(start_paused = true)]
async fn dropped_ticks_still_consume_budget() {
    let mut ticker = Ticker::new(period("R3/PT1S"));
    let mut ticks = ticker.start().unwrap();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Exhausted));
    assert_eq!(ticker.dropped_ticks(), 2);

    // Only the buffered first tick survives.
    assert!(ticks.recv().await.is_some());
    assert!(ticks.recv().await.is_none());
}

// =============================================================================
// Restart guard
// =============================================================================

#[tokio::test(start_paused = true)]
async fn second_start_while_running_is_rejected() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let _ticks = ticker.start().unwrap();
    let err = ticker.start().unwrap_err();
    assert!(matches!(err, PeriodError::AlreadyRunning));
    ticker.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn restart_right_after_stream_ends() {
    let config = TickerConfig::default().interval(Duration::from_millis(1));
    let mut ticker = Ticker::with_config(period("R1/PT1S"), config);

    for round in 0..200 {
        let ticks = ticker
            .start()
            .unwrap_or_else(|e| panic!("round {round}: {e}"));
        let all: Vec<Zoned> = ticks.collect().await;
        assert_eq!(all.len(), 1, "round {round}");
        assert_eq!(ticker.state(), TickerState::Stopped, "round {round}");
    }
    ticker.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop() {
    let mut ticker = Ticker::new(period("R2/PT1S"));

    let first: Vec<Zoned> = ticker.start().unwrap().collect().await;
    assert_eq!(first.len(), 2);
    ticker.join().await.unwrap();

    let second: Vec<Zoned> = ticker.start().unwrap().collect().await;
    assert_eq!(second.len(), 2);
    assert_eq!(ticker.join().await.unwrap(), Some(Ending::Exhausted));
}

// =============================================================================
// Configuration limits
// =============================================================================

#[test]
fn start_outside_runtime_is_an_error() {
    let mut ticker = Ticker::new(period("R/PT1S"));
    let err = ticker.start().unwrap_err();
    assert!(matches!(err, PeriodError::NoRuntime), "{err:?}");
    assert_eq!(ticker.state(), TickerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn huge_interval_is_clamped() {
    let config = TickerConfig::default().interval(Duration::MAX);
    let mut ticker = Ticker::with_config(period("R/PT1S"), config);
    let mut ticks = ticker.start().unwrap();
    assert_eq!(ticks.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(ticker.shutdown().await.unwrap(), Some(Ending::Cancelled));
}
