//! Repeating notification stream for a [`Period`].
//!
//! A [`Ticker`] owns at most one background task at a time. The task wakes on
//! a fixed-rate interval, tries to hand the current time to the consumer, and
//! counts down the period's repetition budget:
//!
//! ```text
//!   Idle ──start──▶ Running ──budget hits 0──▶ Terminating ──▶ Stopped
//!                      │                                          ▲
//!                      └──────────────── stop() ──────────────────┘
//! ```
//!
//! Delivery is best-effort. The channel holds a single tick, and a tick that
//! finds it full is dropped and counted rather than queued.
//!
//! ```no_run
//! # async fn demo() -> Result<(), isoperiod::PeriodError> {
//! use isoperiod::{Period, Ticker};
//!
//! let period: Period = "R3/PT1S".parse()?;
//! let mut ticker = Ticker::new(period);
//! let mut ticks = ticker.start()?;
//! while let Some(at) = ticks.recv().await {
//!     println!("tick at {at}");
//! }
//! # Ok(())
//! # }
//! ```

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_core::Stream;
use jiff::Zoned;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::error::PeriodError;
use crate::period::Period;

pub use tokio::sync::mpsc::error::TryRecvError;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const MIN_INTERVAL: Duration = Duration::from_millis(1);
// Roughly 30 years. Deadlines further out than this overflow `Instant` on
// some platforms.
const MAX_INTERVAL: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Lifecycle of a ticker's background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TickerState {
    /// Never started.
    Idle = 0,
    /// Ticking.
    Running = 1,
    /// Budget exhausted, winding down.
    Terminating = 2,
    /// Task finished. The ticker may be started again.
    Stopped = 3,
}

impl TickerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Terminating,
            _ => Self::Stopped,
        }
    }

    /// Whether a task is active in this state.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Terminating)
    }
}

/// Why a ticker's stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// The repetition budget ran out.
    Exhausted,
    /// `stop`, `shutdown`, or dropping the ticker cancelled it.
    Cancelled,
}

/// Timing knobs for a [`Ticker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerConfig {
    /// Time between ticks. Clamped to between 1ms and about 30 years.
    pub interval: Duration,
    /// How long [`Ticker::shutdown`] waits for the task to finish.
    pub shutdown_timeout: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl TickerConfig {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// State shared between a ticker, its stop handles and its task.
#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    dropped: AtomicU64,
    /// Token of the current run. Replaced by every `start`, under this lock.
    cancel: Mutex<CancellationToken>,
}

impl Shared {
    fn state(&self) -> TickerState {
        TickerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set(&self, state: TickerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Cancel the current run if it is still ticking.
    fn stop(&self) {
        let cancel = self.cancel.lock();
        if self.state() != TickerState::Running {
            return;
        }
        debug!("ticker stop requested");
        cancel.cancel();
    }

    /// Cancel the current run whatever its state.
    fn cancel_run(&self) {
        self.cancel.lock().cancel();
    }
}

/// Drives the repeating notification stream of a [`Period`].
///
/// Dropping the ticker cancels its task.
pub struct Ticker {
    period: Period,
    config: TickerConfig,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    task: Option<JoinHandle<Ending>>,
}

impl Ticker {
    pub fn new(period: Period) -> Self {
        Self::with_config(period, TickerConfig::default())
    }

    pub fn with_config(period: Period, config: TickerConfig) -> Self {
        Self {
            period,
            config,
            clock: Arc::new(SystemClock),
            shared: Arc::new(Shared {
                state: AtomicU8::new(TickerState::Idle as u8),
                dropped: AtomicU64::new(0),
                cancel: Mutex::new(CancellationToken::new()),
            }),
            task: None,
        }
    }

    /// Stamp ticks with `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn config(&self) -> &TickerConfig {
        &self.config
    }

    pub fn state(&self) -> TickerState {
        self.shared.state()
    }

    /// Ticks dropped in the current run because the consumer was not keeping up.
    pub fn dropped_ticks(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Spawn the background task and return the tick stream.
    ///
    /// Fails with [`PeriodError::NoRuntime`] outside a Tokio runtime and with
    /// [`PeriodError::AlreadyRunning`] while a previous run is still active.
    pub fn start(&mut self) -> Result<Ticks, PeriodError> {
        let runtime = Handle::try_current().map_err(|_| PeriodError::NoRuntime)?;

        let cancel = {
            let mut slot = self.shared.cancel.lock();
            let current = self.shared.state();
            if current.is_active() {
                return Err(PeriodError::AlreadyRunning);
            }
            self.shared
                .state
                .compare_exchange(
                    current as u8,
                    TickerState::Running as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map_err(|_| PeriodError::AlreadyRunning)?;
            *slot = CancellationToken::new();
            slot.clone()
        };
        self.shared.dropped.store(0, Ordering::Relaxed);

        let (tx, rx) = mpsc::channel(1);
        let every = self.config.interval.clamp(MIN_INTERVAL, MAX_INTERVAL);

        debug!(
            period = %self.period,
            interval = ?every,
            budget = %self.period.repetitions(),
            "starting ticker"
        );

        let run = Run {
            tx,
            cancel,
            shared: Arc::clone(&self.shared),
            clock: Arc::clone(&self.clock),
            remaining: self.period.repetitions().countdown(),
            every,
        };
        self.task = Some(runtime.spawn(run.drive()));

        Ok(Ticks { rx })
    }

    /// Ask the running task to stop. Returns immediately; the stream ends
    /// shortly after. Does nothing unless the ticker is running.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// A cloneable handle that stops whichever run is current when it is
    /// used, including runs started after the handle was taken.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel the current run and wait, at most `shutdown_timeout`, for the
    /// task to finish.
    ///
    /// Returns `Ok(None)` if no run was ever started or it was already joined.
    pub async fn shutdown(&mut self) -> Result<Option<Ending>, PeriodError> {
        self.shared.cancel_run();
        let Some(task) = self.task.take() else {
            return Ok(None);
        };
        let waited = self.config.shutdown_timeout;
        match time::timeout(waited, task).await {
            Ok(joined) => joined
                .map(Some)
                .map_err(|e| PeriodError::TaskFailed {
                    message: e.to_string(),
                }),
            Err(_) => Err(PeriodError::ShutdownTimeout { waited }),
        }
    }

    /// Wait for the current run to end on its own, without cancelling it.
    pub async fn join(&mut self) -> Result<Option<Ending>, PeriodError> {
        let Some(task) = self.task.take() else {
            return Ok(None);
        };
        task.await.map(Some).map_err(|e| PeriodError::TaskFailed {
            message: e.to_string(),
        })
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shared.cancel_run();
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker")
            .field("period", &self.period)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Stops a ticker's current run.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Does nothing unless a run is ticking.
    pub fn stop(&self) {
        self.shared.stop();
    }
}

/// The consumer side of a ticker: one timestamp per delivered tick.
///
/// Ends when the budget is exhausted or the ticker is stopped.
#[derive(Debug)]
pub struct Ticks {
    rx: mpsc::Receiver<Zoned>,
}

impl Ticks {
    /// Wait for the next tick, `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Zoned> {
        self.rx.recv().await
    }

    /// Take a tick that is already waiting, without blocking.
    ///
    /// [`TryRecvError::Empty`] means no tick is buffered yet,
    /// [`TryRecvError::Disconnected`] that the stream has ended.
    pub fn try_recv(&mut self) -> Result<Zoned, TryRecvError> {
        self.rx.try_recv()
    }
}

impl Stream for Ticks {
    type Item = Zoned;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Zoned>> {
        self.rx.poll_recv(cx)
    }
}

/// Everything the background task owns.
struct Run {
    tx: mpsc::Sender<Zoned>,
    cancel: CancellationToken,
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    remaining: Option<u64>,
    every: Duration,
}

impl Run {
    async fn drive(mut self) -> Ending {
        let ending = if self.remaining == Some(0) {
            Ending::Exhausted
        } else {
            self.tick_loop().await
        };

        // Stopped must be visible before the consumer sees the stream end,
        // so a restart straight after `None` is accepted.
        self.shared.set(TickerState::Stopped);
        drop(self.tx);
        debug!(?ending, "ticker stopped");
        ending
    }

    async fn tick_loop(&mut self) -> Ending {
        let mut interval = time::interval_at(Instant::now() + self.every, self.every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ending::Cancelled,
                _ = interval.tick() => {
                    self.emit();
                    if let Some(left) = self.remaining.as_mut() {
                        *left -= 1;
                        if *left == 0 {
                            self.shared.set(TickerState::Terminating);
                            return Ending::Exhausted;
                        }
                    }
                }
            }
        }
    }

    fn emit(&self) {
        match self.tx.try_send(self.clock.now()) {
            Ok(()) => trace!(remaining = ?self.remaining, "tick delivered"),
            Err(TrySendError::Full(at)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(%at, "tick dropped, consumer not ready");
            }
            Err(TrySendError::Closed(at)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(%at, "tick dropped, consumer gone");
            }
        }
    }
}
