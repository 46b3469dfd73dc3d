//! The run engine and its control surface.
//!
//! [`run_job`] executes one [`Job`] to a terminal state on the calling
//! thread: countdown, then the repeat loop of emit / enter / jittered
//! wait. The cancellation token is checked before every phase change,
//! every emission, and every sub-wait, so a stop request lands within one
//! poll interval no matter which stage the run is in.
//!
//! [`Scheduler`] wraps the engine for concurrent callers: it runs the
//! engine on a `tokio` blocking task, enforces the single-active-run rule,
//! and exposes `cancel`/`state`/`wait`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cancel::CancellationToken;
use crate::error::{AutoTyperError, Result};
use crate::injector::Injector;
use crate::jitter::{jittered_delay, JitterSource, UniformJitter};
use crate::job::Job;

/// Where a run currently is, or how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// No run has been started yet.
    Idle = 0,
    /// Waiting out the pre-start grace period.
    CountingDown = 1,
    /// Typing a message.
    Emitting = 2,
    /// Waiting between messages.
    Waiting = 3,
    /// A stop was requested and the worker has not yet wound down.
    Stopping = 4,
    /// All repetitions finished.
    Completed = 5,
    /// Stopped on request before finishing.
    Stopped = 6,
    /// Rejected up front or aborted by an emission error.
    Failed = 7,
}

impl RunState {
    /// Terminal states end a run; everything else is in flight.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::CountingDown,
            2 => Self::Emitting,
            3 => Self::Waiting,
            4 => Self::Stopping,
            5 => Self::Completed,
            6 => Self::Stopped,
            7 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Lock-free cell holding the live [`RunState`].
#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn set(&self, state: RunState) {
        self.0.store(state as u8, Ordering::Relaxed);
    }

    fn get(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Relaxed))
    }
}

/// One phase notification from a run.
///
/// The `Display` form is the human-readable status line the original
/// tool showed for the same phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    /// Seconds left before typing starts.
    CountdownTick(u64),
    /// Starting to type message `iteration` (1-based).
    Emitting { iteration: u32, simulated: bool },
    Waiting,
    Stopped,
    Completed,
    Failed(String),
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "Ready"),
            Self::CountdownTick(secs) => write!(f, "Starting in {secs}..."),
            Self::Emitting {
                iteration,
                simulated: true,
            } => write!(f, "Typing message {iteration} (simulated)..."),
            Self::Emitting { iteration, .. } => write!(f, "Typing message {iteration}..."),
            Self::Waiting => write!(f, "Waiting..."),
            Self::Stopped => write!(f, "Stopped."),
            Self::Completed => write!(f, "Completed."),
            Self::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

/// Receives phase notifications as a run progresses.
///
/// Reports arrive from the worker thread; implementations must not block
/// for long or they stretch the run's timing.
pub trait StatusSink: Send + Sync {
    fn report(&self, status: Status);
}

/// Channel-backed sink, handy for tests and for bridging to async
/// consumers. Send errors are ignored; a dropped receiver just means
/// nobody is watching anymore.
impl StatusSink for std::sync::mpsc::Sender<Status> {
    fn report(&self, status: Status) {
        let _ = self.send(status);
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl StatusSink for NullSink {
    fn report(&self, _status: Status) {}
}

/// Execute one job to a terminal state, blocking the calling thread.
///
/// The terminal state is also reported through `sink`, exactly once:
/// `Completed` when the repeat count is exhausted, `Stopped` when
/// cancellation was observed at any checkpoint, `Failed` on up-front
/// rejection or an emission error.
pub fn run_job(
    job: &Job,
    token: &CancellationToken,
    injector: &dyn Injector,
    sink: &dyn StatusSink,
    jitter: &dyn JitterSource,
) -> RunState {
    drive(job, token, injector, sink, jitter, &StateCell::default())
}

fn drive(
    job: &Job,
    token: &CancellationToken,
    injector: &dyn Injector,
    sink: &dyn StatusSink,
    jitter: &dyn JitterSource,
    state: &StateCell,
) -> RunState {
    sink.report(Status::Ready);

    // Up-front rejection, before any countdown or emission.
    if job.message.trim().is_empty() {
        return fail(state, sink, &AutoTyperError::EmptyMessage);
    }
    if !job.simulate && !injector.ready() {
        return fail(
            state,
            sink,
            &AutoTyperError::injector_unavailable("no input backend on this system"),
        );
    }

    tracing::debug!(
        repeat_count = job.repeat_count,
        simulate = job.simulate,
        "run starting"
    );

    // Countdown so the user can focus the target window.
    state.set(RunState::CountingDown);
    let mut remaining = job.countdown;
    while !remaining.is_zero() {
        if token.is_cancelled() {
            return stop(state, sink);
        }
        sink.report(Status::CountdownTick(ceil_secs(remaining)));
        let step = remaining.min(Duration::from_secs(1));
        if token.sleep(step) {
            return stop(state, sink);
        }
        remaining = remaining.saturating_sub(step);
    }

    let mut iteration: u32 = 0;
    loop {
        if job.repeat_count != 0 && iteration >= job.repeat_count {
            state.set(RunState::Completed);
            sink.report(Status::Completed);
            tracing::debug!(iterations = iteration, "run completed");
            return RunState::Completed;
        }
        if token.is_cancelled() {
            return stop(state, sink);
        }
        iteration += 1;

        state.set(RunState::Emitting);
        sink.report(Status::Emitting {
            iteration,
            simulated: job.simulate,
        });
        if let Err(e) = injector.emit(&job.message, job.char_delay, token) {
            return fail(state, sink, &e);
        }
        if job.press_enter && !token.is_cancelled() {
            if let Err(e) = injector.press_enter() {
                return fail(state, sink, &e);
            }
        }
        if token.is_cancelled() {
            return stop(state, sink);
        }

        let delay = jittered_delay(job.message_delay, job.jitter, jitter);
        if !delay.is_zero() {
            state.set(RunState::Waiting);
            sink.report(Status::Waiting);
            if token.sleep(delay) {
                return stop(state, sink);
            }
        }
    }
}

fn stop(state: &StateCell, sink: &dyn StatusSink) -> RunState {
    state.set(RunState::Stopped);
    sink.report(Status::Stopped);
    tracing::debug!("run stopped on request");
    RunState::Stopped
}

fn fail(state: &StateCell, sink: &dyn StatusSink, error: &AutoTyperError) -> RunState {
    state.set(RunState::Failed);
    sink.report(Status::Failed(error.to_string()));
    tracing::warn!(error = %error, "run failed");
    RunState::Failed
}

/// Seconds left, rounded up, for countdown display.
fn ceil_secs(remaining: Duration) -> u64 {
    remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
}

struct ActiveRun {
    token: CancellationToken,
    handle: JoinHandle<RunState>,
}

/// Drives jobs on a background task, one at a time.
///
/// Requires a tokio runtime: `start` hands the blocking engine to
/// `tokio::task::spawn_blocking`. The caller side of the contract is
/// `cancel` (write) and `state`/`wait` plus the status sink (read); no
/// other state crosses the thread boundary.
pub struct Scheduler {
    injector: Arc<dyn Injector>,
    sink: Arc<dyn StatusSink>,
    jitter: Arc<dyn JitterSource>,
    state: Arc<StateCell>,
    active: Mutex<Option<ActiveRun>>,
}

impl Scheduler {
    pub fn new(injector: Arc<dyn Injector>, sink: Arc<dyn StatusSink>) -> Self {
        Self::with_jitter(injector, sink, Arc::new(UniformJitter::new()))
    }

    /// Scheduler with an explicit jitter source, for reproducible runs.
    pub fn with_jitter(
        injector: Arc<dyn Injector>,
        sink: Arc<dyn StatusSink>,
        jitter: Arc<dyn JitterSource>,
    ) -> Self {
        Self {
            injector,
            sink,
            jitter,
            state: Arc::new(StateCell::default()),
            active: Mutex::new(None),
        }
    }

    /// Start a run for `job`.
    ///
    /// Fails fast, without touching an active run, on `AlreadyRunning`,
    /// `EmptyMessage`, or `InjectorUnavailable`.
    pub fn start(&self, job: Job) -> Result<()> {
        let mut active = self.active.lock().unwrap();
        if active.as_ref().is_some_and(|run| !run.handle.is_finished()) {
            return Err(AutoTyperError::AlreadyRunning);
        }

        job.validate()?;
        if !job.simulate && !self.injector.ready() {
            return Err(AutoTyperError::injector_unavailable(
                "no input backend on this system",
            ));
        }

        let token = CancellationToken::new();
        let worker_token = token.clone();
        let injector = Arc::clone(&self.injector);
        let sink = Arc::clone(&self.sink);
        let jitter = Arc::clone(&self.jitter);
        let state = Arc::clone(&self.state);

        state.set(RunState::Idle);
        let handle = tokio::task::spawn_blocking(move || {
            drive(
                &job,
                &worker_token,
                injector.as_ref(),
                sink.as_ref(),
                jitter.as_ref(),
                &state,
            )
        });

        *active = Some(ActiveRun { token, handle });
        Ok(())
    }

    /// Request cancellation of the active run. No-op when idle.
    pub fn cancel(&self) {
        let active = self.active.lock().unwrap();
        if let Some(run) = active.as_ref() {
            if !run.handle.is_finished() {
                run.token.cancel();
                self.state.set(RunState::Stopping);
                tracing::debug!("cancellation requested");
            }
        }
    }

    /// The current run's state, or the last terminal state once it ends.
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// Wait for the active run to reach its terminal state.
    ///
    /// Returns `None` when no run has been started (or the last one was
    /// already waited on).
    pub async fn wait(&self) -> Option<RunState> {
        let run = self.active.lock().unwrap().take();
        match run {
            Some(run) => {
                let terminal = run.handle.await.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "run worker aborted");
                    RunState::Failed
                });
                // A cancel racing the worker's last store can leave the
                // cell on Stopping; the join result is authoritative.
                self.state.set(terminal);
                Some(terminal)
            }
            None => None,
        }
    }
}
