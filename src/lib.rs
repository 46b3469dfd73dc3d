//! # Auto Typer
//!
//! A command-line tool and library for typing a fixed message into
//! whatever window holds keyboard focus, repeatedly, at configurable
//! intervals.
//!
//! ## Features
//!
//! - Character-by-character pacing and inter-message delays
//! - Optional symmetric random jitter on the inter-message delay
//! - Pre-start countdown so the target window can be focused
//! - Bounded or unbounded repetition
//! - Cooperative cancellation with bounded stop latency at every stage
//! - Simulated mode that records keystrokes instead of sending them
//! - Global stop hotkey that works while another window has focus
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use auto_typer::{Job, NullSink, Scheduler, SimulatedInjector};
//!
//! # async fn demo() {
//! let injector = SimulatedInjector::new();
//! let scheduler = Scheduler::new(Arc::new(injector.clone()), Arc::new(NullSink));
//!
//! let job = Job {
//!     message: "Hello from auto-typer!".to_string(),
//!     simulate: true,
//!     ..Job::default()
//! };
//!
//! scheduler.start(job).unwrap();
//! scheduler.wait().await;
//! println!("{:?}", injector.typed_messages());
//! # }
//! ```
//!
//! ## Job files
//!
//! Jobs can be kept as JSON:
//!
//! ```json
//! {
//!   "message": "Hello from auto-typer!",
//!   "char_delay": "30ms",
//!   "message_delay": "1500ms",
//!   "jitter": "250ms",
//!   "repeat_count": 10,
//!   "countdown": "5s"
//! }
//! ```

pub mod backend;
pub mod cancel;
pub mod error;
pub mod hotkey;
pub mod injector;
pub mod jitter;
pub mod job;
pub mod scheduler;

pub use backend::InputBackend;
pub use cancel::{CancellationToken, POLL_INTERVAL};
pub use error::{AutoTyperError, Result};
pub use hotkey::StopHotkey;
pub use injector::{Injector, LiveInjector, SimEvent, SimulatedInjector};
pub use jitter::{jittered_delay, FixedJitter, JitterSource, UniformJitter};
pub use job::Job;
pub use scheduler::{run_job, NullSink, RunState, Scheduler, Status, StatusSink};
