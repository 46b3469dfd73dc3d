//! Keystroke emission capability.
//!
//! The run engine never touches the OS input layer directly; it talks to an
//! [`Injector`]. Two variants exist: [`SimulatedInjector`] records what
//! would have been typed (and can echo it to the console), while
//! [`LiveInjector`] delegates to the platform's [`InputBackend`]. The
//! variant is chosen when the injector is constructed, not by a runtime
//! global, so tests always get the recording path.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::InputBackend;
use crate::cancel::CancellationToken;
use crate::error::Result;

/// Emits one message's keystrokes, plus the trailing Enter press.
///
/// `emit` must stay responsive to the token: when `char_delay` is non-zero
/// a cancellation mid-message stops after the current character rather
/// than finishing the message. Stopping early is not an error.
pub trait Injector: Send + Sync {
    /// Can this injector emit at all? Checked once before a run starts.
    fn ready(&self) -> bool;

    /// Type `message`, pacing characters by `char_delay`.
    fn emit(&self, message: &str, char_delay: Duration, token: &CancellationToken) -> Result<()>;

    /// Press the Enter key.
    fn press_enter(&self) -> Result<()>;
}

/// One recorded emission from a [`SimulatedInjector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// The characters actually typed for one message. Shorter than the
    /// job's message when the run was cancelled mid-emission.
    Typed(String),
    /// An Enter press.
    Enter,
}

/// Injector that records keystrokes instead of sending them.
///
/// Clones share the same event log, so a test can keep a handle while the
/// scheduler owns another.
#[derive(Clone, Default)]
pub struct SimulatedInjector {
    events: Arc<Mutex<Vec<SimEvent>>>,
    pacing_delays: Arc<AtomicUsize>,
    echo: bool,
}

impl SimulatedInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo each character (and `<ENTER>`) to stdout as it is "typed",
    /// for watching a simulated run from the terminal.
    pub fn with_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The messages recorded so far, without Enter markers.
    pub fn typed_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SimEvent::Typed(text) => Some(text),
                SimEvent::Enter => None,
            })
            .collect()
    }

    /// How many inter-character pacing delays have been applied.
    pub fn pacing_delays(&self) -> usize {
        self.pacing_delays.load(Ordering::Relaxed)
    }
}

impl Injector for SimulatedInjector {
    fn ready(&self) -> bool {
        true
    }

    fn emit(&self, message: &str, char_delay: Duration, token: &CancellationToken) -> Result<()> {
        let mut typed = String::new();
        for ch in message.chars() {
            if token.is_cancelled() {
                break;
            }
            typed.push(ch);
            if self.echo {
                print!("{ch}");
                let _ = std::io::stdout().flush();
            }
            if !char_delay.is_zero() {
                self.pacing_delays.fetch_add(1, Ordering::Relaxed);
                if token.sleep(char_delay) {
                    break;
                }
            }
        }
        if self.echo {
            println!();
        }
        self.events.lock().unwrap().push(SimEvent::Typed(typed));
        Ok(())
    }

    fn press_enter(&self) -> Result<()> {
        if self.echo {
            println!("<ENTER>");
        }
        self.events.lock().unwrap().push(SimEvent::Enter);
        Ok(())
    }
}

/// Injector that sends real keystrokes through an [`InputBackend`].
pub struct LiveInjector {
    backend: Box<dyn InputBackend>,
}

impl LiveInjector {
    pub fn new(backend: Box<dyn InputBackend>) -> Self {
        Self { backend }
    }

    /// Live injector over whatever backend this build carries.
    pub fn with_platform_backend() -> Self {
        Self::new(crate::backend::platform_backend())
    }
}

impl Injector for LiveInjector {
    fn ready(&self) -> bool {
        self.backend.available()
    }

    fn emit(&self, message: &str, char_delay: Duration, token: &CancellationToken) -> Result<()> {
        if char_delay.is_zero() {
            // Unpaced: hand the whole message to the backend in one call.
            return self.backend.type_text(message, Duration::ZERO);
        }

        // Paced: drive characters ourselves so cancellation lands between
        // keystrokes instead of after the whole message.
        let mut buf = [0u8; 4];
        for ch in message.chars() {
            if token.is_cancelled() {
                return Ok(());
            }
            if let Err(e) = self.backend.type_text(ch.encode_utf8(&mut buf), Duration::ZERO) {
                tracing::warn!(error = %e, "keystroke emission failed");
                return Err(e);
            }
            if token.sleep(char_delay) {
                return Ok(());
            }
        }
        Ok(())
    }

    fn press_enter(&self) -> Result<()> {
        self.backend.press_key("enter")
    }
}
