//! Global stop hotkey.
//!
//! While a live run is typing, the terminal does not have keyboard focus,
//! so ctrl-c cannot reach the process. A system-wide hotkey is the only
//! stop control that works from inside the target window; pressing it
//! fires a callback (the CLI wires this to [`crate::Scheduler::cancel`]).

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::cancel::CancellationToken;
use crate::error::{AutoTyperError, Result};

/// A registered system-wide stop hotkey.
pub struct StopHotkey {
    manager: GlobalHotKeyManager,
}

impl StopHotkey {
    /// Parse and register a combination like `"ctrl+alt+s"`.
    ///
    /// Modifiers are `ctrl`/`control`, `alt`, `shift`, and
    /// `meta`/`cmd`/`super`; the key part is a letter, digit, f-key, or
    /// one of `space`, `enter`, `tab`, `escape`.
    pub fn register(spec: &str) -> Result<Self> {
        let hotkey = parse_hotkey(spec)?;
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| AutoTyperError::hotkey(format!("failed to create hotkey manager: {e}")))?;
        manager
            .register(hotkey)
            .map_err(|e| AutoTyperError::hotkey(format!("failed to register '{spec}': {e}")))?;

        tracing::info!(hotkey = spec, "global stop hotkey registered");
        Ok(Self { manager })
    }

    /// Poll hotkey events on a blocking task, invoking `on_press` for each
    /// press. The task (and the registration) lives until `shutdown` is
    /// cancelled; leave it running forever and the runtime cannot shut
    /// down, since it joins blocking tasks on drop.
    pub fn spawn_listener<F>(self, shutdown: CancellationToken, on_press: F)
    where
        F: Fn() + Send + 'static,
    {
        let receiver = GlobalHotKeyEvent::receiver();
        tokio::task::spawn_blocking(move || {
            // Dropping the manager would unregister the hotkey.
            let _manager = self.manager;
            while !shutdown.is_cancelled() {
                if let Ok(event) = receiver.try_recv() {
                    if event.state == HotKeyState::Pressed {
                        tracing::info!("stop hotkey pressed");
                        on_press();
                    }
                }
                // Small sleep to prevent busy waiting
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        });
    }
}

fn parse_hotkey(spec: &str) -> Result<HotKey> {
    let binding = spec.to_lowercase();
    let mut modifiers = Modifiers::empty();
    let mut code = None;

    for part in binding.split('+').map(str::trim) {
        match part {
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" => modifiers |= Modifiers::SUPER,
            key => {
                if code.is_some() {
                    return Err(AutoTyperError::invalid_key(
                        spec,
                        "more than one non-modifier key",
                    ));
                }
                code = Some(parse_key_code(key)?);
            }
        }
    }

    match code {
        Some(code) => Ok(HotKey::new(Some(modifiers), code)),
        None => Err(AutoTyperError::invalid_key(spec, "no key specified")),
    }
}

fn parse_key_code(key: &str) -> Result<Code> {
    let code = match key {
        "space" => Code::Space,
        "enter" | "return" => Code::Enter,
        "tab" => Code::Tab,
        "escape" | "esc" => Code::Escape,
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        single if single.len() == 1 => match single.as_bytes()[0] {
            b'a' => Code::KeyA,
            b'b' => Code::KeyB,
            b'c' => Code::KeyC,
            b'd' => Code::KeyD,
            b'e' => Code::KeyE,
            b'f' => Code::KeyF,
            b'g' => Code::KeyG,
            b'h' => Code::KeyH,
            b'i' => Code::KeyI,
            b'j' => Code::KeyJ,
            b'k' => Code::KeyK,
            b'l' => Code::KeyL,
            b'm' => Code::KeyM,
            b'n' => Code::KeyN,
            b'o' => Code::KeyO,
            b'p' => Code::KeyP,
            b'q' => Code::KeyQ,
            b'r' => Code::KeyR,
            b's' => Code::KeyS,
            b't' => Code::KeyT,
            b'u' => Code::KeyU,
            b'v' => Code::KeyV,
            b'w' => Code::KeyW,
            b'x' => Code::KeyX,
            b'y' => Code::KeyY,
            b'z' => Code::KeyZ,
            b'0' => Code::Digit0,
            b'1' => Code::Digit1,
            b'2' => Code::Digit2,
            b'3' => Code::Digit3,
            b'4' => Code::Digit4,
            b'5' => Code::Digit5,
            b'6' => Code::Digit6,
            b'7' => Code::Digit7,
            b'8' => Code::Digit8,
            b'9' => Code::Digit9,
            _ => return Err(AutoTyperError::invalid_key(key, "unsupported key")),
        },
        other => return Err(AutoTyperError::invalid_key(other, "unsupported key")),
    };

    Ok(code)
}
