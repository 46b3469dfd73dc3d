//! Platform input-injection boundary.
//!
//! [`InputBackend`] is the seam between the injector and the OS: "type this
//! text with this inter-character interval" and "press this named key".
//! Windows is implemented via `SendInput` Unicode events, which reach
//! whatever window currently holds keyboard focus. Other platforms report
//! themselves unavailable so live runs fail fast at start instead of
//! half-way through.

use std::time::Duration;

use crate::error::Result;

/// Low-level keystroke synthesis.
pub trait InputBackend: Send + Sync {
    /// Is input injection usable on this system right now?
    fn available(&self) -> bool;

    /// Type `text` into the focused window, sleeping `interval` between
    /// characters when it is non-zero. Not interruptible; callers that
    /// need cancellation between characters pass one character at a time.
    fn type_text(&self, text: &str, interval: Duration) -> Result<()>;

    /// Press and release a named key (`"enter"`, `"tab"`, ...).
    fn press_key(&self, key: &str) -> Result<()>;
}

/// The backend compiled into this build.
pub fn platform_backend() -> Box<dyn InputBackend> {
    #[cfg(windows)]
    {
        Box::new(windows::SendInputBackend)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnavailableBackend)
    }
}

/// Placeholder backend for platforms without an implementation yet.
#[cfg(not(windows))]
struct UnavailableBackend;

#[cfg(not(windows))]
impl InputBackend for UnavailableBackend {
    fn available(&self) -> bool {
        false
    }

    fn type_text(&self, _text: &str, _interval: Duration) -> Result<()> {
        Err(crate::error::AutoTyperError::unsupported_platform(
            "input injection is only implemented on Windows",
        ))
    }

    fn press_key(&self, _key: &str) -> Result<()> {
        Err(crate::error::AutoTyperError::unsupported_platform(
            "input injection is only implemented on Windows",
        ))
    }
}

#[cfg(windows)]
mod windows {
    use super::InputBackend;
    use crate::error::{AutoTyperError, Result};
    use std::mem;
    use std::thread;
    use std::time::Duration;
    use winapi::um::winuser::{
        SendInput, INPUT, INPUT_KEYBOARD, KEYEVENTF_KEYUP, KEYEVENTF_UNICODE, VK_BACK, VK_ESCAPE,
        VK_RETURN, VK_SPACE, VK_TAB,
    };

    pub(super) struct SendInputBackend;

    impl InputBackend for SendInputBackend {
        fn available(&self) -> bool {
            true
        }

        fn type_text(&self, text: &str, interval: Duration) -> Result<()> {
            let mut first = true;
            for ch in text.chars() {
                if !first && !interval.is_zero() {
                    thread::sleep(interval);
                }
                first = false;
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    send_unicode(*unit)?;
                }
            }
            Ok(())
        }

        fn press_key(&self, key: &str) -> Result<()> {
            let vk = match key.to_lowercase().as_str() {
                "enter" | "return" => VK_RETURN,
                "tab" => VK_TAB,
                "space" => VK_SPACE,
                "escape" | "esc" => VK_ESCAPE,
                "backspace" => VK_BACK,
                other => {
                    return Err(AutoTyperError::invalid_key(
                        other,
                        "no virtual-key mapping",
                    ))
                }
            };
            send_virtual_key(vk as u16)
        }
    }

    /// Send one UTF-16 unit as a down/up `KEYEVENTF_UNICODE` pair.
    fn send_unicode(unit: u16) -> Result<()> {
        unsafe {
            let mut inputs: [INPUT; 2] = mem::zeroed();
            for (index, input) in inputs.iter_mut().enumerate() {
                input.type_ = INPUT_KEYBOARD;
                let ki = input.u.ki_mut();
                ki.wVk = 0;
                ki.wScan = unit;
                ki.dwFlags = if index == 0 {
                    KEYEVENTF_UNICODE
                } else {
                    KEYEVENTF_UNICODE | KEYEVENTF_KEYUP
                };
            }
            dispatch(&mut inputs)
        }
    }

    /// Press and release a virtual key.
    fn send_virtual_key(vk: u16) -> Result<()> {
        unsafe {
            let mut inputs: [INPUT; 2] = mem::zeroed();
            for (index, input) in inputs.iter_mut().enumerate() {
                input.type_ = INPUT_KEYBOARD;
                let ki = input.u.ki_mut();
                ki.wVk = vk;
                ki.dwFlags = if index == 0 { 0 } else { KEYEVENTF_KEYUP };
            }
            dispatch(&mut inputs)
        }
    }

    unsafe fn dispatch(inputs: &mut [INPUT; 2]) -> Result<()> {
        let sent = SendInput(
            inputs.len() as u32,
            inputs.as_mut_ptr(),
            mem::size_of::<INPUT>() as i32,
        );
        if sent != inputs.len() as u32 {
            return Err(AutoTyperError::emission(format!(
                "SendInput delivered {sent}/{} events: {}",
                inputs.len(),
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }
}
