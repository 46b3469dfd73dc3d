//! Job configuration.
//!
//! A [`Job`] describes one typing run: the message, its pacing, how often
//! it repeats, and whether keystrokes are real or simulated. Jobs are plain
//! data, immutable once handed to the scheduler, and serializable to JSON
//! so runs can be kept in job files:
//!
//! ```json
//! {
//!   "message": "Hello from auto-typer!",
//!   "char_delay": "30ms",
//!   "message_delay": "1500ms",
//!   "jitter": "250ms",
//!   "press_enter": true,
//!   "repeat_count": 10,
//!   "countdown": "5s",
//!   "simulate": false
//! }
//! ```
//!
//! Duration fields accept `ms`, `s`, and `m` suffixes (case-insensitive);
//! a bare number means milliseconds.

use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AutoTyperError, Result};

/// Configuration for one typing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Text to type. Must be non-empty after trimming whitespace.
    pub message: String,

    /// Pause between characters while typing one message.
    #[serde(default = "default_char_delay", with = "duration_str")]
    pub char_delay: Duration,

    /// Pause between finished messages.
    #[serde(default = "default_message_delay", with = "duration_str")]
    pub message_delay: Duration,

    /// Symmetric random range applied to `message_delay`, if any.
    #[serde(default, with = "opt_duration_str", skip_serializing_if = "Option::is_none")]
    pub jitter: Option<Duration>,

    /// Press Enter after each message.
    #[serde(default = "default_press_enter")]
    pub press_enter: bool,

    /// How many messages to type. 0 means repeat until stopped.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Grace period before the first message, so the user can focus the
    /// target window.
    #[serde(default = "default_countdown", with = "duration_str")]
    pub countdown: Duration,

    /// Record keystrokes instead of sending them.
    #[serde(default)]
    pub simulate: bool,
}

fn default_char_delay() -> Duration {
    Duration::from_millis(30)
}

fn default_message_delay() -> Duration {
    Duration::from_millis(1500)
}

fn default_press_enter() -> bool {
    true
}

fn default_repeat_count() -> u32 {
    10
}

fn default_countdown() -> Duration {
    Duration::from_secs(5)
}

impl Default for Job {
    fn default() -> Self {
        Self {
            message: String::new(),
            char_delay: default_char_delay(),
            message_delay: default_message_delay(),
            jitter: None,
            press_enter: default_press_enter(),
            repeat_count: default_repeat_count(),
            countdown: default_countdown(),
            simulate: false,
        }
    }
}

impl Job {
    /// Validate the job before starting a run.
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(AutoTyperError::EmptyMessage);
        }
        Ok(())
    }

    /// Load a job from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AutoTyperError::config_load(path, e.to_string()))?;
        serde_json::from_str(&contents)
            .map_err(|e| AutoTyperError::config_load(path, e.to_string()))
    }

    /// Save the job to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AutoTyperError::config_save(path, e.to_string()))?;
        fs::write(path, contents).map_err(|e| AutoTyperError::config_save(path, e.to_string()))
    }
}

/// Parse a duration string like `"500ms"`, `"1.5s"`, or `"2m"`.
///
/// Bare numbers are milliseconds. Whitespace and case are ignored.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AutoTyperError::invalid_duration(value, "empty string"));
    }

    let (digits, millis_per_unit) = if let Some(rest) = normalized.strip_suffix("ms") {
        (rest, 1.0)
    } else if let Some(rest) = normalized.strip_suffix('s') {
        (rest, 1000.0)
    } else if let Some(rest) = normalized.strip_suffix('m') {
        (rest, 60_000.0)
    } else {
        (normalized.as_str(), 1.0)
    };

    let number: f64 = digits
        .trim()
        .parse()
        .map_err(|_| AutoTyperError::invalid_duration(value, "expected a number"))?;
    if !number.is_finite() || number < 0.0 {
        return Err(AutoTyperError::invalid_duration(
            value,
            "must be a finite, non-negative number",
        ));
    }

    Ok(Duration::from_secs_f64(number * millis_per_unit / 1000.0))
}

/// Render a duration in the most compact suffix form `parse_duration`
/// understands.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis > 0 && millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}

mod duration_str {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod opt_duration_str {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
