//! Commands the host can send to a device

use crate::telemetry::{CONFIG, CONFIG_POWER_UP_DEFAULT, CONFIG_SLEEP_MASK};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Put the fuel gauge into its low-power sleep mode
    Sleep,
    /// Clear the sleep bit again
    Wake,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Sleep => "sleep",
            Command::Wake => "wake",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sleep" | "sleep_mode" => Some(Command::Sleep),
            "wake" => Some(Command::Wake),
            _ => None,
        }
    }

    /// Register and value written to carry out the command
    pub fn register_write(&self) -> (u8, u16) {
        match self {
            Command::Sleep => (CONFIG, CONFIG_POWER_UP_DEFAULT | CONFIG_SLEEP_MASK),
            Command::Wake => (CONFIG, CONFIG_POWER_UP_DEFAULT),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
