//! Channel definitions
//!
//! A channel is both the category a line is logged on and the threshold a
//! handle filters with. Ordinals grow from most verbose to silent; a line on
//! channel `c` passes threshold `t` when `t.ordinal() <= c.ordinal()`.

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Packet and payload traffic, the most voluminous channel
    Network = 0,
    /// Connection state: reads/writes (not contents), accept, close
    State = 1,
    /// Listens, serious errors; also gates the adaptive channel
    #[default]
    Always = 2,
    /// Threshold-only sentinel (level name `none`): nothing passes
    #[serde(rename = "none")]
    Silent = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Network,
        Channel::State,
        Channel::Always,
        Channel::Silent,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Channel::Network => "network",
            Channel::State => "state",
            Channel::Always => "always",
            Channel::Silent => "none",
        }
    }

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Map a stored ordinal back to a channel.
    ///
    /// Ordinals above the sentinel saturate to `Silent`, so any value read
    /// from a handle's threshold cell is a valid channel.
    #[inline]
    pub const fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => Channel::Network,
            1 => Channel::State,
            2 => Channel::Always,
            _ => Channel::Silent,
        }
    }

    /// Lenient level-name mapping used by `set_threshold`.
    ///
    /// Unrecognized names fall back to `Always`.
    pub fn from_level_name(name: &str) -> Self {
        match name {
            "network" => Channel::Network,
            "state" => Channel::State,
            "none" => Channel::Silent,
            _ => Channel::Always,
        }
    }

    /// Whether a line on `channel` passes when `self` is the threshold.
    #[inline]
    pub const fn permits(self, channel: Channel) -> bool {
        self.ordinal() <= channel.ordinal()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Channel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "network" => Ok(Channel::Network),
            "state" => Ok(Channel::State),
            "always" | "all" => Ok(Channel::Always),
            "none" => Ok(Channel::Silent),
            _ => Err(LoggerError::InvalidChannel(s.to_string())),
        }
    }
}
