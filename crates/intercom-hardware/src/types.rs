//! Signal levels, edges and the default pin assignment.

use std::fmt;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// Transition observed on an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Rising,
    Falling,
}

/// BCM pin numbers of the intercom board.
///
/// The call button is watched for falling edges (pulled up, pressed to
/// ground); the door sensor for rising edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    pub call_button: u8,
    pub door_strike: u8,
    pub door_feedback: u8,
    pub green_light: u8,
    pub red_light: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            call_button: 27,
            door_strike: 17,
            door_feedback: 4,
            green_light: 23,
            red_light: 24,
        }
    }
}
