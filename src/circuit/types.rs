//! Core types for circuit representation.

use std::fmt;
use std::ops::Not;

use crate::names::NameId;

/// Devices are identified by the ID of their name.
pub type DeviceId = NameId;

/// A logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    #[default]
    Low,
    High,
}

impl Signal {
    pub fn is_high(&self) -> bool {
        *self == Signal::High
    }

    /// Trace character used by text displays.
    pub fn trace_char(&self) -> char {
        match self {
            Signal::Low => '_',
            Signal::High => '-',
        }
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        if value {
            Signal::High
        } else {
            Signal::Low
        }
    }
}

impl From<Signal> for bool {
    fn from(signal: Signal) -> Self {
        signal.is_high()
    }
}

impl Not for Signal {
    type Output = Signal;

    fn not(self) -> Signal {
        match self {
            Signal::Low => Signal::High,
            Signal::High => Signal::Low,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Low => write!(f, "0"),
            Signal::High => write!(f, "1"),
        }
    }
}

/// An output terminal: a device plus its output port.
/// Single-output devices use `port: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub device: DeviceId,
    pub port: Option<NameId>,
}

impl PortRef {
    pub fn new(device: DeviceId, port: Option<NameId>) -> Self {
        Self { device, port }
    }
}
