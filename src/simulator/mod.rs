//! Cycle-based simulation engine.
//!
//! One simulation cycle runs in these phases:
//!
//! ```text
//! settle -> sample D-type inputs -> advance clocks -> settle -> latch D-types on rising CLK
//! ```
//!
//! A freshly loaded or reset network is powered on first: it is settled once
//! and each D-type remembers its CLK level, so a CLK that starts high is not
//! taken for a rising edge.
//!
//! Settling is a fixed-point iteration: every gate is re-evaluated from the
//! current levels of its drivers, in declaration order, until a full pass
//! changes no output. A pass count bound turns a feedback loop that never
//! settles into an [`Oscillation`](crate::error::LogsimError::Oscillation)
//! error instead of a hang.
//!
//! [`Monitors`] sample chosen outputs after each successful cycle, and
//! [`Simulator`] bundles a parsed circuit with its monitors.

mod monitors;
mod network;
#[allow(clippy::module_inception)]
mod simulator;

pub use monitors::{MonitorError, MonitorPoint, Monitors};
pub use network::{ConnectionError, Network, NetworkConfig};
pub use simulator::Simulator;

/// Settle passes allowed even for the smallest circuit.
pub const DEFAULT_MIN_ITERATIONS: usize = 20;

/// Settle passes allowed per device.
pub const DEFAULT_ITERATIONS_PER_DEVICE: usize = 2;
