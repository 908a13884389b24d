//! Circuit representation and validation.
//!
//! This module provides the in-memory logic network built by the parser: the
//! [`Devices`] table, the closed set of [`DeviceKind`]s with their output
//! functions, and the checks a circuit must pass before it is simulated.

mod devices;
mod kind;
mod types;
mod validate;

pub use devices::{Device, Devices, PortNames};
pub use kind::DeviceKind;
pub use types::*;
pub use validate::{devices_without_inputs, unconnected_inputs};
