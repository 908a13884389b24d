//! # Logsim Core
//!
//! A cycle-based digital logic simulator driven by a small circuit
//! description language.
//!
//! This library provides:
//! - A scanner and recursive-descent parser for circuit descriptions that
//!   reports every error it finds, with line, column and a caret
//! - A device model for AND/NAND/OR/NOR/XOR/NOT gates, switches, clocks and
//!   edge-triggered D-type flip-flops
//! - A network engine that settles combinational logic to a fixed point and
//!   detects oscillation
//! - Monitors that record output levels cycle by cycle
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`names`] - Interned identifiers
//! - [`dsl`] - Scanner and parser for the circuit description language
//! - [`circuit`] - Device kinds, ports and the device table
//! - [`simulator`] - Network execution, monitors and the [`Simulator`] bundle
//! - [`error`] - Error and diagnostic types
//!
//! ## Usage
//!
//! ```
//! use logsim_core::{Signal, Simulator};
//!
//! let source = "
//!     devices { G is a NAND gate; G has 2 inputs; S1, S2 are SWITCH; }
//!     connections { device G { S1 to G.I1; S2 to G.I2; } }
//!     monitor { G; }
//! ";
//! let mut sim = Simulator::from_source(source)?;
//! sim.set_switch("S1", Signal::High)?;
//! sim.run(2)?;
//! assert_eq!(sim.display_signals(), "G : --\n");
//! # Ok::<(), logsim_core::LogsimError>(())
//! ```
//!
//! ## Simulation Method
//!
//! Each cycle first settles the logic so switch changes reach every gate,
//! then advances every clock and re-evaluates all gates in declaration order
//! until a full pass changes nothing. D-type flip-flops latch on a rising CLK
//! edge using the DATA/SET/CLEAR levels present at the start of the cycle,
//! after which the logic is settled again. A network
//! that does not settle within the configured number of passes fails the
//! cycle with [`LogsimError::Oscillation`].

pub mod circuit;
pub mod dsl;
pub mod error;
pub mod names;
pub mod simulator;

// Re-export main types for convenience
pub use circuit::{DeviceKind, Devices, PortRef, Signal};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, LogsimError, Result};
pub use names::{NameId, Names};
pub use simulator::{Monitors, Network, NetworkConfig, Simulator};

/// Maximum number of inputs on an AND/NAND/OR/NOR gate
pub const MAX_INPUTS: usize = 16;

/// Cycles between toggles of a clock with no `has cycle` statement
pub const DEFAULT_CLOCK_HALF_PERIOD: u32 = 1;

/// Most names a single `first => last` range may expand to
pub const MAX_RANGE_LEN: usize = 1024;
