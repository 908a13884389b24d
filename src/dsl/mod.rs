//! Front end for the circuit description language.
//!
//! A description is a sequence of braced sections. Statements end with `;`,
//! newlines are plain whitespace, and identifiers are case-sensitive while
//! section headings are not.
//!
//! # Grammar Overview
//!
//! ```text
//! circuit     = section* EOF
//! section     = heading '{' body '}'
//! heading     = "devices" | "connections" | "monitor" | "init"
//!
//! device_stmt = name_list ("is" | "are") device_type ';'
//!             | name_list ("has" | "have") NUMBER ';'
//!             | name_list ("has" | "have") "cycle" NUMBER ';'
//!             | name_list "set" ["to"] ("0" | "1") ';'
//! name_list   = NAME {',' NAME} | NAME "=>" NAME
//! device_type = "AND" | "NAND" | "OR" | "NOR" | "XOR" | "NOT"
//!             | "SWITCH" | "CLOCK" | "DTYPE" | "D-TYPE"
//!
//! block       = "device" NAME '{' connection* '}'
//! connection  = output "to" NAME '.' PORT ';'
//! output      = NAME ['.' PORT]
//!
//! monitor_stmt = ["trace"] output {',' output} ';'
//! ```
//!
//! `devices` must come first and `connections` is mandatory. The `init`
//! section only accepts `set` and `has cycle` statements.
//!
//! Filler words (`a`, `an`, `gate`, `gates`, `some`, `input`, `inputs`,
//! `initially`, `connected`) are dropped by the scanner so statements can
//! read like English. Comments run from `#` to the end of the line, or
//! between a pair of `//` markers.
//!
//! # Example
//!
//! ```text
//! devices {
//!   G is a NAND gate;
//!   G has 2 inputs;
//!   S1, S2 are SWITCH;
//!   S1 set 1;
//! }
//! connections {
//!   device G {
//!     S1 to G.I1;
//!     S2 to G.I2;
//!   }
//! }
//! monitor {
//!   G;
//! }
//! ```

mod keywords;
mod parser;
mod scanner;

pub use keywords::{is_filler, Heading, Keyword, FILLER_WORDS};
pub use parser::{expand_range, Anchor, Parser, RangeError};
pub use scanner::{NameMode, Scanner, Source, Symbol, SymbolKind};

use std::path::Path;

use log::info;

use crate::circuit::Devices;
use crate::error::{LogsimError, Result};
use crate::names::Names;
use crate::simulator::{Monitors, Network, NetworkConfig};

/// Everything built from one error-free description.
#[derive(Debug, Clone)]
pub struct LoadedCircuit {
    pub names: Names,
    pub network: Network,
    pub monitors: Monitors,
}

/// Parse a circuit description string.
pub fn parse_str(text: &str) -> Result<LoadedCircuit> {
    parse_scanner(Scanner::new(text), NetworkConfig::default())
}

/// Parse a circuit description file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<LoadedCircuit> {
    parse_scanner(Scanner::from_file(path)?, NetworkConfig::default())
}

/// Parse from a prepared scanner into fresh tables.
///
/// Any reported error discards the partly built circuit and comes back as
/// [`LogsimError::InvalidCircuit`] carrying every diagnostic. A circuit
/// that parses cleanly is powered on before it is returned.
pub fn parse_scanner(scanner: Scanner, config: NetworkConfig) -> Result<LoadedCircuit> {
    let mut names = Names::new();
    let devices = Devices::new(&mut names);
    let mut network = Network::with_config(devices, config);
    let mut monitors = Monitors::new();

    let mut parser = Parser::new(&mut names, &mut network, &mut monitors, scanner);
    let ok = parser.parse_network();
    let diagnostics = parser.into_diagnostics();
    if !ok {
        return Err(LogsimError::InvalidCircuit(diagnostics));
    }
    network.power_on();

    info!(
        "loaded circuit: {} device(s), {} monitor(s)",
        network.devices().len(),
        monitors.len()
    );
    Ok(LoadedCircuit {
        names,
        network,
        monitors,
    })
}
