//! Main simulator interface.

use std::path::Path;

use log::{debug, info};

use crate::circuit::{DeviceKind, PortRef, Signal};
use crate::dsl::{self, LoadedCircuit, Scanner};
use crate::error::{LogsimError, Result};
use crate::names::Names;

use super::monitors::Monitors;
use super::network::{Network, NetworkConfig};

/// A loaded circuit together with its monitors and cycle count.
///
/// Loading always builds fresh tables, so a failed reload leaves any
/// previously loaded simulator untouched.
#[derive(Debug, Clone)]
pub struct Simulator {
    names: Names,
    network: Network,
    monitors: Monitors,
    /// Cycles run since load or the last reset
    cycles: usize,
}

impl Simulator {
    /// Load a circuit from description text with the default configuration.
    pub fn from_source(text: &str) -> Result<Self> {
        Self::with_config(text, NetworkConfig::default())
    }

    /// Load a circuit from description text with a custom configuration.
    pub fn with_config(text: &str, config: NetworkConfig) -> Result<Self> {
        dsl::parse_scanner(Scanner::new(text), config).map(Self::from_circuit)
    }

    /// Load a circuit from a description file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("loading circuit from {}", path.display());
        dsl::parse_file(path).map(Self::from_circuit)
    }

    pub fn from_circuit(circuit: LoadedCircuit) -> Self {
        Self {
            names: circuit.names,
            network: circuit.network,
            monitors: circuit.monitors,
            cycles: 0,
        }
    }

    pub fn names(&self) -> &Names {
        &self.names
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    /// Number of successful cycles since load or the last reset.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    /// Run one cycle and record every monitor.
    ///
    /// An oscillating cycle records nothing and does not count.
    pub fn step(&mut self) -> Result<()> {
        self.network.execute_network()?;
        self.monitors.record_signals(&self.network);
        self.cycles += 1;
        Ok(())
    }

    /// Run `cycles` cycles, stopping at the first that oscillates.
    pub fn run(&mut self, cycles: usize) -> Result<()> {
        for _ in 0..cycles {
            self.step()?;
        }
        debug!("ran {} cycle(s), {} in total", cycles, self.cycles);
        Ok(())
    }

    /// Rewind to time zero. Switch levels and monitor points are kept.
    pub fn reset(&mut self) {
        self.network.reset();
        self.monitors.reset_monitors();
        self.cycles = 0;
    }

    /// Set a switch by name between cycles.
    pub fn set_switch(&mut self, name: &str, level: Signal) -> Result<()> {
        let id = self
            .names
            .query(name)
            .filter(|&id| self.network.devices().contains(id))
            .ok_or_else(|| LogsimError::device_absent(name))?;
        if !self.network.devices_mut().set_switch(id, level) {
            return Err(LogsimError::NotASwitch {
                device: name.to_string(),
            });
        }
        debug!("switch {} set to {}", name, level);
        Ok(())
    }

    /// Every switch name, in declaration order.
    pub fn switch_names(&self) -> Vec<String> {
        self.network
            .devices()
            .find_devices(Some(DeviceKind::Switch))
            .into_iter()
            .filter_map(|id| self.names.get_string(id).map(str::to_string))
            .collect()
    }

    /// Resolve `A` or `A.Q` to an existing output.
    pub fn resolve_signal(&self, signal: &str) -> Option<PortRef> {
        let (device, port) = match signal.split_once('.') {
            Some((device, port)) => (device, Some(port)),
            None => (signal, None),
        };
        let device = self.names.query(device)?;
        let port = match port {
            Some(port) => Some(self.names.query(port)?),
            None => None,
        };
        self.network
            .devices()
            .get(device)
            .filter(|d| d.has_output(port))
            .map(|_| PortRef::new(device, port))
    }

    /// Start monitoring an output between cycles.
    pub fn add_monitor(&mut self, signal: &str) -> Result<()> {
        let output = self.resolve_signal(signal).ok_or_else(|| LogsimError::UnknownSignal {
            signal: signal.to_string(),
        })?;
        self.monitors
            .make_monitor(&self.network, output.device, output.port)
            .map_err(|source| LogsimError::MonitorRefused {
                signal: signal.to_string(),
                source,
            })
    }

    /// Stop monitoring an output. Returns `false` if it was not monitored.
    pub fn remove_monitor(&mut self, signal: &str) -> Result<bool> {
        let output = self.resolve_signal(signal).ok_or_else(|| LogsimError::UnknownSignal {
            signal: signal.to_string(),
        })?;
        Ok(self.monitors.remove_monitor(output.device, output.port))
    }

    /// Display names of the monitored outputs.
    pub fn signal_names(&self) -> Vec<String> {
        self.monitors.get_signal_names(&self.names, &self.network)
    }

    /// Display names of the outputs not yet monitored.
    pub fn unmonitored_signal_names(&self) -> Vec<String> {
        self.monitors.unmonitored_signal_names(&self.names, &self.network)
    }

    /// Recorded history of a monitored output.
    pub fn trace(&self, signal: &str) -> Result<&[Signal]> {
        self.resolve_signal(signal)
            .and_then(|output| self.monitors.history(output.device, output.port))
            .ok_or_else(|| LogsimError::UnknownSignal {
                signal: signal.to_string(),
            })
    }

    /// Text traces of every monitored output.
    pub fn display_signals(&self) -> String {
        self.monitors.display_signals(&self.names, &self.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTER: &str = "
        devices {
          CK is CLOCK;
          D1 is DTYPE;
          Z is SWITCH;
        }
        connections {
          device D1 {
            CK to D1.CLK;
            D1.QBAR to D1.DATA;
            Z to D1.SET;
            Z to D1.CLEAR;
          }
        }
        monitor { CK, D1.Q; }
    ";

    #[test]
    fn test_divide_by_two() {
        let mut sim = Simulator::from_source(COUNTER).unwrap();
        sim.run(8).unwrap();
        assert_eq!(sim.cycles(), 8);
        assert_eq!(sim.display_signals(), "CK   : -_-_-_-_\nD1.Q : --__--__\n");
    }

    #[test]
    fn test_reset_rewinds() {
        let mut sim = Simulator::from_source(COUNTER).unwrap();
        sim.run(3).unwrap();
        sim.reset();
        assert_eq!(sim.cycles(), 0);
        assert_eq!(sim.trace("D1.Q").unwrap(), &[] as &[Signal]);

        sim.run(2).unwrap();
        assert_eq!(sim.trace("CK").unwrap(), &[Signal::High, Signal::Low]);
    }

    #[test]
    fn test_set_switch_by_name() {
        let mut sim = Simulator::from_source(COUNTER).unwrap();
        sim.set_switch("Z", Signal::High).unwrap();
        assert!(matches!(
            sim.set_switch("CK", Signal::High),
            Err(LogsimError::NotASwitch { .. })
        ));
        assert!(matches!(
            sim.set_switch("NOPE", Signal::High),
            Err(LogsimError::DeviceAbsent { .. })
        ));
        assert!(matches!(
            sim.set_switch("Q", Signal::High),
            Err(LogsimError::DeviceAbsent { .. })
        ));
        assert_eq!(sim.switch_names(), vec!["Z"]);
    }

    #[test]
    fn test_runtime_monitors() {
        let mut sim = Simulator::from_source(COUNTER).unwrap();
        sim.run(2).unwrap();
        assert_eq!(sim.unmonitored_signal_names(), vec!["D1.QBAR", "Z"]);

        sim.add_monitor("D1.QBAR").unwrap();
        assert!(matches!(
            sim.add_monitor("D1.QBAR"),
            Err(LogsimError::MonitorRefused { .. })
        ));
        assert!(matches!(sim.add_monitor("D1"), Err(LogsimError::UnknownSignal { .. })));

        sim.step().unwrap();
        assert_eq!(sim.trace("D1.QBAR").unwrap().len(), 1);
        assert_eq!(sim.trace("D1.Q").unwrap().len(), 3);

        assert!(sim.remove_monitor("CK").unwrap());
        assert_eq!(sim.signal_names(), vec!["D1.Q", "D1.QBAR"]);
        assert!(matches!(sim.trace("Z"), Err(LogsimError::UnknownSignal { .. })));
    }

    #[test]
    fn test_invalid_source_reports_all_errors() {
        let err = Simulator::from_source("devices { A is NAND; } connections { }").unwrap_err();
        match err {
            LogsimError::InvalidCircuit(diagnostics) => assert_eq!(diagnostics.len(), 1),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_oscillation_surfaces() {
        let source = "
            devices { N is NOT; }
            connections { device N { N to N.I1; } }
            monitor { N; }
        ";
        let config = NetworkConfig::new().with_min_iterations(8);
        let mut sim = Simulator::with_config(source, config).unwrap();
        let err = sim.run(3).unwrap_err();
        assert!(matches!(err, LogsimError::Oscillation { iterations: 8 }));
        assert_eq!(sim.cycles(), 0);
        assert!(sim.trace("N").unwrap().is_empty());
    }
}
