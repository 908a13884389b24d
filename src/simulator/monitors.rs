//! Monitor points and their recorded signal histories.

use log::debug;
use thiserror::Error;

use crate::circuit::{DeviceId, PortRef, Signal};
use crate::error::Result;
use crate::names::{NameId, Names};

use super::network::Network;

/// Why a monitor point was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorError {
    #[error("device does not exist")]
    DeviceAbsent,
    #[error("not an output")]
    NotOutput,
    #[error("output is already monitored")]
    MonitorPresent,
}

/// A monitored output and the level it had after each recorded cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorPoint {
    pub output: PortRef,
    pub history: Vec<Signal>,
}

/// Registry of monitored outputs, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Monitors {
    points: Vec<MonitorPoint>,
}

impl Monitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[MonitorPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Start recording output `port` of `device`.
    ///
    /// The new point's history starts empty, even if cycles have already
    /// been recorded for other points.
    pub fn make_monitor(
        &mut self,
        network: &Network,
        device: DeviceId,
        port: Option<NameId>,
    ) -> std::result::Result<(), MonitorError> {
        let Some(dev) = network.devices().get(device) else {
            return Err(MonitorError::DeviceAbsent);
        };
        if !dev.has_output(port) {
            return Err(MonitorError::NotOutput);
        }
        let output = PortRef::new(device, port);
        if self.points.iter().any(|p| p.output == output) {
            return Err(MonitorError::MonitorPresent);
        }
        debug!("make_monitor: {:?}", output);
        self.points.push(MonitorPoint {
            output,
            history: Vec::new(),
        });
        Ok(())
    }

    /// Stop recording an output. Returns `false` if it was not monitored.
    pub fn remove_monitor(&mut self, device: DeviceId, port: Option<NameId>) -> bool {
        let output = PortRef::new(device, port);
        let before = self.points.len();
        self.points.retain(|p| p.output != output);
        self.points.len() != before
    }

    /// Append the current level of every monitored output.
    pub fn record_signals(&mut self, network: &Network) {
        for point in &mut self.points {
            let level = network
                .get_output_signal(point.output.device, point.output.port)
                .unwrap_or_default();
            point.history.push(level);
        }
    }

    /// Clear every history, keeping the points registered.
    pub fn reset_monitors(&mut self) {
        for point in &mut self.points {
            point.history.clear();
        }
    }

    /// Recorded history of one output.
    pub fn history(&self, device: DeviceId, port: Option<NameId>) -> Option<&[Signal]> {
        let output = PortRef::new(device, port);
        self.points
            .iter()
            .find(|p| p.output == output)
            .map(|p| p.history.as_slice())
    }

    /// Display names of the monitored outputs, in registration order.
    pub fn get_signal_names(&self, names: &Names, network: &Network) -> Vec<String> {
        self.points
            .iter()
            .filter_map(|p| network.devices().signal_name(names, p.output.device, p.output.port))
            .collect()
    }

    /// Display names of every output not currently monitored.
    pub fn unmonitored_signal_names(&self, names: &Names, network: &Network) -> Vec<String> {
        network
            .devices()
            .output_refs()
            .into_iter()
            .filter(|output| !self.points.iter().any(|p| p.output == *output))
            .filter_map(|output| network.devices().signal_name(names, output.device, output.port))
            .collect()
    }

    /// One text trace per monitored output, `-` high and `_` low.
    pub fn display_signals(&self, names: &Names, network: &Network) -> String {
        let labels = self.get_signal_names(names, network);
        let margin = labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let mut out = String::new();
        for (label, point) in labels.iter().zip(&self.points) {
            let trace: String = point.history.iter().map(Signal::trace_char).collect();
            out.push_str(&format!("{:<margin$} : {}\n", label, trace, margin = margin));
        }
        out
    }

    /// Step the network and record `cycles` times.
    ///
    /// Stops at the first oscillating cycle; nothing is recorded for it.
    pub fn run_cycles(&mut self, network: &mut Network, cycles: usize) -> Result<()> {
        for _ in 0..cycles {
            network.execute_network()?;
            self.record_signals(network);
        }
        Ok(())
    }
}
