//! Connections and cycle execution.

use log::{debug, trace, warn};
use thiserror::Error;

use crate::circuit::{unconnected_inputs, DeviceId, DeviceKind, Devices, PortRef, Signal};
use crate::error::{LogsimError, Result};
use crate::names::NameId;

use super::{DEFAULT_ITERATIONS_PER_DEVICE, DEFAULT_MIN_ITERATIONS};

/// Configuration for network execution.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Settle passes always allowed, however small the circuit.
    pub min_iterations: usize,
    /// Extra settle passes allowed per device.
    pub iterations_per_device: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            min_iterations: DEFAULT_MIN_ITERATIONS,
            iterations_per_device: DEFAULT_ITERATIONS_PER_DEVICE,
        }
    }
}

impl NetworkConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum number of settle passes.
    pub fn with_min_iterations(mut self, min_iterations: usize) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    /// Set the number of settle passes allowed per device.
    pub fn with_iterations_per_device(mut self, iterations_per_device: usize) -> Self {
        self.iterations_per_device = iterations_per_device;
        self
    }

    /// Settle passes allowed for a circuit of `device_count` devices.
    ///
    /// An acyclic network settles in at most one pass per device plus a
    /// final pass that sees no change.
    pub fn iteration_limit(&self, device_count: usize) -> usize {
        self.min_iterations
            .max(self.iterations_per_device.saturating_mul(device_count))
            .max(1)
    }
}

/// Why a connection was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("device does not exist")]
    DeviceAbsent,
    #[error("port does not exist")]
    PortAbsent,
    #[error("input is already connected")]
    InputConnected,
    #[error("an input cannot drive another input")]
    InputToInput,
}

/// The logic network: the device table plus the rules for stepping it.
#[derive(Debug, Clone)]
pub struct Network {
    devices: Devices,
    config: NetworkConfig,
}

impl Network {
    /// Create a network over `devices` with the default configuration.
    pub fn new(devices: Devices) -> Self {
        Self::with_config(devices, NetworkConfig::default())
    }

    pub fn with_config(devices: Devices, config: NetworkConfig) -> Self {
        Self { devices, config }
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices {
        &mut self.devices
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Drive input `input` of device `device` from output `source`.
    pub fn make_connection(
        &mut self,
        source: PortRef,
        device: DeviceId,
        input: NameId,
    ) -> std::result::Result<(), ConnectionError> {
        let (Some(src), Some(dst)) = (self.devices.get(source.device), self.devices.get(device)) else {
            return Err(ConnectionError::DeviceAbsent);
        };

        if let Some(port) = source.port {
            if src.has_input(port) {
                return Err(ConnectionError::InputToInput);
            }
        }
        if !src.has_output(source.port) {
            return Err(ConnectionError::PortAbsent);
        }

        match dst.inputs.get(&input) {
            None => return Err(ConnectionError::PortAbsent),
            Some(Some(_)) => return Err(ConnectionError::InputConnected),
            Some(None) => {}
        }

        if let Some(dst) = self.devices.get_mut(device) {
            dst.inputs.insert(input, Some(source));
        }
        debug!("make_connection: {:?} -> {}.{}", source, device, input);
        Ok(())
    }

    /// Every `(device, input port)` pair still without a driver.
    pub fn unconnected_inputs(&self) -> Vec<(DeviceId, NameId)> {
        unconnected_inputs(&self.devices)
    }

    /// True if every declared input is connected.
    pub fn check_network(&self) -> bool {
        self.unconnected_inputs().is_empty()
    }

    /// Level of an output, `None` if there is no such output.
    pub fn get_output_signal(&self, device: DeviceId, port: Option<NameId>) -> Option<Signal> {
        self.devices.output_signal(device, port)
    }

    /// Run one simulation cycle.
    ///
    /// D-types latch on a rising CLK edge using the DATA/SET/CLEAR levels
    /// present at the start of the cycle, after switch changes made since
    /// the last cycle have propagated. If the combinational logic does not
    /// settle, the cycle is abandoned with [`LogsimError::Oscillation`].
    pub fn execute_network(&mut self) -> Result<()> {
        let ports = self.devices.ports();
        let (clk, data, set, clear, q, qbar) =
            (ports.clk, ports.data, ports.set, ports.clear, ports.q, ports.qbar);

        self.settle()?;

        let snapshot: Vec<(usize, Signal, Signal, Signal)> = (0..self.devices.len())
            .filter(|&idx| self.devices.at(idx).kind == DeviceKind::DType)
            .map(|idx| {
                (
                    idx,
                    self.devices.input_level_at(idx, data),
                    self.devices.input_level_at(idx, set),
                    self.devices.input_level_at(idx, clear),
                )
            })
            .collect();

        self.devices.advance_clocks();
        self.settle()?;

        let mut latched = false;
        for (idx, data_level, set_level, clear_level) in snapshot {
            let clock = self.devices.input_level_at(idx, clk);
            if self.devices.at(idx).last_clock == Signal::Low && clock == Signal::High {
                let next = if set_level.is_high() {
                    Signal::High
                } else if clear_level.is_high() {
                    Signal::Low
                } else {
                    data_level
                };
                trace!("dtype {} latched {}", self.devices.at(idx).id, next);
                latched |= self.devices.set_output_at(idx, Some(q), next);
                latched |= self.devices.set_output_at(idx, Some(qbar), !next);
            }
        }
        if latched {
            self.settle()?;
        }

        self.remember_clocks();
        Ok(())
    }

    /// Settle the logic and take each D-type's settled CLK level as its
    /// previous level, so the next cycle only latches on a real rising edge.
    ///
    /// A network that oscillates is left unsettled; the next cycle reports it.
    pub fn power_on(&mut self) {
        if self.settle().is_err() {
            debug!("power_on: network left unsettled");
        }
        self.remember_clocks();
    }

    /// Return every device to its power-on state. Switches keep their level.
    pub fn reset(&mut self) {
        self.devices.reset();
        self.power_on();
    }

    fn remember_clocks(&mut self) {
        let clk = self.devices.ports().clk;
        for idx in 0..self.devices.len() {
            if self.devices.at(idx).kind == DeviceKind::DType {
                let clock = self.devices.input_level_at(idx, clk);
                self.devices.at_mut(idx).last_clock = clock;
            }
        }
    }

    /// Re-evaluate gates until a full pass changes nothing.
    fn settle(&mut self) -> Result<()> {
        let limit = self.config.iteration_limit(self.devices.len());
        for _ in 0..limit {
            let mut changed = false;
            for idx in 0..self.devices.len() {
                if let Some(level) = self.devices.gate_output_at(idx) {
                    changed |= self.devices.set_output_at(idx, None, level);
                }
            }
            if !changed {
                return Ok(());
            }
        }
        warn!("network did not settle after {} iterations", limit);
        Err(LogsimError::Oscillation { iterations: limit })
    }
}
