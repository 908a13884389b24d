//! Device table.
//!
//! Devices are kept in declaration order with a map from [`DeviceId`] to
//! position. Each device owns its input map (input port -> driving output, if
//! any), so the connection graph lives entirely in this table.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use super::kind::DeviceKind;
use super::types::{DeviceId, PortRef, Signal};
use crate::names::{NameId, Names};
use crate::{DEFAULT_CLOCK_HALF_PERIOD, MAX_INPUTS};

/// IDs of the port names every circuit shares.
#[derive(Debug, Clone)]
pub struct PortNames {
    /// `I1` through `I16`, in order
    pub inputs: Vec<NameId>,
    pub clk: NameId,
    pub data: NameId,
    pub set: NameId,
    pub clear: NameId,
    pub q: NameId,
    pub qbar: NameId,
}

impl PortNames {
    fn new(names: &mut Names) -> Self {
        let inputs = (1..=MAX_INPUTS)
            .map(|n| names.intern(&format!("I{}", n)))
            .collect();
        Self {
            inputs,
            clk: names.intern("CLK"),
            data: names.intern("DATA"),
            set: names.intern("SET"),
            clear: names.intern("CLEAR"),
            q: names.intern("Q"),
            qbar: names.intern("QBAR"),
        }
    }

    /// ID of the gate input `I<n>`, 1-indexed.
    pub fn input(&self, n: usize) -> Option<NameId> {
        n.checked_sub(1).and_then(|i| self.inputs.get(i)).copied()
    }
}

/// A circuit element.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub kind: DeviceKind,
    /// Input port -> driving output, `None` while unconnected
    pub inputs: BTreeMap<NameId, Option<PortRef>>,
    /// Output port -> current level (`None` key for single-output devices)
    pub outputs: BTreeMap<Option<NameId>, Signal>,
    /// SWITCH: level chosen by the user
    pub switch_state: Signal,
    /// CLOCK: cycles between toggles
    pub clock_half_period: u32,
    /// CLOCK: cycles since the last toggle
    pub clock_counter: u32,
    /// DTYPE: settled CLK level at the end of the previous cycle, or at
    /// power-on before the first cycle
    pub last_clock: Signal,
}

impl Device {
    fn new(id: DeviceId, kind: DeviceKind, ports: &PortNames) -> Self {
        let mut device = Self {
            id,
            kind,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            switch_state: Signal::Low,
            clock_half_period: DEFAULT_CLOCK_HALF_PERIOD,
            clock_counter: 0,
            last_clock: Signal::Low,
        };

        match kind {
            DeviceKind::Xor => {
                device.inputs.insert(ports.inputs[0], None);
                device.inputs.insert(ports.inputs[1], None);
            }
            DeviceKind::Not => {
                device.inputs.insert(ports.inputs[0], None);
            }
            DeviceKind::DType => {
                for port in [ports.clk, ports.data, ports.set, ports.clear] {
                    device.inputs.insert(port, None);
                }
            }
            _ => {}
        }

        if kind == DeviceKind::DType {
            device.outputs.insert(Some(ports.q), Signal::Low);
            device.outputs.insert(Some(ports.qbar), Signal::High);
        } else {
            device.outputs.insert(None, Signal::Low);
        }
        device
    }

    pub fn has_input(&self, port: NameId) -> bool {
        self.inputs.contains_key(&port)
    }

    pub fn has_output(&self, port: Option<NameId>) -> bool {
        self.outputs.contains_key(&port)
    }

    /// Return to the power-on state. Switches keep their chosen level.
    fn reset(&mut self, ports: &PortNames) {
        match self.kind {
            DeviceKind::Switch => {
                self.outputs.insert(None, self.switch_state);
            }
            DeviceKind::DType => {
                self.outputs.insert(Some(ports.q), Signal::Low);
                self.outputs.insert(Some(ports.qbar), Signal::High);
                self.last_clock = Signal::Low;
            }
            DeviceKind::Clock => {
                self.clock_counter = 0;
                self.outputs.insert(None, Signal::Low);
            }
            _ => {
                self.outputs.insert(None, Signal::Low);
            }
        }
    }
}

/// All devices of one circuit.
#[derive(Debug, Clone)]
pub struct Devices {
    devices: Vec<Device>,
    index: HashMap<DeviceId, usize>,
    ports: PortNames,
}

impl Devices {
    /// Create an empty table, interning the fixed port names.
    pub fn new(names: &mut Names) -> Self {
        Self {
            devices: Vec::new(),
            index: HashMap::new(),
            ports: PortNames::new(names),
        }
    }

    pub fn ports(&self) -> &PortNames {
        &self.ports
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.index.get(&id).map(|&idx| &self.devices[idx])
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.index.contains_key(&id)
    }

    /// Add a device with its fixed ports. Returns `false` if the ID is taken.
    pub fn make_device(&mut self, id: DeviceId, kind: DeviceKind) -> bool {
        if self.contains(id) {
            return false;
        }
        debug!("make_device: {} {}", id, kind);
        self.index.insert(id, self.devices.len());
        self.devices.push(Device::new(id, kind, &self.ports));
        true
    }

    /// Give a variable-input gate the ports `I1..I<count>`.
    ///
    /// Fails if the device is not such a gate, already has inputs, or
    /// `count` is outside `1..=MAX_INPUTS`.
    pub fn add_inputs(&mut self, id: DeviceId, count: usize) -> bool {
        if count == 0 || count > MAX_INPUTS {
            return false;
        }
        let ports: Vec<NameId> = self.ports.inputs[..count].to_vec();
        match self.get_mut(id) {
            Some(device) if device.kind.has_variable_inputs() && device.inputs.is_empty() => {
                device.inputs.extend(ports.into_iter().map(|port| (port, None)));
                true
            }
            _ => false,
        }
    }

    /// Set a switch's level. Returns `false` if `id` is not a switch.
    pub fn set_switch(&mut self, id: DeviceId, signal: Signal) -> bool {
        match self.get_mut(id) {
            Some(device) if device.kind == DeviceKind::Switch => {
                device.switch_state = signal;
                device.outputs.insert(None, signal);
                true
            }
            _ => false,
        }
    }

    /// Set a clock's half-period in cycles. Returns `false` if `id` is not a
    /// clock or the period is zero.
    pub fn set_clock_half_period(&mut self, id: DeviceId, half_period: u32) -> bool {
        if half_period == 0 {
            return false;
        }
        match self.get_mut(id) {
            Some(device) if device.kind == DeviceKind::Clock => {
                device.clock_half_period = half_period;
                device.clock_counter = 0;
                true
            }
            _ => false,
        }
    }

    /// Current level of an output, or `None` if there is no such output.
    pub fn output_signal(&self, id: DeviceId, port: Option<NameId>) -> Option<Signal> {
        self.get(id)?.outputs.get(&port).copied()
    }

    /// Level seen by an input: the driving output's level, or low while
    /// unconnected. `None` if there is no such input.
    pub fn input_signal(&self, id: DeviceId, port: NameId) -> Option<Signal> {
        let source = *self.get(id)?.inputs.get(&port)?;
        Some(self.driven_level(source))
    }

    /// IDs of all devices of `kind`, or of every device for `None`.
    pub fn find_devices(&self, kind: Option<DeviceKind>) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|d| kind.map_or(true, |k| d.kind == k))
            .map(|d| d.id)
            .collect()
    }

    /// Every output terminal, in declaration order.
    pub fn output_refs(&self) -> Vec<PortRef> {
        self.devices
            .iter()
            .flat_map(|d| d.outputs.keys().map(move |&port| PortRef::new(d.id, port)))
            .collect()
    }

    /// Display name of an output: `A`, or `B.Q` for a named port.
    pub fn signal_name(&self, names: &Names, id: DeviceId, port: Option<NameId>) -> Option<String> {
        let device = names.get_string(id)?;
        match port {
            None => Some(device.to_string()),
            Some(port) => Some(format!("{}.{}", device, names.get_string(port)?)),
        }
    }

    /// Return every device to its power-on state.
    pub fn reset(&mut self) {
        for device in &mut self.devices {
            device.reset(&self.ports);
        }
    }

    pub(crate) fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        let idx = *self.index.get(&id)?;
        Some(&mut self.devices[idx])
    }

    pub(crate) fn at(&self, idx: usize) -> &Device {
        &self.devices[idx]
    }

    pub(crate) fn at_mut(&mut self, idx: usize) -> &mut Device {
        &mut self.devices[idx]
    }

    /// Level seen at an input of the device at `idx`, low if absent.
    pub(crate) fn input_level_at(&self, idx: usize, port: NameId) -> Signal {
        match self.devices[idx].inputs.get(&port) {
            Some(&source) => self.driven_level(source),
            None => Signal::Low,
        }
    }

    /// Output of the gate at `idx` for its current input levels.
    pub(crate) fn gate_output_at(&self, idx: usize) -> Option<Signal> {
        let device = &self.devices[idx];
        let levels = device.inputs.values().map(|&source| self.driven_level(source));
        device.kind.evaluate(levels)
    }

    /// Store a new output level; returns whether it changed.
    pub(crate) fn set_output_at(&mut self, idx: usize, port: Option<NameId>, signal: Signal) -> bool {
        let previous = self.devices[idx].outputs.insert(port, signal);
        previous != Some(signal)
    }

    /// Advance every clock by one cycle.
    pub(crate) fn advance_clocks(&mut self) {
        for device in self.devices.iter_mut().filter(|d| d.kind == DeviceKind::Clock) {
            device.clock_counter += 1;
            if device.clock_counter >= device.clock_half_period {
                device.clock_counter = 0;
                let level = device.outputs.get(&None).copied().unwrap_or_default();
                device.outputs.insert(None, !level);
            }
        }
    }

    fn driven_level(&self, source: Option<PortRef>) -> Signal {
        source
            .and_then(|src| self.output_signal(src.device, src.port))
            .unwrap_or_default()
    }
}
