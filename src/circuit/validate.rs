//! Circuit well-formedness checks.

use super::devices::Devices;
use super::types::DeviceId;
use crate::names::NameId;

/// Devices that need inputs but have none declared.
///
/// Sources (SWITCH, CLOCK) take no inputs. Every other kind must have at
/// least one before it can be simulated; only AND/OR/NAND/NOR can be left
/// without, since the others get their ports at creation.
pub fn devices_without_inputs(devices: &Devices) -> Vec<DeviceId> {
    devices
        .iter()
        .filter(|d| !d.kind.is_source() && d.inputs.is_empty())
        .map(|d| d.id)
        .collect()
}

/// Every `(device, input port)` pair that has no driver.
pub fn unconnected_inputs(devices: &Devices) -> Vec<(DeviceId, NameId)> {
    devices
        .iter()
        .flat_map(|d| {
            d.inputs
                .iter()
                .filter(|(_, source)| source.is_none())
                .map(move |(&port, _)| (d.id, port))
        })
        .collect()
}
