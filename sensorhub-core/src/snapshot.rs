//! Read-only diagnostics snapshot of the registry
//!
//! A [`RegistrySnapshot`] is an owned copy of every attribute in the
//! registry tree at one point in time. Taking one never mutates the
//! registry. `Display` renders the indented dump used by
//! [`SensorRegistry::log_dump`](crate::SensorRegistry::log_dump):
//!
//! ```text
//! ACC
//!   [0] bmi320 (bosch) dev#0 axis [1, 2, 3]
//!     listener#0 req 120 Hz -> 200 Hz
//!     listener#1 req 400 Hz -> 400 Hz
//!     odr 200 Hz x1 (code 9)
//!     odr 400 Hz x1 (code 10)
//! GYR
//! ...
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::attr::SensorAttr;
use crate::axis::AxisMap;
use crate::odr::Odr;
use crate::registry::SensorRegistry;
use crate::sensor::{Device, DeviceId, ListenerId, SensorType};
use crate::suid::Suid;

/// Whole registry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegistrySnapshot {
    /// Sensor types in registration order
    pub sensors: Vec<SensorSnapshot>,
}

/// One sensor type and its devices
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SensorSnapshot {
    /// Sensor type
    pub sensor_type: SensorType,
    /// Devices in registration order
    pub devices: Vec<DeviceSnapshot>,
}

/// One device with its listeners and active rates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceSnapshot {
    /// Registry handle
    pub id: DeviceId,
    /// Index within the sensor type
    pub idx: u8,
    /// Display name
    pub name: String,
    /// Vendor name
    pub vendor: String,
    /// Sensor unique identifier
    pub suid: Option<Suid>,
    /// Attribute set in insertion order
    pub attrs: Vec<SensorAttr>,
    /// Axis remapping
    pub axis_map: AxisMap,
    /// Listeners in registration order
    pub listeners: Vec<ListenerSnapshot>,
    /// ODR entries in creation order
    pub odrs: Vec<OdrSnapshot>,
}

/// One listener
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListenerSnapshot {
    /// Registry handle
    pub id: ListenerId,
    /// Requested rate (Hz)
    pub requested_hz: f32,
    /// Matched ladder rate
    pub matched_odr: Option<Odr>,
    /// Priority of the attached notifier block, if any
    pub notifier_priority: Option<i32>,
}

/// One ODR entry
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OdrSnapshot {
    /// Quantized rate
    pub odr: Odr,
    /// Hardware register encoding of the rate
    pub register_code: u8,
    /// Listeners sharing the rate
    pub ref_count: u32,
}

impl RegistrySnapshot {
    /// Copy the current state of `registry`
    pub fn capture(registry: &SensorRegistry) -> Self {
        let sensors = registry
            .sensor_types()
            .map(|sensor_type| SensorSnapshot {
                sensor_type,
                devices: registry
                    .devices(sensor_type)
                    .map(|devices| devices.map(|(id, device)| DeviceSnapshot::capture(id, device)).collect())
                    .unwrap_or_default(),
            })
            .collect();

        Self { sensors }
    }

    /// Total devices across all types
    pub fn device_count(&self) -> usize {
        self.sensors.iter().map(|s| s.devices.len()).sum()
    }

    /// Total listeners across all devices
    pub fn listener_count(&self) -> usize {
        self.sensors
            .iter()
            .flat_map(|s| s.devices.iter())
            .map(|d| d.listeners.len())
            .sum()
    }

    /// Device at (`sensor_type`, `idx`)
    pub fn device(&self, sensor_type: SensorType, idx: u8) -> Option<&DeviceSnapshot> {
        self.sensors
            .iter()
            .find(|s| s.sensor_type == sensor_type)?
            .devices
            .iter()
            .find(|d| d.idx == idx)
    }
}

impl DeviceSnapshot {
    fn capture(id: DeviceId, device: &Device) -> Self {
        Self {
            id,
            idx: device.idx(),
            name: device.name().into(),
            vendor: device.vendor().into(),
            suid: device.suid(),
            attrs: device.attrs().iter().cloned().collect(),
            axis_map: *device.axis_map(),
            listeners: device
                .listeners()
                .map(|(id, listener)| ListenerSnapshot {
                    id,
                    requested_hz: listener.requested_hz(),
                    matched_odr: listener.matched_odr(),
                    notifier_priority: listener.notifier().map(|n| n.priority()),
                })
                .collect(),
            odrs: device
                .odr_ledger()
                .entries()
                .iter()
                .map(|entry| OdrSnapshot {
                    odr: entry.odr(),
                    register_code: entry.odr().register_code(),
                    ref_count: entry.ref_count(),
                })
                .collect(),
        }
    }
}

impl fmt::Display for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sensor in &self.sensors {
            writeln!(f, "{}", sensor.sensor_type)?;
            for device in &sensor.devices {
                let axis = device.axis_map.config();
                writeln!(
                    f,
                    "  [{}] {} ({}) {} axis [{}, {}, {}]",
                    device.idx, device.name, device.vendor, device.id, axis[0], axis[1], axis[2]
                )?;
                for listener in &device.listeners {
                    write!(f, "    {} req {} Hz -> ", listener.id, listener.requested_hz)?;
                    match listener.matched_odr {
                        Some(odr) => writeln!(f, "{}", odr)?,
                        None => writeln!(f, "unbound")?,
                    }
                }
                for entry in &device.odrs {
                    writeln!(
                        f,
                        "    odr {} x{} (code {})",
                        entry.odr, entry.ref_count, entry.register_code
                    )?;
                }
            }
        }
        Ok(())
    }
}
