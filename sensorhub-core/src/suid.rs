//! Sensor unique identifiers
//!
//! A SUID is a name-based UUID (version 5, DNS namespace): the same name
//! always yields the same SUID, so a device keeps its identity across
//! reboots and re-registration. Uniqueness among live devices is enforced
//! by the registry, which refuses a second device with an existing SUID
//! (`DuplicateSuid`).

use alloc::format;

use uuid::Uuid;

use crate::sensor::SensorType;

/// Sensor unique identifier
pub type Suid = Uuid;

/// SUID for an arbitrary name
pub fn from_name(name: &str) -> Suid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes())
}

/// SUID a device receives at registration when it carries none
///
/// Derived from `<vendor>_<name>_<TYPE>_<idx>`.
pub fn for_device(sensor_type: SensorType, idx: u8, vendor: &str, name: &str) -> Suid {
    from_name(&format!("{}_{}_{}_{}", vendor, name, sensor_type, idx))
}
