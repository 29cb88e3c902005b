//! Sensor Table and Descriptor Limits

use crate::sensor::SensorType;

/// Sensor types installed by `SensorRegistry::bootstrap`, in list order.
pub const BUILTIN_SENSOR_TYPES: [SensorType; 6] = [
    SensorType::Acc,
    SensorType::Gyr,
    SensorType::Mag,
    SensorType::Temp,
    SensorType::Alg0,
    SensorType::Alg1,
];

/// Maximum length of a device or vendor name (bytes).
///
/// Matches the fixed name field of the hub's hardware description table.
pub const MAX_NAME_LEN: usize = 32;

/// Axes per sample. Only 3-axis parts are supported.
pub const AXIS_COUNT: usize = 3;
