//! Constants for SensorHub Core
//!
//! Centralised numeric values used by the registry. Grouped by domain:
//! - **Odr**: the hardware-supported output data rate ladder
//! - **Sensors**: built-in sensor types and descriptor limits
//!
//! Always use these constants instead of magic numbers; when the hardware
//! ladder changes it changes here and nowhere else.

/// Output data rate ladder and its anchors.
pub mod odr;

/// Built-in sensor type table and descriptor limits.
pub mod sensors;

pub use odr::{ODR_LADDER_HZ, ODR_LADDER_LEN, ODR_MAX_HZ, ODR_MIN_HZ, ODR_ANCHOR_HZ};
pub use sensors::{BUILTIN_SENSOR_TYPES, MAX_NAME_LEN, AXIS_COUNT};
