//! Core registry for SensorHub
//!
//! Tracks the sensor hierarchy of a hub: sensor *types* (accelerometer,
//! gyroscope, ...), the *devices* instantiated under each type, the
//! *listeners* subscribed to a device, and the *output data rates* (ODRs)
//! those listeners negotiate with shared hardware.
//!
//! ```text
//! SensorRegistry
//!  ├── ACC
//!  │    ├── device idx 0 ──┬── listeners: l0 → l1 → ...
//!  │    │                  └── odrs:      200 Hz (2 refs) → 400 Hz (1 ref)
//!  │    └── device idx 1 ...
//!  ├── GYR
//!  └── ...
//! ```
//!
//! Key constraints:
//! - At most one device per (type, idx)
//! - One ODR entry per distinct quantized rate per device, ref-counted by
//!   the listeners matched to it
//! - Device teardown releases every listener and every ODR entry first
//! - Every registered device carries a SUID no other live device shares
//!
//! ```no_run
//! use sensorhub_core::{Device, Listener, SensorRegistry, SensorType};
//!
//! let mut registry = SensorRegistry::bootstrap();
//! let device = Device::new(0, "bmi320", "bosch").unwrap();
//! registry.register_device(SensorType::Acc, device).unwrap();
//!
//! let listener = registry
//!     .register_listener(SensorType::Acc, 0, Listener::new(120.0))
//!     .unwrap();
//! assert_eq!(registry.listener(listener).unwrap().matched_odr().unwrap().hz(), 200.0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod attr;
pub mod axis;
pub mod constants;
pub mod errors;
pub mod notifier;
pub mod odr;
pub mod registry;
pub mod sensor;
pub mod snapshot;
pub mod suid;

// Public API
pub use attr::{AttrId, AttrSet, SensorAttr};
pub use axis::{AxisMap, AxisSample};
pub use errors::{Rejected, RegistryError, RegistryResult};
pub use notifier::{CallLimit, CallOutcome, Notify, NotifierBlock, NotifierChain, NotifierCtx, NotifierId};
pub use odr::{quantize, Odr, OdrEntry, OdrLedger};
pub use registry::SensorRegistry;
#[cfg(feature = "std")]
pub use registry::SharedRegistry;
pub use sensor::{Device, DeviceId, Listener, ListenerId, SensorType};
pub use snapshot::RegistrySnapshot;
pub use suid::Suid;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
