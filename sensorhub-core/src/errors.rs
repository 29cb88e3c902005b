//! Error Types for Registry Operations
//!
//! ## Design Philosophy
//!
//! Every failure in the registry is a logic or state error: nothing here
//! performs I/O and nothing is timing dependent, so nothing is worth
//! retrying. Errors are therefore small, `Copy`, and carry just enough
//! context to say *which* lookup failed.
//!
//! ## Error Categories
//!
//! ### Topology
//! - `UnknownType`: sensor type was never registered
//! - `TypeAlreadyRegistered`: type registered twice
//! - `TypeInUse`: type removal attempted while devices remain
//! - `DuplicateIndex`: device idx collision within a type
//! - `DuplicateSuid`: a live device already carries the SUID
//!
//! ### Lookup
//! - `DeviceNotFound`, `ListenerNotFound`, `NotifierNotFound`
//!
//! ### Invariant Violations
//! - `RateNotFound`: the ODR ledger has no entry for a rate a listener
//!   claims to hold. Unreachable while the ledger invariants hold; treat it
//!   as a defect signal.
//!
//! ### Construction
//! - `NameTooLong`, `InvalidAxisMap`
//!
//! ### Capacity
//! - `HandlesExhausted`: the `u32` handle counter for devices or listeners
//!   is spent. Handles are never reused, so the registry refuses further
//!   registrations of that kind.
//!
//! ## Ownership on Rejection
//!
//! Registration takes the device or listener by value. When registration
//! is refused, the value comes back inside [`Rejected`] so the caller keeps
//! ownership and decides what to do with it:
//!
//! ```rust
//! use sensorhub_core::{Device, SensorRegistry, SensorType, RegistryError};
//!
//! let mut registry = SensorRegistry::bootstrap();
//! registry.register_device(SensorType::Acc, Device::new(0, "bmi320", "bosch").unwrap()).unwrap();
//!
//! let clash = Device::new(0, "bmi260", "bosch").unwrap();
//! let rejected = registry.register_device(SensorType::Acc, clash).unwrap_err();
//! assert!(matches!(rejected.error(), RegistryError::DuplicateIndex { idx: 0, .. }));
//!
//! // Still ours: re-index and try again
//! let device = rejected.into_inner().with_idx(1);
//! registry.register_device(SensorType::Acc, device).unwrap();
//! ```

use core::fmt;

use thiserror_no_std::Error;

use crate::odr::Odr;
use crate::sensor::SensorType;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry errors - kept small and `Copy`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Sensor type not present in the registry
    #[error("Unknown sensor type {0}")]
    UnknownType(SensorType),

    /// Sensor type already present in the registry
    #[error("Sensor type {0} already registered")]
    TypeAlreadyRegistered(SensorType),

    /// Sensor type still owns devices and cannot be removed
    #[error("Sensor type {sensor_type} still owns {devices} device(s)")]
    TypeInUse {
        /// Type whose removal was refused
        sensor_type: SensorType,
        /// Number of devices still registered under it
        devices: usize,
    },

    /// A device with the same idx already exists under this type
    #[error("Repeated idx {idx} for sensor type {sensor_type}")]
    DuplicateIndex {
        /// Type the device was offered to
        sensor_type: SensorType,
        /// Colliding device index
        idx: u8,
    },

    /// Another registered device already carries this SUID
    #[error("Duplicate sensor unique identifier")]
    DuplicateSuid,

    /// No device matches the given identity or (type, idx) pair
    #[error("Device not found")]
    DeviceNotFound,

    /// No registered listener matches the given identity
    #[error("Listener not found")]
    ListenerNotFound,

    /// The device's ODR ledger holds no entry for this rate
    #[error("No ODR entry for {odr}")]
    RateNotFound {
        /// Rate the caller tried to release
        odr: Odr,
    },

    /// Notifier block not present in the chain
    #[error("Notifier not found in chain")]
    NotifierNotFound,

    /// Display or vendor name exceeds the fixed name buffer
    #[error("Name exceeds {max} bytes")]
    NameTooLong {
        /// Maximum accepted length in bytes
        max: usize,
    },

    /// Axis configuration is not a signed permutation of x, y, z
    #[error("Invalid axis map configuration")]
    InvalidAxisMap,

    /// No handle left to assign
    #[error("Registry handles exhausted")]
    HandlesExhausted,

    /// A thread panicked while holding the shared registry lock
    #[error("Registry lock poisoned")]
    LockPoisoned,
}

#[cfg(feature = "defmt")]
impl defmt::Format for RegistryError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::UnknownType(ty) =>
                defmt::write!(fmt, "Unknown sensor type {}", ty.name()),
            Self::TypeAlreadyRegistered(ty) =>
                defmt::write!(fmt, "Sensor type {} already registered", ty.name()),
            Self::TypeInUse { sensor_type, devices } =>
                defmt::write!(fmt, "Sensor type {} owns {} devices", sensor_type.name(), devices),
            Self::DuplicateIndex { sensor_type, idx } =>
                defmt::write!(fmt, "Repeated idx {} for {}", idx, sensor_type.name()),
            Self::DuplicateSuid =>
                defmt::write!(fmt, "Duplicate SUID"),
            Self::DeviceNotFound =>
                defmt::write!(fmt, "Device not found"),
            Self::ListenerNotFound =>
                defmt::write!(fmt, "Listener not found"),
            Self::RateNotFound { odr } =>
                defmt::write!(fmt, "No ODR entry for {} Hz", odr.hz()),
            Self::NotifierNotFound =>
                defmt::write!(fmt, "Notifier not found"),
            Self::NameTooLong { max } =>
                defmt::write!(fmt, "Name exceeds {} bytes", max),
            Self::InvalidAxisMap =>
                defmt::write!(fmt, "Invalid axis map"),
            Self::HandlesExhausted =>
                defmt::write!(fmt, "Registry handles exhausted"),
            Self::LockPoisoned =>
                defmt::write!(fmt, "Registry lock poisoned"),
        }
    }
}

/// A registration the registry refused, with the offered value handed back
///
/// The registry never takes ownership speculatively: whatever was offered
/// is returned untouched and the caller is responsible for it.
pub struct Rejected<T> {
    error: RegistryError,
    value: T,
}

impl<T> Rejected<T> {
    pub(crate) fn new(error: RegistryError, value: T) -> Self {
        Self { error, value }
    }

    /// Why the registration was refused
    pub fn error(&self) -> RegistryError {
        self.error
    }

    /// Borrow the rejected value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Take the rejected value back
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Split into error and value
    pub fn into_parts(self) -> (RegistryError, T) {
        (self.error, self.value)
    }
}

impl<T> fmt::Debug for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for Rejected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registration rejected: {}", self.error)
    }
}

impl<T> From<Rejected<T>> for RegistryError {
    fn from(rejected: Rejected<T>) -> Self {
        rejected.error
    }
}
