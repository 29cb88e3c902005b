//! Sensor types, devices and listeners
//!
//! The registry hierarchy has three levels:
//!
//! - [`SensorType`]: what is measured (ACC, GYR, ...). Fixed set.
//! - [`Device`]: one physical part under a type, unique by `idx` within it
//!   and by SUID across the registry. Owns its listeners, its ODR ledger
//!   and its attribute set.
//! - [`Listener`]: one consumer's subscription to a device at some rate.
//!
//! Callers build devices and listeners, then hand them to the registry by
//! value. From then on the registry owns them and callers refer to them by
//! [`DeviceId`] / [`ListenerId`].

use alloc::vec::Vec;
use core::fmt;

use heapless::String as FixedString;

use crate::attr::{AttrId, AttrSet, SensorAttr};
use crate::axis::{AxisMap, AxisSample};
use crate::constants::sensors::MAX_NAME_LEN;
use crate::errors::{RegistryError, RegistryResult};
use crate::notifier::NotifierBlock;
use crate::odr::{Odr, OdrLedger};
use crate::suid::Suid;

/// Sensor type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorType {
    /// Accelerometer
    Acc = 0,
    /// Gyroscope
    Gyr = 1,
    /// Magnetometer
    Mag = 2,
    /// Temperature
    Temp = 3,
    /// First algorithm (virtual) sensor
    Alg0 = 4,
    /// Second algorithm (virtual) sensor
    Alg1 = 5,
}

impl SensorType {
    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            SensorType::Acc => "ACC",
            SensorType::Gyr => "GYR",
            SensorType::Mag => "MAG",
            SensorType::Temp => "TEMP",
            SensorType::Alg0 => "ALG0",
            SensorType::Alg1 => "ALG1",
        }
    }

    /// Numeric id used in hub tables
    pub const fn id(&self) -> u8 {
        *self as u8
    }

    /// Inverse of [`SensorType::id`]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(SensorType::Acc),
            1 => Some(SensorType::Gyr),
            2 => Some(SensorType::Mag),
            3 => Some(SensorType::Temp),
            4 => Some(SensorType::Alg0),
            5 => Some(SensorType::Alg1),
            _ => None,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SensorType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorType {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}

/// Handle to a registered device. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceId(pub(crate) u32);

/// Handle to a registered listener. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListenerId(pub(crate) u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev#{}", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// One physical sensor part
///
/// Built by the caller with [`Device::new`], then registered. The listener
/// list and ODR ledger are filled only by the registry.
#[derive(Debug)]
pub struct Device {
    idx: u8,
    name: FixedString<MAX_NAME_LEN>,
    vendor: FixedString<MAX_NAME_LEN>,
    axis_map: AxisMap,
    pub(crate) attrs: AttrSet,
    pub(crate) listeners: Vec<(ListenerId, Listener)>,
    pub(crate) ledger: OdrLedger,
}

impl Device {
    /// Describe a device at `idx` with its display and vendor names
    ///
    /// Names longer than `MAX_NAME_LEN` bytes fail with `NameTooLong`.
    /// The attribute set starts with `Name`, `Vendor` and the full ladder
    /// as `Rates`.
    pub fn new(idx: u8, name: &str, vendor: &str) -> RegistryResult<Self> {
        let mut attrs = AttrSet::new();
        attrs.set(SensorAttr::Name(name.into()));
        attrs.set(SensorAttr::Vendor(vendor.into()));
        attrs.set(SensorAttr::ladder_rates());

        Ok(Self {
            idx,
            name: bounded_name(name)?,
            vendor: bounded_name(vendor)?,
            axis_map: AxisMap::IDENTITY,
            attrs,
            listeners: Vec::new(),
            ledger: OdrLedger::new(),
        })
    }

    /// Replace the index, e.g. after a `DuplicateIndex` rejection
    pub fn with_idx(mut self, idx: u8) -> Self {
        self.idx = idx;
        self
    }

    /// Attach the chip-to-device axis remapping
    pub fn with_axis_map(mut self, axis_map: AxisMap) -> Self {
        self.axis_map = axis_map;
        self
    }

    /// Pin the SUID instead of having one derived at registration
    pub fn with_suid(mut self, suid: Suid) -> Self {
        self.attrs.set(SensorAttr::Suid(suid));
        self
    }

    /// Builder form of [`Device::set_attr`]
    pub fn with_attr(mut self, attr: SensorAttr) -> RegistryResult<Self> {
        self.set_attr(attr)?;
        Ok(self)
    }

    /// Index, unique among devices of the same type
    pub fn idx(&self) -> u8 {
        self.idx
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vendor name
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Chip-to-device axis remapping
    pub fn axis_map(&self) -> &AxisMap {
        &self.axis_map
    }

    /// Sensor unique identifier; `None` until registered unless pinned
    pub fn suid(&self) -> Option<Suid> {
        match self.attrs.get(AttrId::Suid) {
            Some(SensorAttr::Suid(suid)) => Some(*suid),
            _ => None,
        }
    }

    /// Attribute stored under `id`
    pub fn attr(&self, id: AttrId) -> Option<&SensorAttr> {
        self.attrs.get(id)
    }

    /// All attributes
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// Insert or replace an attribute, returning the one it replaced
    ///
    /// `Name` and `Vendor` also update the fixed name buffers and fail with
    /// `NameTooLong`, leaving the device unchanged, when they do not fit.
    pub fn set_attr(&mut self, attr: SensorAttr) -> RegistryResult<Option<SensorAttr>> {
        match &attr {
            SensorAttr::Name(name) => self.name = bounded_name(name)?,
            SensorAttr::Vendor(vendor) => self.vendor = bounded_name(vendor)?,
            _ => {}
        }
        Ok(self.attrs.set(attr))
    }

    /// Rotate a raw sample into the device frame
    pub fn map_sample(&self, sample: &mut AxisSample) {
        self.axis_map.apply(sample);
    }

    /// Registered listeners in registration order
    pub fn listeners(&self) -> impl Iterator<Item = (ListenerId, &Listener)> + '_ {
        self.listeners.iter().map(|(id, listener)| (*id, listener))
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Active rates on this device
    pub fn odr_ledger(&self) -> &OdrLedger {
        &self.ledger
    }

    pub(crate) fn find_listener(&self, id: ListenerId) -> Option<&Listener> {
        self.listeners
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, listener)| listener)
    }
}

fn bounded_name(name: &str) -> RegistryResult<FixedString<MAX_NAME_LEN>> {
    let mut bounded = FixedString::new();
    bounded
        .push_str(name)
        .map_err(|_| RegistryError::NameTooLong { max: MAX_NAME_LEN })?;
    Ok(bounded)
}

/// A consumer's subscription to a device
///
/// Carries the rate it asked for and, once registered, the ladder rate it
/// was matched to. The optional notifier block is held for event delivery;
/// the registry stores it but does not dispatch through it.
#[derive(Debug)]
pub struct Listener {
    requested_hz: f32,
    matched: Option<Odr>,
    notifier: Option<NotifierBlock<AxisSample>>,
}

impl Listener {
    /// Subscribe at `requested_hz`
    pub fn new(requested_hz: f32) -> Self {
        Self {
            requested_hz,
            matched: None,
            notifier: None,
        }
    }

    /// Attach a notifier block
    pub fn with_notifier(mut self, notifier: NotifierBlock<AxisSample>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Rate this listener asked for (Hz)
    pub fn requested_hz(&self) -> f32 {
        self.requested_hz
    }

    /// Ladder rate this listener was matched to; `None` until registered
    pub fn matched_odr(&self) -> Option<Odr> {
        self.matched
    }

    /// Attached notifier block
    pub fn notifier(&self) -> Option<&NotifierBlock<AxisSample>> {
        self.notifier.as_ref()
    }

    /// Detach the notifier block, e.g. to move it into a chain
    pub fn take_notifier(&mut self) -> Option<NotifierBlock<AxisSample>> {
        self.notifier.take()
    }

    pub(crate) fn bind(&mut self, odr: Odr) {
        self.matched = Some(odr);
    }

    pub(crate) fn unbind(&mut self) {
        self.matched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BUILTIN_SENSOR_TYPES;
    use crate::notifier::Notify;
    use alloc::vec;

    #[test]
    fn sensor_type_names() {
        let names: Vec<&str> = BUILTIN_SENSOR_TYPES.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["ACC", "GYR", "MAG", "TEMP", "ALG0", "ALG1"]);
    }

    #[test]
    fn sensor_type_ids_round_trip() {
        for ty in BUILTIN_SENSOR_TYPES {
            assert_eq!(SensorType::from_id(ty.id()), Some(ty));
        }
        assert_eq!(SensorType::from_id(6), None);
    }

    #[test]
    fn device_builder() {
        let map = AxisMap::from_config([2, 1, -3]).unwrap();
        let device = Device::new(3, "bmi320", "bosch")
            .unwrap()
            .with_axis_map(map);

        assert_eq!(device.idx(), 3);
        assert_eq!(device.name(), "bmi320");
        assert_eq!(device.vendor(), "bosch");
        assert_eq!(device.axis_map(), &map);
        assert_eq!(device.listener_count(), 0);
        assert!(device.odr_ledger().is_empty());

        let mut sample = [1, 2, 3];
        device.map_sample(&mut sample);
        assert_eq!(sample, [2, 1, -3]);
    }

    #[test]
    fn device_name_limit() {
        let exact = "x".repeat(MAX_NAME_LEN);
        assert!(Device::new(0, &exact, "v").is_ok());

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            Device::new(0, &long, "v").unwrap_err(),
            RegistryError::NameTooLong { max: MAX_NAME_LEN }
        );
        assert!(Device::new(0, "n", &long).is_err());
    }

    #[test]
    fn device_attrs_are_seeded() {
        let device = Device::new(0, "bmi320", "bosch").unwrap();

        assert_eq!(device.attr(AttrId::Name), Some(&SensorAttr::Name("bmi320".into())));
        assert_eq!(device.attr(AttrId::Vendor), Some(&SensorAttr::Vendor("bosch".into())));
        assert_eq!(device.attr(AttrId::Rates), Some(&SensorAttr::ladder_rates()));
        assert_eq!(device.attrs().len(), 3);
        assert_eq!(device.suid(), None);
    }

    #[test]
    fn device_attr_upsert() {
        let mut device = Device::new(0, "bmi320", "bosch")
            .unwrap()
            .with_attr(SensorAttr::FifoSize(1024))
            .unwrap();

        let old = device.set_attr(SensorAttr::Rates(vec![400.0, 200.0])).unwrap();
        assert_eq!(old, Some(SensorAttr::ladder_rates()));
        assert_eq!(device.attr(AttrId::Rates), Some(&SensorAttr::Rates(vec![400.0, 200.0])));
        assert_eq!(device.attr(AttrId::FifoSize), Some(&SensorAttr::FifoSize(1024)));
        assert_eq!(device.attrs().len(), 4);

        device.set_attr(SensorAttr::Name("bmi323".into())).unwrap();
        assert_eq!(device.name(), "bmi323");

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            device.set_attr(SensorAttr::Vendor(long)),
            Err(RegistryError::NameTooLong { max: MAX_NAME_LEN })
        );
        assert_eq!(device.vendor(), "bosch");
        assert_eq!(device.attr(AttrId::Vendor), Some(&SensorAttr::Vendor("bosch".into())));
    }

    #[test]
    fn pinned_suid() {
        let suid = crate::suid::from_name("imu-left");
        let device = Device::new(0, "bmi320", "bosch").unwrap().with_suid(suid);
        assert_eq!(device.suid(), Some(suid));
        assert_eq!(device.attr(AttrId::Suid), Some(&SensorAttr::Suid(suid)));
    }

    #[test]
    fn listener_notifier() {
        let mut listener = Listener::new(50.0)
            .with_notifier(NotifierBlock::new(4, |_, _, _| Notify::OK));

        assert_eq!(listener.requested_hz(), 50.0);
        assert_eq!(listener.matched_odr(), None);
        assert_eq!(listener.notifier().map(|n| n.priority()), Some(4));

        let block = listener.take_notifier().unwrap();
        assert_eq!(block.priority(), 4);
        assert!(listener.notifier().is_none());
    }
}
