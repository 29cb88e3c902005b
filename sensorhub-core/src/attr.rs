//! Per-device attributes
//!
//! Every [`Device`](crate::Device) carries an [`AttrSet`] of descriptive
//! properties: rates, ranges, currents, FIFO depth and so on. The set is
//! keyed by [`AttrId`] and holds at most one attribute per id. Setting an
//! attribute whose id is already present replaces it in place.
//!
//! | Attribute | Seeded by                               |
//! |-----------|-----------------------------------------|
//! | `Name`    | `Device::new`                           |
//! | `Vendor`  | `Device::new`                           |
//! | `Rates`   | `Device::new` (the full ODR ladder)     |
//! | `Suid`    | registration, unless the caller set one |
//!
//! Everything else is set by the driver that owns the device.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::constants::odr::ODR_LADDER_HZ;
use crate::suid::Suid;

/// Key of a [`SensorAttr`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrId {
    /// Sensor unique identifier
    Suid,
    /// Display name
    Name,
    /// Vendor name
    Vendor,
    /// Whether the part is present and usable
    Available,
    /// Driver version
    Version,
    /// Supported client APIs
    Api,
    /// Supported output data rates (Hz)
    Rates,
    /// Supported resolutions
    Resolutions,
    /// Hardware FIFO depth in samples
    FifoSize,
    /// Active current per rate (uA)
    ActiveCurrent,
    /// Sleep current (uA)
    SleepCurrent,
    /// Measurement ranges as (min, max)
    Ranges,
    /// Supported operating modes
    OpModes,
    /// Data-ready interrupt support
    Dri,
    /// Synchronous streaming support
    StreamSync,
    /// Size of one event in bytes
    EventSize,
    /// Hot-pluggable part
    Dynamic,
    /// Hardware instance id
    HwId,
    /// Placement on the board
    Placement,
    /// Backed by a physical part, as opposed to an algorithm
    PhysicalSensor,
}

impl AttrId {
    /// Get human-readable name
    pub const fn name(&self) -> &'static str {
        match self {
            AttrId::Suid => "suid",
            AttrId::Name => "name",
            AttrId::Vendor => "vendor",
            AttrId::Available => "available",
            AttrId::Version => "version",
            AttrId::Api => "api",
            AttrId::Rates => "rates",
            AttrId::Resolutions => "resolutions",
            AttrId::FifoSize => "fifo_size",
            AttrId::ActiveCurrent => "active_current",
            AttrId::SleepCurrent => "sleep_current",
            AttrId::Ranges => "ranges",
            AttrId::OpModes => "op_modes",
            AttrId::Dri => "dri",
            AttrId::StreamSync => "stream_sync",
            AttrId::EventSize => "event_size",
            AttrId::Dynamic => "dynamic",
            AttrId::HwId => "hw_id",
            AttrId::Placement => "placement",
            AttrId::PhysicalSensor => "physical_sensor",
        }
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One device attribute with its value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[allow(missing_docs)]
pub enum SensorAttr {
    Suid(Suid),
    Name(String),
    Vendor(String),
    Available(bool),
    Version(u32),
    Api(Vec<String>),
    Rates(Vec<f32>),
    Resolutions(Vec<f32>),
    FifoSize(u32),
    ActiveCurrent(Vec<u32>),
    SleepCurrent(u32),
    Ranges(Vec<(f32, f32)>),
    OpModes(Vec<String>),
    Dri(bool),
    StreamSync(bool),
    EventSize(u32),
    Dynamic(bool),
    HwId(u32),
    Placement(Vec<f32>),
    PhysicalSensor(bool),
}

impl SensorAttr {
    /// Key this attribute is stored under
    pub const fn id(&self) -> AttrId {
        match self {
            SensorAttr::Suid(_) => AttrId::Suid,
            SensorAttr::Name(_) => AttrId::Name,
            SensorAttr::Vendor(_) => AttrId::Vendor,
            SensorAttr::Available(_) => AttrId::Available,
            SensorAttr::Version(_) => AttrId::Version,
            SensorAttr::Api(_) => AttrId::Api,
            SensorAttr::Rates(_) => AttrId::Rates,
            SensorAttr::Resolutions(_) => AttrId::Resolutions,
            SensorAttr::FifoSize(_) => AttrId::FifoSize,
            SensorAttr::ActiveCurrent(_) => AttrId::ActiveCurrent,
            SensorAttr::SleepCurrent(_) => AttrId::SleepCurrent,
            SensorAttr::Ranges(_) => AttrId::Ranges,
            SensorAttr::OpModes(_) => AttrId::OpModes,
            SensorAttr::Dri(_) => AttrId::Dri,
            SensorAttr::StreamSync(_) => AttrId::StreamSync,
            SensorAttr::EventSize(_) => AttrId::EventSize,
            SensorAttr::Dynamic(_) => AttrId::Dynamic,
            SensorAttr::HwId(_) => AttrId::HwId,
            SensorAttr::Placement(_) => AttrId::Placement,
            SensorAttr::PhysicalSensor(_) => AttrId::PhysicalSensor,
        }
    }

    /// Every rung of the ODR ladder, fastest first
    pub fn ladder_rates() -> Self {
        SensorAttr::Rates(ODR_LADDER_HZ.to_vec())
    }
}

/// Attributes of one device, at most one per [`AttrId`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSet {
    attrs: Vec<SensorAttr>,
}

impl AttrSet {
    /// Empty set
    pub const fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    /// Insert `attr`, replacing and returning any attribute with the same id
    pub fn set(&mut self, attr: SensorAttr) -> Option<SensorAttr> {
        match self.attrs.iter_mut().find(|a| a.id() == attr.id()) {
            Some(existing) => Some(core::mem::replace(existing, attr)),
            None => {
                self.attrs.push(attr);
                None
            }
        }
    }

    /// Attribute stored under `id`
    pub fn get(&self, id: AttrId) -> Option<&SensorAttr> {
        self.attrs.iter().find(|a| a.id() == id)
    }

    /// Remove the attribute stored under `id`
    pub fn remove(&mut self, id: AttrId) -> Option<SensorAttr> {
        let pos = self.attrs.iter().position(|a| a.id() == id)?;
        Some(self.attrs.remove(pos))
    }

    /// Whether an attribute is stored under `id`
    pub fn contains(&self, id: AttrId) -> bool {
        self.get(id).is_some()
    }

    /// Attributes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SensorAttr> + '_ {
        self.attrs.iter()
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn set_is_upsert_by_id() {
        let mut attrs = AttrSet::new();
        assert_eq!(attrs.set(SensorAttr::FifoSize(64)), None);
        assert_eq!(attrs.set(SensorAttr::Dri(true)), None);
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs.set(SensorAttr::FifoSize(128)), Some(SensorAttr::FifoSize(64)));
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get(AttrId::FifoSize), Some(&SensorAttr::FifoSize(128)));

        // replaced in place, order kept
        let ids: Vec<AttrId> = attrs.iter().map(SensorAttr::id).collect();
        assert_eq!(ids, [AttrId::FifoSize, AttrId::Dri]);
    }

    #[test]
    fn get_and_remove() {
        let mut attrs = AttrSet::new();
        attrs.set(SensorAttr::Ranges(vec![(-2.0, 2.0), (-16.0, 16.0)]));

        assert!(attrs.contains(AttrId::Ranges));
        assert!(attrs.get(AttrId::Resolutions).is_none());
        assert_eq!(
            attrs.remove(AttrId::Ranges),
            Some(SensorAttr::Ranges(vec![(-2.0, 2.0), (-16.0, 16.0)]))
        );
        assert_eq!(attrs.remove(AttrId::Ranges), None);
        assert!(attrs.is_empty());
    }

    #[test]
    fn ladder_rates_cover_every_rung() {
        let SensorAttr::Rates(rates) = SensorAttr::ladder_rates() else {
            panic!("ladder_rates must build a Rates attribute");
        };
        assert_eq!(rates, ODR_LADDER_HZ);
        assert_eq!(rates.first(), Some(&3200.0));
        assert!(rates.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn attr_ids() {
        assert_eq!(SensorAttr::ladder_rates().id(), AttrId::Rates);
        assert_eq!(SensorAttr::Name("bmi320".into()).id(), AttrId::Name);
        assert_eq!(AttrId::FifoSize.name(), "fifo_size");
    }
}
