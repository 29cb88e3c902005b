//! Sensor Registry
//!
//! ## Overview
//!
//! [`SensorRegistry`] owns the whole hierarchy: sensor types, the devices
//! under each type, and the listeners and ODR entries under each device.
//! Callers hold [`DeviceId`]s and [`ListenerId`]s, never references into
//! the tree.
//!
//! ## Lifecycle
//!
//! ```text
//! Listener:  Unregistered ──register_listener──▶ Registered(odr bound, ref held)
//!                 ▲                                        │
//!                 └──────────unregister_listener───────────┘
//!                              (ref released, entry destroyed at zero)
//! ```
//!
//! Unregistering a device first unregisters every listener still attached
//! to it, so its ODR ledger is empty by the time the device is unlinked.
//!
//! ## Ownership
//!
//! Registration takes the device or listener by value. A refused
//! registration returns it inside [`Rejected`]; a successful unregister
//! returns it detached. One failure path drops the caller's object:
//! `unregister_listener` answering `RateNotFound`. The ledger was already
//! inconsistent at that point, and the listener is unlinked and dropped
//! alongside the error.
//!
//! ## Identity
//!
//! Handles come from `u32` counters and are never reused. Once a counter
//! is spent, registrations of that kind fail with `HandlesExhausted`.
//! Every registered device also carries a SUID, either pinned by the
//! caller or derived from its vendor, name, type and idx, and no two live
//! devices share one.
//!
//! ## Concurrency
//!
//! Every mutation takes `&mut self`, so a `SensorRegistry` is single-writer
//! by construction. [`SharedRegistry`] (std only) puts one behind an
//! `RwLock` for use from several threads.

use alloc::vec::Vec;

use crate::attr::SensorAttr;
use crate::constants::BUILTIN_SENSOR_TYPES;
use crate::errors::{Rejected, RegistryError, RegistryResult};
use crate::odr::{Odr, OdrEntry};
use crate::sensor::{Device, DeviceId, Listener, ListenerId, SensorType};
use crate::snapshot::RegistrySnapshot;
use crate::suid::{self, Suid};

/// One sensor type and the devices registered under it
#[derive(Debug)]
struct SensorNode {
    sensor_type: SensorType,
    devices: Vec<(DeviceId, Device)>,
}

impl SensorNode {
    fn new(sensor_type: SensorType) -> Self {
        Self {
            sensor_type,
            devices: Vec::new(),
        }
    }
}

/// Position of a listener in the tree: (type node, device, listener)
type ListenerSlot = (usize, usize, usize);

/// Registry of sensor types, devices, listeners and ODR entries
#[derive(Debug, Default)]
pub struct SensorRegistry {
    sensors: Vec<SensorNode>,
    next_device: u32,
    next_listener: u32,
}

impl SensorRegistry {
    /// Registry with no sensor types
    pub const fn new() -> Self {
        Self {
            sensors: Vec::new(),
            next_device: 0,
            next_listener: 0,
        }
    }

    /// Registry populated with the built-in sensor types
    pub fn bootstrap() -> Self {
        let mut registry = Self::new();
        registry.install_builtin_types();
        registry
    }

    /// Register every built-in type not already present
    ///
    /// Safe to call more than once. Returns how many types were added.
    pub fn install_builtin_types(&mut self) -> usize {
        BUILTIN_SENSOR_TYPES
            .iter()
            .filter(|&&ty| self.register_type(ty).is_ok())
            .count()
    }

    /// Add a sensor type
    pub fn register_type(&mut self, sensor_type: SensorType) -> RegistryResult<()> {
        if self.node(sensor_type).is_some() {
            return Err(RegistryError::TypeAlreadyRegistered(sensor_type));
        }
        self.sensors.push(SensorNode::new(sensor_type));
        log_debug!("registered sensor type {}", sensor_type);
        Ok(())
    }

    /// Remove a sensor type
    ///
    /// Refused with `TypeInUse` while any device is registered under it.
    pub fn unregister_type(&mut self, sensor_type: SensorType) -> RegistryResult<()> {
        let pos = self
            .sensors
            .iter()
            .position(|node| node.sensor_type == sensor_type)
            .ok_or(RegistryError::UnknownType(sensor_type))?;

        let devices = self.sensors[pos].devices.len();
        if devices > 0 {
            log_warn!("refusing to remove {}: {} device(s) registered", sensor_type, devices);
            return Err(RegistryError::TypeInUse { sensor_type, devices });
        }

        self.sensors.remove(pos);
        log_debug!("unregistered sensor type {}", sensor_type);
        Ok(())
    }

    /// Registered sensor types in registration order
    pub fn sensor_types(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.sensors.iter().map(|node| node.sensor_type)
    }

    /// Link `device` under `sensor_type`
    ///
    /// Fails with `UnknownType` if the type is not registered, with
    /// `DuplicateIndex` if the type already has a device at the same idx,
    /// with `DuplicateSuid` if another device carries the same SUID and with
    /// `HandlesExhausted` once device handles run out. In every case the
    /// device is handed back untouched.
    ///
    /// A device without a pinned SUID gets one derived by
    /// [`suid::for_device`].
    pub fn register_device(
        &mut self,
        sensor_type: SensorType,
        mut device: Device,
    ) -> Result<DeviceId, Rejected<Device>> {
        let Some(node) = self.sensors.iter().position(|n| n.sensor_type == sensor_type) else {
            log_warn!("cannot register {}: unknown sensor type {}", device.name(), sensor_type);
            return Err(Rejected::new(RegistryError::UnknownType(sensor_type), device));
        };

        let idx = device.idx();
        if self.sensors[node].devices.iter().any(|(_, existing)| existing.idx() == idx) {
            log_warn!("repeated idx {} for sensor type {}", idx, sensor_type);
            return Err(Rejected::new(
                RegistryError::DuplicateIndex { sensor_type, idx },
                device,
            ));
        }

        let suid = device
            .suid()
            .unwrap_or_else(|| suid::for_device(sensor_type, idx, device.vendor(), device.name()));
        if self.device_by_suid(&suid).is_some() {
            log_warn!("cannot register {}: SUID {} already in use", device.name(), suid);
            return Err(Rejected::new(RegistryError::DuplicateSuid, device));
        }

        let Some(next) = self.next_device.checked_add(1) else {
            log_error!("device handles exhausted, cannot register {}", device.name());
            return Err(Rejected::new(RegistryError::HandlesExhausted, device));
        };
        let id = DeviceId(self.next_device);
        self.next_device = next;

        device.attrs.set(SensorAttr::Suid(suid));
        log_info!(
            "registered {} ({}) as {} idx {} [{}, {}]",
            device.name(),
            device.vendor(),
            sensor_type,
            idx,
            id,
            suid
        );
        self.sensors[node].devices.push((id, device));
        Ok(id)
    }

    /// Unlink a device, unregistering all of its listeners first
    ///
    /// Returns the detached device with empty listener and ODR collections.
    pub fn unregister_device(&mut self, id: DeviceId) -> RegistryResult<Device> {
        let Some((node, pos)) = self.locate_device(id) else {
            log_warn!("unregister of unknown device {}", id);
            return Err(RegistryError::DeviceNotFound);
        };

        let attached: Vec<ListenerId> = self.sensors[node].devices[pos]
            .1
            .listeners
            .iter()
            .map(|(listener_id, _)| *listener_id)
            .collect();

        for listener_id in attached {
            // unregister_listener unlinks even when the release fails
            if let Err(error) = self.unregister_listener(listener_id) {
                log_error!("releasing {} during teardown of {}: {}", listener_id, id, error);
            }
        }

        let (_, device) = self.sensors[node].devices.remove(pos);
        if !device.ledger.is_empty() {
            log_error!(
                "{} torn down with {} dangling ODR entries",
                id,
                device.ledger.len()
            );
        }

        log_info!(
            "unregistered {} idx {} from {}",
            device.name(),
            device.idx(),
            self.sensors[node].sensor_type
        );
        Ok(device)
    }

    /// Attach `listener` to the device at (`sensor_type`, `idx`)
    ///
    /// The requested rate is quantized and a reference is taken on the
    /// matching ODR entry. Fails with `DeviceNotFound`, or with
    /// `HandlesExhausted` once listener handles run out, handing the
    /// listener back.
    pub fn register_listener(
        &mut self,
        sensor_type: SensorType,
        idx: u8,
        mut listener: Listener,
    ) -> Result<ListenerId, Rejected<Listener>> {
        let Some(next) = self.next_listener.checked_add(1) else {
            log_error!("listener handles exhausted on {} idx {}", sensor_type, idx);
            return Err(Rejected::new(RegistryError::HandlesExhausted, listener));
        };
        let id = ListenerId(self.next_listener);
        let Some(device) = self.device_at_mut(sensor_type, idx) else {
            log_warn!("no {} device at idx {} for listener", sensor_type, idx);
            return Err(Rejected::new(RegistryError::DeviceNotFound, listener));
        };

        let requested = listener.requested_hz();
        let odr = device.ledger.acquire(requested);
        listener.bind(odr);
        device.listeners.push((id, listener));
        self.next_listener = next;

        log_debug!(
            "registered {} on {} idx {}: requested {} Hz, matched {}",
            id,
            sensor_type,
            idx,
            requested,
            odr
        );
        Ok(id)
    }

    /// Detach a listener and release its ODR reference
    ///
    /// The listener is unlinked even if the release fails. A
    /// `RateNotFound` error means the ledger was already inconsistent, and
    /// the listener is dropped rather than returned.
    pub fn unregister_listener(&mut self, id: ListenerId) -> RegistryResult<Listener> {
        let Some((node, dev, pos)) = self.locate_listener(id) else {
            log_warn!("unregister of unknown listener {}", id);
            return Err(RegistryError::ListenerNotFound);
        };

        let device = &mut self.sensors[node].devices[dev].1;
        let matched = device.listeners[pos].1.matched_odr();
        let released = matched.map(|odr| device.ledger.release(odr));

        let (_, mut listener) = device.listeners.remove(pos);
        listener.unbind();

        match released {
            Some(Err(error)) => {
                log_error!("ledger inconsistent while unregistering {}: {}", id, error);
                Err(error)
            }
            Some(Ok(remaining)) => {
                log_debug!("unregistered {}: {:?} now has {} ref(s)", id, matched, remaining);
                Ok(listener)
            }
            None => Ok(listener),
        }
    }

    /// Device by handle
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.locate_device(id)
            .map(|(node, pos)| &self.sensors[node].devices[pos].1)
    }

    /// Device carrying `suid`
    pub fn device_by_suid(&self, suid: &Suid) -> Option<DeviceId> {
        self.all_devices()
            .find(|(_, device)| device.suid().as_ref() == Some(suid))
            .map(|(id, _)| id)
    }

    /// Insert or replace an attribute on a registered device
    ///
    /// Returns the attribute it replaced. A `Suid` already carried by
    /// another device is refused with `DuplicateSuid`.
    pub fn set_attr(&mut self, id: DeviceId, attr: SensorAttr) -> RegistryResult<Option<SensorAttr>> {
        let (node, pos) = self.locate_device(id).ok_or(RegistryError::DeviceNotFound)?;

        if let SensorAttr::Suid(suid) = &attr {
            if self.device_by_suid(suid).is_some_and(|owner| owner != id) {
                log_warn!("{}: SUID {} already in use", id, suid);
                return Err(RegistryError::DuplicateSuid);
            }
        }

        let attr_id = attr.id();
        let replaced = self.sensors[node].devices[pos].1.set_attr(attr)?;
        log_debug!("{}: set {}", id, attr_id);
        Ok(replaced)
    }

    /// Device at (`sensor_type`, `idx`)
    pub fn device_at(&self, sensor_type: SensorType, idx: u8) -> Option<&Device> {
        self.node(sensor_type)?
            .devices
            .iter()
            .find(|(_, device)| device.idx() == idx)
            .map(|(_, device)| device)
    }

    /// Handle of the device at (`sensor_type`, `idx`)
    pub fn device_id(&self, sensor_type: SensorType, idx: u8) -> Option<DeviceId> {
        self.node(sensor_type)?
            .devices
            .iter()
            .find(|(_, device)| device.idx() == idx)
            .map(|(id, _)| *id)
    }

    /// Devices registered under `sensor_type`, in registration order
    pub fn devices(
        &self,
        sensor_type: SensorType,
    ) -> RegistryResult<impl Iterator<Item = (DeviceId, &Device)> + '_> {
        let node = self
            .node(sensor_type)
            .ok_or(RegistryError::UnknownType(sensor_type))?;
        Ok(node.devices.iter().map(|(id, device)| (*id, device)))
    }

    /// Listeners attached to a device, in registration order
    pub fn listeners_of(
        &self,
        id: DeviceId,
    ) -> RegistryResult<impl Iterator<Item = (ListenerId, &Listener)> + '_> {
        self.device(id)
            .map(|device| device.listeners())
            .ok_or(RegistryError::DeviceNotFound)
    }

    /// Listener by handle
    pub fn listener(&self, id: ListenerId) -> Option<&Listener> {
        self.all_devices().find_map(|(_, device)| device.find_listener(id))
    }

    /// Device the listener is attached to
    pub fn owner_of(&self, id: ListenerId) -> Option<DeviceId> {
        self.all_devices()
            .find(|(_, device)| device.find_listener(id).is_some())
            .map(|(device_id, _)| device_id)
    }

    /// Active ODR entries of the device at (`sensor_type`, `idx`)
    pub fn odr_entries(&self, sensor_type: SensorType, idx: u8) -> RegistryResult<&[OdrEntry]> {
        self.device_at(sensor_type, idx)
            .map(|device| device.odr_ledger().entries())
            .ok_or(RegistryError::DeviceNotFound)
    }

    /// Reference count of `odr` on the device at (`sensor_type`, `idx`)
    ///
    /// Zero when the rate is not active.
    pub fn odr_ref_count(&self, sensor_type: SensorType, idx: u8, odr: Odr) -> RegistryResult<u32> {
        self.device_at(sensor_type, idx)
            .map(|device| device.odr_ledger().ref_count(odr).unwrap_or(0))
            .ok_or(RegistryError::DeviceNotFound)
    }

    /// Rate the hardware must run at to serve every listener of a device
    pub fn effective_odr(&self, sensor_type: SensorType, idx: u8) -> RegistryResult<Option<Odr>> {
        self.device_at(sensor_type, idx)
            .map(|device| device.odr_ledger().effective_odr())
            .ok_or(RegistryError::DeviceNotFound)
    }

    /// Number of registered sensor types
    pub fn type_count(&self) -> usize {
        self.sensors.len()
    }

    /// Number of registered devices across all types
    pub fn device_count(&self) -> usize {
        self.sensors.iter().map(|node| node.devices.len()).sum()
    }

    /// Number of registered listeners across all devices
    pub fn listener_count(&self) -> usize {
        self.all_devices().map(|(_, device)| device.listener_count()).sum()
    }

    /// Owned, read-only copy of the whole tree
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::capture(self)
    }

    /// Write the diagnostics tree to the log at info level
    pub fn log_dump(&self) {
        log_info!("sensor registry:\n{}", self.snapshot());
    }

    fn node(&self, sensor_type: SensorType) -> Option<&SensorNode> {
        self.sensors.iter().find(|node| node.sensor_type == sensor_type)
    }

    fn device_at_mut(&mut self, sensor_type: SensorType, idx: u8) -> Option<&mut Device> {
        self.sensors
            .iter_mut()
            .find(|node| node.sensor_type == sensor_type)?
            .devices
            .iter_mut()
            .find(|(_, device)| device.idx() == idx)
            .map(|(_, device)| device)
    }

    fn all_devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> + '_ {
        self.sensors
            .iter()
            .flat_map(|node| node.devices.iter().map(|(id, device)| (*id, device)))
    }

    fn locate_device(&self, id: DeviceId) -> Option<(usize, usize)> {
        self.sensors.iter().enumerate().find_map(|(n, node)| {
            node.devices
                .iter()
                .position(|(existing, _)| *existing == id)
                .map(|pos| (n, pos))
        })
    }

    fn locate_listener(&self, id: ListenerId) -> Option<ListenerSlot> {
        self.sensors.iter().enumerate().find_map(|(n, node)| {
            node.devices.iter().enumerate().find_map(|(d, (_, device))| {
                device
                    .listeners
                    .iter()
                    .position(|(existing, _)| *existing == id)
                    .map(|pos| (n, d, pos))
            })
        })
    }
}

#[cfg(feature = "std")]
pub use shared::SharedRegistry;

#[cfg(feature = "std")]
mod shared {
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    use super::SensorRegistry;
    use crate::attr::SensorAttr;
    use crate::errors::{Rejected, RegistryError, RegistryResult};
    use crate::sensor::{Device, DeviceId, Listener, ListenerId, SensorType};
    use crate::snapshot::RegistrySnapshot;

    /// Thread-safe registry: one `RwLock` around a [`SensorRegistry`]
    ///
    /// Mutations take the write lock, lookups and snapshots the read lock.
    /// A poisoned lock surfaces as `LockPoisoned`.
    #[derive(Debug, Default)]
    pub struct SharedRegistry {
        inner: RwLock<SensorRegistry>,
    }

    impl SharedRegistry {
        /// Wrap an existing registry
        pub fn new(registry: SensorRegistry) -> Self {
            Self {
                inner: RwLock::new(registry),
            }
        }

        /// Shared registry populated with the built-in sensor types
        pub fn bootstrap() -> Self {
            Self::new(SensorRegistry::bootstrap())
        }

        /// Run `f` with shared access
        pub fn read<R>(&self, f: impl FnOnce(&SensorRegistry) -> R) -> RegistryResult<R> {
            Ok(f(&*self.read_guard()?))
        }

        /// Run `f` with exclusive access
        pub fn write<R>(&self, f: impl FnOnce(&mut SensorRegistry) -> R) -> RegistryResult<R> {
            Ok(f(&mut *self.write_guard()?))
        }

        /// See [`SensorRegistry::register_device`]
        pub fn register_device(
            &self,
            sensor_type: SensorType,
            device: Device,
        ) -> Result<DeviceId, Rejected<Device>> {
            match self.write_guard() {
                Ok(mut registry) => registry.register_device(sensor_type, device),
                Err(error) => Err(Rejected::new(error, device)),
            }
        }

        /// See [`SensorRegistry::unregister_device`]
        pub fn unregister_device(&self, id: DeviceId) -> RegistryResult<Device> {
            self.write_guard()?.unregister_device(id)
        }

        /// See [`SensorRegistry::set_attr`]
        pub fn set_attr(&self, id: DeviceId, attr: SensorAttr) -> RegistryResult<Option<SensorAttr>> {
            self.write_guard()?.set_attr(id, attr)
        }

        /// See [`SensorRegistry::register_listener`]
        pub fn register_listener(
            &self,
            sensor_type: SensorType,
            idx: u8,
            listener: Listener,
        ) -> Result<ListenerId, Rejected<Listener>> {
            match self.write_guard() {
                Ok(mut registry) => registry.register_listener(sensor_type, idx, listener),
                Err(error) => Err(Rejected::new(error, listener)),
            }
        }

        /// See [`SensorRegistry::unregister_listener`]
        pub fn unregister_listener(&self, id: ListenerId) -> RegistryResult<Listener> {
            self.write_guard()?.unregister_listener(id)
        }

        /// See [`SensorRegistry::snapshot`]
        pub fn snapshot(&self) -> RegistryResult<RegistrySnapshot> {
            self.read(SensorRegistry::snapshot)
        }

        /// Unwrap the inner registry
        pub fn into_inner(self) -> RegistryResult<SensorRegistry> {
            self.inner.into_inner().map_err(|_| RegistryError::LockPoisoned)
        }

        fn read_guard(&self) -> RegistryResult<RwLockReadGuard<'_, SensorRegistry>> {
            self.inner.read().map_err(|_| RegistryError::LockPoisoned)
        }

        fn write_guard(&self) -> RegistryResult<RwLockWriteGuard<'_, SensorRegistry>> {
            self.inner.write().map_err(|_| RegistryError::LockPoisoned)
        }
    }
}
