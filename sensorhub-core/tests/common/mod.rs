//! Shared fixtures for integration tests
//!
//! Mirrors the hub's bring-up: a BMI320 accelerometer and a BMI260
//! gyroscope at idx 0, plus a few listener rates drivers typically ask for.

#![allow(dead_code)]

use sensorhub_core::{AxisMap, Device, DeviceId, ListenerId, Odr, SensorRegistry, SensorType};

/// Rates registered on the accelerometer by [`populated_hub`]
pub const ACC_RATES: [f32; 3] = [120.0, 200.0, 400.0];

/// Rate registered on the gyroscope by [`populated_hub`]
pub const GYR_RATE: f32 = 800.0;

pub fn bmi320() -> Device {
    Device::new(0, "bmi320", "bosch")
        .unwrap()
        .with_axis_map(AxisMap::from_config([-2, 1, 3]).unwrap())
}

pub fn bmi260() -> Device {
    Device::new(0, "bmi260", "bosch").unwrap()
}

/// Bootstrapped registry with both devices and no listeners
pub struct Hub {
    pub registry: SensorRegistry,
    pub acc: DeviceId,
    pub gyr: DeviceId,
}

pub fn hub() -> Hub {
    let mut registry = SensorRegistry::bootstrap();
    let acc = registry.register_device(SensorType::Acc, bmi320()).unwrap();
    let gyr = registry.register_device(SensorType::Gyr, bmi260()).unwrap();
    Hub { registry, acc, gyr }
}

/// [`hub`] plus listeners at [`ACC_RATES`] and [`GYR_RATE`]
pub fn populated_hub() -> (Hub, Vec<ListenerId>) {
    let mut hub = hub();
    let mut ids: Vec<ListenerId> = ACC_RATES
        .iter()
        .map(|&rate| {
            hub.registry
                .register_listener(SensorType::Acc, 0, sensorhub_core::Listener::new(rate))
                .unwrap()
        })
        .collect();
    ids.push(
        hub.registry
            .register_listener(SensorType::Gyr, 0, sensorhub_core::Listener::new(GYR_RATE))
            .unwrap(),
    );
    (hub, ids)
}

pub fn odr(hz: f32) -> Odr {
    Odr::from_hz(hz).unwrap()
}

/// Check that every ODR entry's count equals the number of listeners
/// matched to it, on every device of every type.
pub fn assert_ref_counts_conserved(registry: &SensorRegistry) {
    for ty in registry.sensor_types() {
        for (id, device) in registry.devices(ty).unwrap() {
            for entry in device.odr_ledger().entries() {
                let matched = device
                    .listeners()
                    .filter(|(_, l)| l.matched_odr() == Some(entry.odr()))
                    .count() as u32;
                assert_eq!(entry.ref_count(), matched, "{} on {}", entry.odr(), id);
                assert!(entry.ref_count() > 0);
            }
            for (_, listener) in device.listeners() {
                let odr = listener.matched_odr().unwrap();
                assert!(device.odr_ledger().ref_count(odr).is_some(), "{} has no entry on {}", odr, id);
            }
        }
    }
}
