//! Registry Walkthrough
//!
//! Brings up a hub the way board init does and prints the registry tree
//! after each step.
//!
//! ## What You'll See
//!
//! - Two devices registered under ACC and GYR, each with its own SUID
//! - Three accelerometer listeners sharing two ODR entries
//! - Ref counts dropping as listeners leave
//! - Device teardown emptying every ledger
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_registry_walkthrough
//! ```

use sensorhub_core::{
    AttrId, AxisMap, Device, Listener, RegistryResult, SensorAttr, SensorRegistry, SensorType,
};

fn section(title: &str, registry: &SensorRegistry) {
    println!("===================== {} =====================", title);
    print!("{}", registry.snapshot());
}

fn main() -> RegistryResult<()> {
    let mut registry = SensorRegistry::bootstrap();
    section("bootstrap", &registry);

    let bmi320 = Device::new(0, "bmi320", "bosch")?
        .with_axis_map(AxisMap::from_config([-2, 1, 3])?);
    let bmi320 = registry.register_device(SensorType::Acc, bmi320)?;
    let bmi260 = registry.register_device(SensorType::Gyr, Device::new(0, "bmi260", "bosch")?)?;
    section("register devices", &registry);

    registry.set_attr(bmi320, SensorAttr::FifoSize(2048))?;
    if let Some(device) = registry.device(bmi320) {
        if let Some(suid) = device.suid() {
            println!("{} suid {}", device.name(), suid);
        }
        if let Some(SensorAttr::Rates(rates)) = device.attr(AttrId::Rates) {
            println!("{} supports {} rates, up to {} Hz", device.name(), rates.len(), rates[0]);
        }
    }

    // A second part at an occupied idx is handed back, not dropped
    let clash = Device::new(0, "lsm6dso", "st")?;
    if let Err(rejected) = registry.register_device(SensorType::Acc, clash) {
        println!("{} -> keeping {}", rejected, rejected.value().name());
    }

    let _l1 = registry.register_listener(SensorType::Acc, 0, Listener::new(120.0))?;
    let l2 = registry.register_listener(SensorType::Acc, 0, Listener::new(200.0))?;
    let l3 = registry.register_listener(SensorType::Acc, 0, Listener::new(400.0))?;
    let _l4 = registry.register_listener(SensorType::Gyr, 0, Listener::new(800.0))?;
    section("register listeners", &registry);

    if let Ok(Some(odr)) = registry.effective_odr(SensorType::Acc, 0) {
        println!("ACC hardware runs at {} (register code {})", odr, odr.register_code());
    }

    registry.unregister_listener(l2)?;
    registry.unregister_listener(l3)?;
    section("unregister listeners", &registry);

    let mut sample = [100, 200, 300];
    if let Some(device) = registry.device(bmi320) {
        device.map_sample(&mut sample);
    }
    println!("chip [100, 200, 300] -> device {:?}", sample);

    registry.unregister_device(bmi320)?;
    registry.unregister_device(bmi260)?;
    section("unregister devices", &registry);

    Ok(())
}
