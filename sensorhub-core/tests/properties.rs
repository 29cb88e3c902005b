//! Property tests for rate quantization and ODR reference counting

mod common;

use proptest::prelude::*;
use sensorhub_core::{quantize, Listener, ListenerId, Odr, SensorType};

use common::{assert_ref_counts_conserved, hub};

#[derive(Debug, Clone)]
enum Op {
    Register { gyr: bool, hz: f32 },
    Unregister(usize),
    DropAcc,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 0.0f32..4000.0).prop_map(|(gyr, hz)| Op::Register { gyr, hz }),
        3 => any::<usize>().prop_map(Op::Unregister),
        1 => Just(Op::DropAcc),
    ]
}

proptest! {
    #[test]
    fn quantized_rate_is_on_ladder(hz in any::<f32>()) {
        let odr = quantize(hz);
        prop_assert!(Odr::ladder().any(|rung| rung == odr));
        prop_assert_eq!(Odr::from_hz(odr.hz()), Some(odr));
    }

    #[test]
    fn quantize_rounds_up(hz in 0.0f32..=3200.0) {
        prop_assert!(quantize(hz).hz() >= hz);
    }

    #[test]
    fn fast_requests_saturate(hz in 1600.001f32..1.0e9) {
        prop_assert_eq!(quantize(hz), Odr::MAX);
    }

    #[test]
    fn quantize_is_monotonic(a in 0.0f32..5000.0, b in 0.0f32..5000.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(quantize(lo) <= quantize(hi));
    }

    #[test]
    fn quantize_is_idempotent(hz in any::<f32>()) {
        let once = quantize(hz);
        prop_assert_eq!(quantize(once.hz()), once);
    }

    #[test]
    fn ref_counts_are_conserved(ops in prop::collection::vec(op(), 1..64)) {
        let mut hub = hub();
        let mut live: Vec<ListenerId> = Vec::new();

        for op in ops {
            match op {
                Op::Register { gyr, hz } => {
                    let ty = if gyr { SensorType::Gyr } else { SensorType::Acc };
                    if let Ok(id) = hub.registry.register_listener(ty, 0, Listener::new(hz)) {
                        live.push(id);
                    }
                }
                Op::Unregister(pick) if !live.is_empty() => {
                    let id = live.swap_remove(pick % live.len());
                    prop_assert!(hub.registry.unregister_listener(id).is_ok());
                    prop_assert!(hub.registry.unregister_listener(id).is_err());
                }
                Op::Unregister(_) => {}
                Op::DropAcc => {
                    if hub.registry.unregister_device(hub.acc).is_ok() {
                        live.retain(|&id| hub.registry.listener(id).is_some());
                    }
                }
            }
            assert_ref_counts_conserved(&hub.registry);
            prop_assert_eq!(hub.registry.listener_count(), live.len());
        }
    }
}
