//! Output Data Rate Ladder
//!
//! Rates a device can actually be programmed to. Every step is the previous
//! one halved; the ladder is anchored at 25 Hz so the sub-25 Hz rungs are
//! exact binary fractions (25/2, 25/4, ... 25/32) and compare exactly as
//! `f32`.

/// Rate every sub-anchor rung is derived from (Hz).
pub const ODR_ANCHOR_HZ: f32 = 25.0;

/// Supported rates in descending order (Hz).
///
/// Rung 0 is the fastest. The hardware register code of a rung counts up
/// from the slowest: 0.78125 Hz encodes as 1, 3200 Hz as 13.
pub const ODR_LADDER_HZ: [f32; ODR_LADDER_LEN] = [
    3200.0,
    1600.0,
    800.0,
    400.0,
    200.0,
    100.0,
    50.0,
    ODR_ANCHOR_HZ,
    ODR_ANCHOR_HZ / 2.0,
    ODR_ANCHOR_HZ / 4.0,
    ODR_ANCHOR_HZ / 8.0,
    ODR_ANCHOR_HZ / 16.0,
    ODR_ANCHOR_HZ / 32.0,
];

/// Number of rungs on the ladder.
///
/// Also the upper bound on distinct ODR entries a single device can hold.
pub const ODR_LADDER_LEN: usize = 13;

/// Fastest supported rate (Hz).
pub const ODR_MAX_HZ: f32 = ODR_LADDER_HZ[0];

/// Slowest supported rate (Hz).
pub const ODR_MIN_HZ: f32 = ODR_LADDER_HZ[ODR_LADDER_LEN - 1];

const _: () = assert!(ODR_LADDER_LEN < u8::MAX as usize, "rung index must fit in u8");
