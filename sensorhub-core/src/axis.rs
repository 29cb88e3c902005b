//! Axis remapping between chip frame and device frame
//!
//! A part is rarely soldered with its axes aligned to the product. Each
//! device therefore carries an [`AxisMap`]: a signed permutation telling
//! where each chip axis lands in the device frame.
//!
//! Configuration entry `i` describes chip axis `i` (x, y, z) and holds a
//! value in `±1..=±3`: 1 → x, 2 → y, 3 → z, negative meaning the axis is
//! inverted. Mapping the chip's X onto the device's −Y is `config[0] = -2`.

use crate::constants::sensors::AXIS_COUNT;
use crate::errors::{RegistryError, RegistryResult};

/// One raw 3-axis sample
pub type AxisSample = [i16; AXIS_COUNT];

/// Signed axis permutation from chip frame to device frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AxisMap {
    /// Destination device axis for each chip axis
    axis: [u8; AXIS_COUNT],
    /// Sign applied on the way, +1 or -1
    sign: [i8; AXIS_COUNT],
}

impl Default for AxisMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AxisMap {
    /// Chip frame equals device frame
    pub const IDENTITY: AxisMap = AxisMap {
        axis: [0, 1, 2],
        sign: [1, 1, 1],
    };

    /// Build from a raw configuration triple
    ///
    /// Fails with `InvalidAxisMap` unless every entry is in `±1..=±3` and
    /// each device axis is targeted exactly once.
    ///
    /// ```rust
    /// use sensorhub_core::AxisMap;
    ///
    /// // chip X → device -Y, chip Y → device X, chip Z → device Z
    /// let map = AxisMap::from_config([-2, 1, 3]).unwrap();
    /// let mut sample = [100, 200, 300];
    /// map.apply(&mut sample);
    /// assert_eq!(sample, [200, -100, 300]);
    ///
    /// assert!(AxisMap::from_config([1, 1, 3]).is_err());
    /// ```
    pub fn from_config(config: [i8; AXIS_COUNT]) -> RegistryResult<Self> {
        let mut axis = [0u8; AXIS_COUNT];
        let mut sign = [1i8; AXIS_COUNT];
        let mut seen = [false; AXIS_COUNT];

        for (chip_axis, &entry) in config.iter().enumerate() {
            let target = entry.unsigned_abs() as usize;
            if !(1..=AXIS_COUNT).contains(&target) || seen[target - 1] {
                return Err(RegistryError::InvalidAxisMap);
            }
            seen[target - 1] = true;
            axis[chip_axis] = (target - 1) as u8;
            sign[chip_axis] = entry.signum();
        }

        Ok(Self { axis, sign })
    }

    /// The configuration triple this map was built from
    pub fn config(&self) -> [i8; AXIS_COUNT] {
        let mut config = [0i8; AXIS_COUNT];
        for (chip_axis, slot) in config.iter_mut().enumerate() {
            *slot = (self.axis[chip_axis] as i8 + 1) * self.sign[chip_axis];
        }
        config
    }

    /// Whether applying this map is a no-op
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Rotate `sample` from chip frame into device frame in place
    ///
    /// Negating `i16::MIN` saturates to `i16::MAX`.
    pub fn apply(&self, sample: &mut AxisSample) {
        let chip = *sample;
        for (chip_axis, &value) in chip.iter().enumerate() {
            let value = if self.sign[chip_axis] < 0 {
                value.saturating_neg()
            } else {
                value
            };
            sample[self.axis[chip_axis] as usize] = value;
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AxisMap {
    fn format(&self, fmt: defmt::Formatter) {
        let c = self.config();
        defmt::write!(fmt, "[{}, {}, {}]", c[0], c[1], c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_noop() {
        let map = AxisMap::default();
        assert!(map.is_identity());

        let mut sample = [1, -2, 3];
        map.apply(&mut sample);
        assert_eq!(sample, [1, -2, 3]);
    }

    #[test]
    fn swap_and_invert() {
        let map = AxisMap::from_config([2, -1, -3]).unwrap();
        let mut sample = [10, 20, 30];
        map.apply(&mut sample);
        assert_eq!(sample, [-20, 10, -30]);
    }

    #[test]
    fn config_round_trips() {
        let config = [-3, 1, -2];
        assert_eq!(AxisMap::from_config(config).unwrap().config(), config);
        assert_eq!(AxisMap::IDENTITY.config(), [1, 2, 3]);
    }

    #[test]
    fn rejects_bad_configs() {
        assert_eq!(AxisMap::from_config([0, 2, 3]), Err(RegistryError::InvalidAxisMap));
        assert_eq!(AxisMap::from_config([4, 2, 3]), Err(RegistryError::InvalidAxisMap));
        assert_eq!(AxisMap::from_config([1, -1, 3]), Err(RegistryError::InvalidAxisMap));
        assert_eq!(AxisMap::from_config([i8::MIN, 2, 3]), Err(RegistryError::InvalidAxisMap));
    }

    #[test]
    fn negation_saturates() {
        let map = AxisMap::from_config([-1, 2, 3]).unwrap();
        let mut sample = [i16::MIN, 0, 0];
        map.apply(&mut sample);
        assert_eq!(sample[0], i16::MAX);
    }
}
