//! Output Data Rate Quantization and Per-Device Ledger
//!
//! ## Overview
//!
//! Listeners ask for arbitrary rates; hardware only runs at the rungs of a
//! fixed ladder (see [`crate::constants::odr`]). Two pieces bridge the gap:
//!
//! 1. [`quantize`] maps a requested rate onto the ladder, rounding **up** so
//!    a listener never receives data slower than it asked for.
//! 2. [`OdrLedger`] records which rungs are in use on one device and how
//!    many listeners share each one.
//!
//! ## Quantization
//!
//! ```text
//! requested:  120 Hz        200 Hz       1601 Hz      0.1 Hz
//!               │             │            │            │
//!               ▼             ▼            ▼            ▼
//! ladder:   ... 200 ... 100   200          3200         0.78125
//! ```
//!
//! The request is tested against descending thresholds; the first rung
//! whose next-lower neighbour is still below the request wins. Anything at
//! or below the slowest rung (including NaN and negative requests) lands on
//! the slowest rung, and anything above 1600 Hz lands on 3200 Hz.
//!
//! ## Sharing
//!
//! Two listeners asking for 120 Hz and 200 Hz both match 200 Hz, so the
//! device keeps a single 200 Hz entry with a reference count of 2:
//!
//! ```text
//! ledger: [ 200 Hz ×2 ] → [ 400 Hz ×1 ]
//! ```
//!
//! Entries exist only while their count is non-zero; the release that takes
//! a count to zero removes the entry in the same call.

use core::cmp::Ordering;
use core::fmt;

use heapless::Vec as FixedVec;

use crate::constants::odr::{ODR_LADDER_HZ, ODR_LADDER_LEN};
use crate::errors::{RegistryError, RegistryResult};

/// One rung of the output data rate ladder
///
/// Only values on the ladder can be represented, so two `Odr`s compare
/// equal exactly when they name the same hardware rate. Ordering follows
/// the rate: faster compares greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Odr {
    /// Index into `ODR_LADDER_HZ` (0 = fastest)
    rung: u8,
}

impl Odr {
    /// Fastest supported rate (3200 Hz)
    pub const MAX: Odr = Odr { rung: 0 };

    /// Slowest supported rate (0.78125 Hz)
    pub const MIN: Odr = Odr { rung: (ODR_LADDER_LEN - 1) as u8 };

    /// Rate in Hz
    pub fn hz(&self) -> f32 {
        ODR_LADDER_HZ[self.rung as usize]
    }

    /// Position on the ladder, 0 being the fastest rung
    pub const fn rung(&self) -> u8 {
        self.rung
    }

    /// Hardware register encoding: 1 for the slowest rung up to 13 for 3200 Hz
    pub const fn register_code(&self) -> u8 {
        ODR_LADDER_LEN as u8 - self.rung
    }

    /// Inverse of [`Odr::register_code`]
    pub const fn from_register_code(code: u8) -> Option<Odr> {
        if code == 0 || code as usize > ODR_LADDER_LEN {
            return None;
        }
        Some(Odr { rung: ODR_LADDER_LEN as u8 - code })
    }

    /// Exact ladder lookup. Off-ladder rates return `None`; use [`quantize`]
    /// to round them.
    pub fn from_hz(hz: f32) -> Option<Odr> {
        ODR_LADDER_HZ
            .iter()
            .position(|&rung_hz| rung_hz == hz)
            .map(|rung| Odr { rung: rung as u8 })
    }

    /// Every rung, fastest first
    pub fn ladder() -> impl Iterator<Item = Odr> {
        (0..ODR_LADDER_LEN as u8).map(|rung| Odr { rung })
    }
}

impl Ord for Odr {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower rung index means faster
        other.rung.cmp(&self.rung)
    }
}

impl PartialOrd for Odr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Odr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.hz())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Odr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.hz())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Odr {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{} Hz", self.hz())
    }
}

/// Map a requested rate onto the ladder, rounding up
///
/// Total and idempotent on ladder values: `quantize(quantize(x).hz()) ==
/// quantize(x)`.
///
/// ```rust
/// use sensorhub_core::quantize;
///
/// assert_eq!(quantize(120.0).hz(), 200.0);
/// assert_eq!(quantize(200.0).hz(), 200.0);
/// assert_eq!(quantize(1600.5).hz(), 3200.0);
/// assert_eq!(quantize(0.0).hz(), 0.78125);
/// ```
pub fn quantize(requested_hz: f32) -> Odr {
    ODR_LADDER_HZ
        .windows(2)
        .position(|pair| requested_hz > pair[1])
        .map(|rung| Odr { rung: rung as u8 })
        .unwrap_or(Odr::MIN)
}

/// A rate active on a device and the number of listeners sharing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OdrEntry {
    odr: Odr,
    ref_count: u32,
}

impl OdrEntry {
    fn new(odr: Odr) -> Self {
        Self { odr, ref_count: 1 }
    }

    /// Quantized rate of this entry
    pub fn odr(&self) -> Odr {
        self.odr
    }

    /// Listeners currently matched to this rate. Never zero.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

/// Per-device set of active rates, each reference counted
///
/// Entries stay in creation order. Capacity equals the ladder length and
/// rates are deduplicated, so the ledger can never overflow.
#[derive(Debug, Clone, Default)]
pub struct OdrLedger {
    entries: FixedVec<OdrEntry, ODR_LADDER_LEN>,
}

impl OdrLedger {
    /// Empty ledger
    pub const fn new() -> Self {
        Self { entries: FixedVec::new() }
    }

    /// Quantize `requested_hz` and take a reference on the matching entry,
    /// creating it with a count of 1 if the rate is not active yet.
    pub fn acquire(&mut self, requested_hz: f32) -> Odr {
        let odr = quantize(requested_hz);

        if let Some(entry) = self.entries.iter_mut().find(|e| e.odr == odr) {
            entry.ref_count += 1;
            log_trace!("++ ref_count = {} for {}", entry.ref_count, odr);
            return odr;
        }

        if self.entries.push(OdrEntry::new(odr)).is_err() {
            // Unreachable: one entry per rung at most
            log_error!("ODR ledger full while adding {}", odr);
        } else {
            log_trace!("created ODR entry for {}", odr);
        }
        odr
    }

    /// Drop one reference on `odr`, removing the entry when it reaches zero
    ///
    /// Returns the remaining count (0 means the entry was destroyed).
    pub fn release(&mut self, odr: Odr) -> RegistryResult<u32> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.odr == odr)
            .ok_or(RegistryError::RateNotFound { odr })?;

        let entry = &mut self.entries[pos];
        entry.ref_count -= 1;
        let remaining = entry.ref_count;
        log_trace!("-- ref_count = {} for {}", remaining, odr);

        if remaining == 0 {
            self.entries.remove(pos);
            log_trace!("destroyed ODR entry for {}", odr);
        }

        Ok(remaining)
    }

    /// Reference count for `odr`, `None` when no entry exists
    pub fn ref_count(&self, odr: Odr) -> Option<u32> {
        self.entries.iter().find(|e| e.odr == odr).map(|e| e.ref_count)
    }

    /// Fastest active rate: what the hardware must run at to serve everyone
    pub fn effective_odr(&self) -> Option<Odr> {
        self.entries.iter().map(|e| e.odr).max()
    }

    /// Active entries in creation order
    pub fn entries(&self) -> &[OdrEntry] {
        &self.entries
    }

    /// Sum of all reference counts
    pub fn total_refs(&self) -> u32 {
        self.entries.iter().map(|e| e.ref_count).sum()
    }

    /// Number of distinct active rates
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no rate is active
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
