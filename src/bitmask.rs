//! Capability-bitmask decoding for `EVIOCGBIT` query results.
//!
//! The kernel reports per-class capabilities as a packed little-endian bit
//! array, one bit per event code. The helpers here are pure so they can be
//! tested directly against bitmask dumps captured from real devices.

use crate::codes::ABS_MAX;

const fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) / 8
}

/// Length in bytes of an `EV_ABS` capability bitmask.
pub const ABS_BITMASK_LEN: usize = bytes_for_bits(ABS_MAX as usize + 1);

/// Test a single bit in a kernel capability bitmask.
///
/// Bit `b` is set iff `(mask[b / 8] >> (b % 8)) & 1`. Bits beyond the end of
/// `mask` read as unset.
pub fn bit_is_set(mask: &[u8], bit: u16) -> bool {
    match mask.get(bit as usize / 8) {
        Some(byte) => (byte >> (bit % 8)) & 1 != 0,
        None => false,
    }
}

/// An `EV_ABS` capability bitmask as returned by `EVIOCGBIT(EV_ABS, ..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsBitmask(pub [u8; ABS_BITMASK_LEN]);

impl AbsBitmask {
    /// A bitmask with no axes advertised.
    pub const fn empty() -> Self {
        Self([0; ABS_BITMASK_LEN])
    }

    /// Whether the device advertises `axis`.
    pub fn is_set(&self, axis: u16) -> bool {
        bit_is_set(&self.0, axis)
    }

    /// Mark `axis` as advertised. Mainly useful for building masks in tests.
    /// Out-of-range axes are ignored, mirroring [`bit_is_set`].
    pub fn set(&mut self, axis: u16) {
        if let Some(byte) = self.0.get_mut(axis as usize / 8) {
            *byte |= 1 << (axis % 8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{
        ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_MT_TOUCH_MAJOR,
        ABS_MT_TRACKING_ID,
    };

    // EVIOCGBIT(EV_ABS) dump of a 10-point touchscreen: ABS_X, ABS_Y plus the
    // full MT axis set.
    const TOUCHSCREEN_MASK: [u8; ABS_BITMASK_LEN] =
        [0x03, 0x00, 0x00, 0x00, 0x00, 0x80, 0x61, 0x06];

    #[test]
    fn decodes_touchscreen_dump() {
        assert!(bit_is_set(&TOUCHSCREEN_MASK, 0)); // ABS_X
        assert!(bit_is_set(&TOUCHSCREEN_MASK, 1)); // ABS_Y
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_SLOT));
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_TOUCH_MAJOR));
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_POSITION_X));
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_POSITION_Y));
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_TRACKING_ID));
        assert!(bit_is_set(&TOUCHSCREEN_MASK, ABS_MT_PRESSURE));
        assert!(!bit_is_set(&TOUCHSCREEN_MASK, 2)); // ABS_Z
        assert!(!bit_is_set(&TOUCHSCREEN_MASK, ABS_MAX));
    }

    #[test]
    fn out_of_range_bits_read_unset() {
        assert!(!bit_is_set(&TOUCHSCREEN_MASK, ABS_MAX + 1));
        assert!(!bit_is_set(&[], 0));
    }

    #[test]
    fn set_ignores_out_of_range_axes() {
        let mut mask = AbsBitmask::empty();
        mask.set(ABS_MAX + 1);
        mask.set(u16::MAX);
        assert_eq!(mask, AbsBitmask::empty());
    }

    #[test]
    fn set_round_trips_through_is_set() {
        let mut mask = AbsBitmask::empty();
        assert!(!mask.is_set(ABS_MT_POSITION_X));
        mask.set(ABS_MT_POSITION_X);
        mask.set(ABS_MT_POSITION_Y);
        assert!(mask.is_set(ABS_MT_POSITION_X));
        assert!(mask.is_set(ABS_MT_POSITION_Y));
        assert!(!mask.is_set(ABS_MT_SLOT));
        assert_eq!(mask.0[6], 0x60);
    }
}
