//! Kernel input event codes used by the virtual device and its callers.
//!
//! These mirror `<linux/input-event-codes.h>`. Only the subset relevant to
//! the multi-touch protocol is exposed; callers compose injection sequences
//! out of these together with [`VirtualMultiTouch::write_event`].
//!
//! [`VirtualMultiTouch::write_event`]: crate::VirtualMultiTouch::write_event

/// Synchronization event class.
pub const EV_SYN: u16 = 0x00;
/// Key/button event class.
pub const EV_KEY: u16 = 0x01;
/// Absolute axis event class.
pub const EV_ABS: u16 = 0x03;

/// Report boundary: flushes the accumulated events into one input frame.
pub const SYN_REPORT: u16 = 0;
/// Type-A multi-touch contact separator (unused by type-B devices).
pub const SYN_MT_REPORT: u16 = 2;

/// Active contact slot selector.
pub const ABS_MT_SLOT: u16 = 0x2f;
/// Major axis of the touching ellipse.
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
/// Contact X position.
pub const ABS_MT_POSITION_X: u16 = 0x35;
/// Contact Y position.
pub const ABS_MT_POSITION_Y: u16 = 0x36;
/// Contact identity, stable for the lifetime of one touch. `-1` lifts it.
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
/// Contact pressure.
pub const ABS_MT_PRESSURE: u16 = 0x3a;

/// Highest absolute axis code.
pub const ABS_MAX: u16 = 0x3f;
/// Number of absolute axis codes.
pub const ABS_CNT: usize = ABS_MAX as usize + 1;

/// Device property: the device surface maps directly to the screen
/// (touchscreen), as opposed to a pointer device with a separate cursor.
pub const INPUT_PROP_DIRECT: u16 = 0x01;

/// Generic external bus identifier reported in the device descriptor.
pub const BUS_USB: u16 = 0x03;
