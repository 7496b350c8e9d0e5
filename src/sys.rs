//! Raw kernel ABI for evdev capability queries and the uinput facility.
//!
//! Struct layouts mirror `<linux/input.h>` and `<linux/uinput.h>`. Device
//! setup goes through the legacy `uinput_user_dev` write, which is honored
//! by every facility location this crate probes.

#![allow(non_camel_case_types)]

use crate::codes::ABS_CNT;

/// Width of the fixed name field in the device descriptor. Longer names are
/// silently truncated at this boundary.
pub const UINPUT_MAX_NAME_SIZE: usize = 80;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct input_id {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct input_absinfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct timeval {
    pub tv_sec: libc::time_t,
    pub tv_usec: libc::suseconds_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct input_event {
    pub time: timeval,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct uinput_user_dev {
    pub name: [u8; UINPUT_MAX_NAME_SIZE],
    pub id: input_id,
    pub ff_effects_max: u32,
    pub absmax: [i32; ABS_CNT],
    pub absmin: [i32; ABS_CNT],
    pub absfuzz: [i32; ABS_CNT],
    pub absflat: [i32; ABS_CNT],
}

impl Default for uinput_user_dev {
    fn default() -> Self {
        Self {
            name: [0; UINPUT_MAX_NAME_SIZE],
            id: input_id::default(),
            ff_effects_max: 0,
            absmax: [0; ABS_CNT],
            absmin: [0; ABS_CNT],
            absfuzz: [0; ABS_CNT],
            absflat: [0; ABS_CNT],
        }
    }
}

// ioctl request numbers, built the way <uapi/asm-generic/ioctl.h> does.

const IOC_NONE: libc::c_ulong = 0;
const IOC_WRITE: libc::c_ulong = 1;
const IOC_READ: libc::c_ulong = 2;

const IOC_NR_SHIFT: u32 = 0;
const IOC_TYPE_SHIFT: u32 = 8;
const IOC_SIZE_SHIFT: u32 = 16;
const IOC_DIR_SHIFT: u32 = 30;

const fn ioc(dir: libc::c_ulong, ty: u8, nr: libc::c_ulong, size: usize) -> libc::c_ulong {
    (dir << IOC_DIR_SHIFT)
        | ((ty as libc::c_ulong) << IOC_TYPE_SHIFT)
        | (nr << IOC_NR_SHIFT)
        | ((size as libc::c_ulong) << IOC_SIZE_SHIFT)
}

/// `EVIOCGBIT(event_class, len)`: read `len` bytes of capability bitmask for
/// one event class.
pub const fn eviocgbit(event_class: u16, len: usize) -> libc::c_ulong {
    ioc(IOC_READ, b'E', 0x20 + event_class as libc::c_ulong, len)
}

/// `EVIOCGABS(axis)`: read the `input_absinfo` calibration of one axis.
pub const fn eviocgabs(axis: u16) -> libc::c_ulong {
    ioc(
        IOC_READ,
        b'E',
        0x40 + axis as libc::c_ulong,
        std::mem::size_of::<input_absinfo>(),
    )
}

/// Enable one event class on the device under construction.
pub const UI_SET_EVBIT: libc::c_ulong = ioc(IOC_WRITE, b'U', 100, 4);
/// Enable one absolute axis on the device under construction.
pub const UI_SET_ABSBIT: libc::c_ulong = ioc(IOC_WRITE, b'U', 103, 4);
/// Enable one input property on the device under construction.
pub const UI_SET_PROPBIT: libc::c_ulong = ioc(IOC_WRITE, b'U', 110, 4);
/// Instantiate the configured device node.
pub const UI_DEV_CREATE: libc::c_ulong = ioc(IOC_NONE, b'U', 1, 0);
/// Remove the instantiated device node.
pub const UI_DEV_DESTROY: libc::c_ulong = ioc(IOC_NONE, b'U', 2, 0);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{ABS_MT_POSITION_X, EV_ABS};

    #[test]
    fn ioctl_numbers_match_kernel_headers() {
        assert_eq!(UI_SET_EVBIT, 0x4004_5564);
        assert_eq!(UI_SET_ABSBIT, 0x4004_5567);
        assert_eq!(UI_SET_PROPBIT, 0x4004_556e);
        assert_eq!(UI_DEV_CREATE, 0x5501);
        assert_eq!(UI_DEV_DESTROY, 0x5502);
        assert_eq!(eviocgbit(EV_ABS, 8), 0x8008_4523);
        assert_eq!(eviocgabs(ABS_MT_POSITION_X), 0x8018_4575);
    }

    #[test]
    fn struct_layouts_match_kernel_abi() {
        assert_eq!(std::mem::size_of::<input_id>(), 8);
        assert_eq!(std::mem::size_of::<input_absinfo>(), 24);
        assert_eq!(std::mem::size_of::<uinput_user_dev>(), 1116);
        assert_eq!(
            std::mem::size_of::<timeval>(),
            std::mem::size_of::<libc::timeval>()
        );
        assert_eq!(
            std::mem::size_of::<input_event>(),
            std::mem::size_of::<timeval>() + 8
        );
    }
}
