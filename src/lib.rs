//! # synthtouch
//!
//! Synthetic multi-touch input device injection for Linux.
//!
//! This crate registers a virtual touchscreen through the kernel's uinput
//! facility and lets a process inject raw multi-touch events (finger down,
//! move, lift, multi-finger tracking) as if real hardware produced them.
//! Position calibration is discovered from a touch-capable device already
//! present on the system, so injected coordinates match the native screen
//! resolution. Intended for automation and testing tools that drive touch
//! gestures without physical input.
//!
//! ## Quick Start
//!
//! ```no_run
//! use synthtouch::{VirtualMultiTouch, codes};
//!
//! let mut touch = VirtualMultiTouch::create("synthtouch")?;
//!
//! // Press finger 0.
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_SLOT, 0)?;
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_TRACKING_ID, 1)?;
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_POSITION_X, 640)?;
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_POSITION_Y, 360)?;
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_PRESSURE, 128)?;
//! touch.syn_report()?;
//!
//! // Lift it.
//! touch.write_event(codes::EV_ABS, codes::ABS_MT_TRACKING_ID, -1)?;
//! touch.syn_report()?;
//!
//! touch.destroy()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Permissions
//!
//! Creating the device requires write access to `/dev/uinput` (or one of
//! its alternate locations, see [`FACILITY_PATHS`]), and discovery needs
//! read access to `/dev/input`:
//!
//! ```bash
//! sudo usermod -aG input $USER
//! # Then log out and back in
//! ```
//!
//! ## Design
//!
//! Everything is synchronous and blocking with respect to the caller; the
//! crate spawns no threads and holds no global state. A
//! [`VirtualMultiTouch`] owns its kernel handle exclusively and is not
//! internally locked — serialize concurrent injection externally. Event
//! *sequencing* semantics (slot selection before positions, report
//! boundaries) belong to the caller; events pass through unmodified.

#[cfg(not(target_os = "linux"))]
compile_error!("synthtouch only supports Linux (uinput and evdev)");

pub mod bitmask;
pub mod codes;
pub mod device;
pub mod error;
pub mod scan;
mod sys;

// Re-exports
pub use bitmask::{ABS_BITMASK_LEN, AbsBitmask, bit_is_set};
pub use device::{Capability, DEVICE_NAME_CAPACITY, FACILITY_PATHS, VirtualMultiTouch};
pub use error::{CreateError, DestroyError, ScanError, WriteError};
pub use scan::{AbsRange, INPUT_DIR, find_touch_calibration};
