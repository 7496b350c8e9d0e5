//! The synthetic multi-touch device: creation, event injection, teardown.
//!
//! [`VirtualMultiTouch::create`] walks the whole lifecycle: discover
//! calibration from a real touchscreen, open the kernel's uinput facility,
//! write the device descriptor, register the capability set and activate
//! the node. The returned value owns the facility handle exclusively; every
//! failure along the way releases whatever was acquired before surfacing.
//!
//! The capability set is a fixed contract. Consumers of this device expect
//! exactly ten contact slots, touch-major 0–15, tracking IDs 0–65535 and
//! pressure 0–255, with X/Y bounds copied from the discovered hardware.

use std::ffi::CString;
use std::fmt;
use std::io;
use std::mem;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

use crate::codes::{
    ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_MT_TOUCH_MAJOR,
    ABS_MT_TRACKING_ID, BUS_USB, EV_ABS, EV_SYN, INPUT_PROP_DIRECT, SYN_REPORT,
};
use crate::error::{CreateError, DestroyError, WriteError};
use crate::scan::{self, AbsRange};
use crate::sys;

/// Facility locations probed in order; the first that opens wins. This list
/// is a compatibility contract across OS/device variants, not configurable.
pub const FACILITY_PATHS: [&str; 4] = [
    "/dev/uinput",
    "/dev/input/uinput",
    "/dev/misc/uinput",
    "/android/dev/uinput",
];

/// Width of the descriptor name field. Longer device names are silently
/// truncated at exactly this many bytes.
pub const DEVICE_NAME_CAPACITY: usize = sys::UINPUT_MAX_NAME_SIZE;

/// Protocol version reported in the device descriptor.
const DEVICE_VERSION: u16 = 4;

/// One registration request issued while configuring the device.
///
/// Also names the rejected request in
/// [`CreateError::CapabilityRegistrationFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The absolute-axis event class (`EV_ABS`).
    AbsoluteEvents,
    /// Contact slot axis.
    Slot,
    /// Touch-major axis.
    TouchMajor,
    /// Contact X position axis.
    PositionX,
    /// Contact Y position axis.
    PositionY,
    /// Tracking ID axis.
    TrackingId,
    /// Pressure axis.
    Pressure,
    /// The "direct input" device property.
    DirectInput,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::AbsoluteEvents => "EV_ABS",
            Capability::Slot => "ABS_MT_SLOT",
            Capability::TouchMajor => "ABS_MT_TOUCH_MAJOR",
            Capability::PositionX => "ABS_MT_POSITION_X",
            Capability::PositionY => "ABS_MT_POSITION_Y",
            Capability::TrackingId => "ABS_MT_TRACKING_ID",
            Capability::Pressure => "ABS_MT_PRESSURE",
            Capability::DirectInput => "INPUT_PROP_DIRECT",
        };
        f.write_str(name)
    }
}

/// Registration order. The kernel does not require one, but keeping it
/// fixed makes failures and captured request streams deterministic.
const REGISTRATION_ORDER: [Capability; 8] = [
    Capability::AbsoluteEvents,
    Capability::Slot,
    Capability::TouchMajor,
    Capability::PositionX,
    Capability::PositionY,
    Capability::TrackingId,
    Capability::Pressure,
    Capability::DirectInput,
];

/// The six absolute axes this device advertises, with their value ranges.
/// Everything except X/Y is fixed; X/Y come from the discovered hardware.
pub(crate) fn advertised_axes(x: AbsRange, y: AbsRange) -> [(u16, AbsRange); 6] {
    let fixed = |maximum| AbsRange { minimum: 0, maximum };
    [
        (ABS_MT_SLOT, fixed(9)),
        (ABS_MT_TOUCH_MAJOR, fixed(15)),
        (ABS_MT_POSITION_X, x),
        (ABS_MT_POSITION_Y, y),
        (ABS_MT_TRACKING_ID, fixed(65535)),
        (ABS_MT_PRESSURE, fixed(255)),
    ]
}

fn descriptor(name: &str, x: AbsRange, y: AbsRange) -> sys::uinput_user_dev {
    let mut dev = sys::uinput_user_dev::default();
    let bytes = name.as_bytes();
    let len = bytes.len().min(DEVICE_NAME_CAPACITY);
    dev.name[..len].copy_from_slice(&bytes[..len]);
    dev.id.bustype = BUS_USB;
    dev.id.version = DEVICE_VERSION;
    for (axis, range) in advertised_axes(x, y) {
        dev.absmin[axis as usize] = range.minimum;
        dev.absmax[axis as usize] = range.maximum;
    }
    dev
}

/// Low-level operations on an open device-creation facility handle.
///
/// The real implementation drives `/dev/uinput` through writes and ioctls;
/// tests substitute a recording fake.
pub(crate) trait Facility {
    fn write_descriptor(&mut self, desc: &sys::uinput_user_dev) -> io::Result<()>;
    fn enable_event_class(&mut self, class: u16) -> io::Result<()>;
    fn enable_axis(&mut self, axis: u16) -> io::Result<()>;
    fn enable_property(&mut self, property: u16) -> io::Result<()>;
    fn activate(&mut self) -> io::Result<()>;
    fn teardown(&mut self) -> io::Result<()>;
    fn write_event(&mut self, event: &sys::input_event) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

/// An open write-only, non-blocking fd on one of the [`FACILITY_PATHS`].
pub(crate) struct UinputFd {
    fd: libc::c_int,
    closed: bool,
}

impl UinputFd {
    /// Probe the well-known facility locations in order.
    pub(crate) fn open() -> Result<Self, CreateError> {
        open_first(&FACILITY_PATHS, Self::open_path)
    }

    fn open_path(path: &str) -> io::Result<Self> {
        let cpath = CString::new(path).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
        let fd = unsafe { libc::open(cpath.as_ptr(), libc::O_WRONLY | libc::O_NONBLOCK) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd, closed: false })
    }

    fn ioctl_with_arg(&self, request: libc::c_ulong, arg: libc::c_int) -> io::Result<()> {
        let rc = unsafe { libc::ioctl(self.fd, request, arg) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn ioctl_bare(&self, request: libc::c_ulong) -> io::Result<()> {
        let rc = unsafe { libc::ioctl(self.fd, request) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn write_struct<T>(&self, value: &T) -> io::Result<()> {
        let rc = unsafe {
            libc::write(
                self.fd,
                (value as *const T).cast::<libc::c_void>(),
                mem::size_of::<T>(),
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Facility for UinputFd {
    fn write_descriptor(&mut self, desc: &sys::uinput_user_dev) -> io::Result<()> {
        self.write_struct(desc)
    }

    fn enable_event_class(&mut self, class: u16) -> io::Result<()> {
        self.ioctl_with_arg(sys::UI_SET_EVBIT, libc::c_int::from(class))
    }

    fn enable_axis(&mut self, axis: u16) -> io::Result<()> {
        self.ioctl_with_arg(sys::UI_SET_ABSBIT, libc::c_int::from(axis))
    }

    fn enable_property(&mut self, property: u16) -> io::Result<()> {
        self.ioctl_with_arg(sys::UI_SET_PROPBIT, libc::c_int::from(property))
    }

    fn activate(&mut self) -> io::Result<()> {
        self.ioctl_bare(sys::UI_DEV_CREATE)
    }

    fn teardown(&mut self) -> io::Result<()> {
        self.ioctl_bare(sys::UI_DEV_DESTROY)
    }

    fn write_event(&mut self, event: &sys::input_event) -> io::Result<()> {
        self.write_struct(event)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let rc = unsafe { libc::close(self.fd) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl Drop for UinputFd {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            unsafe { libc::close(self.fd) };
        }
    }
}

/// Lifecycle tag of the owned handle. `Unopened` has no representation; a
/// controller only exists once the facility handle is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Configured,
    Active,
    Destroyed,
}

/// Controller generic over the facility seam; the public wrapper pins the
/// real uinput backend.
pub(crate) struct Controller<F: Facility> {
    facility: F,
    state: HandleState,
}

impl<F: Facility> Controller<F> {
    /// Write the descriptor, register the capability set and activate the
    /// device. Any failure closes `facility` before returning.
    pub(crate) fn configure(
        mut facility: F,
        name: &str,
        x: AbsRange,
        y: AbsRange,
    ) -> Result<Self, CreateError> {
        if let Err(source) = facility.write_descriptor(&descriptor(name, x, y)) {
            close_quietly(&mut facility);
            return Err(CreateError::ConfigurationFailed(source));
        }

        for capability in REGISTRATION_ORDER {
            if let Err(source) = register(&mut facility, capability) {
                close_quietly(&mut facility);
                return Err(CreateError::CapabilityRegistrationFailed { capability, source });
            }
        }

        let mut controller = Self {
            facility,
            state: HandleState::Configured,
        };
        match controller.facility.activate() {
            Ok(()) => {
                controller.state = HandleState::Active;
                Ok(controller)
            }
            Err(source) => {
                close_quietly(&mut controller.facility);
                // Marked destroyed so drop does not touch the handle again.
                controller.state = HandleState::Destroyed;
                Err(CreateError::ActivationFailed(source))
            }
        }
    }

    pub(crate) fn write_event(
        &mut self,
        event_type: u16,
        code: u16,
        value: i32,
    ) -> Result<(), WriteError> {
        if self.state != HandleState::Active {
            return Err(WriteError::DeviceDestroyed);
        }
        let event = sys::input_event {
            time: wall_clock()?,
            event_type,
            code,
            value,
        };
        self.facility.write_event(&event).map_err(WriteError::IoFailed)
    }

    pub(crate) fn syn_report(&mut self) -> Result<(), WriteError> {
        self.write_event(EV_SYN, SYN_REPORT, 0)
    }

    pub(crate) fn destroy(&mut self) -> Result<(), DestroyError> {
        if self.state == HandleState::Destroyed {
            return Err(DestroyError::AlreadyDestroyed);
        }
        // Attempt both steps even if the first fails; the handle must not
        // leak. A teardown failure takes precedence in the report.
        let teardown = self.facility.teardown();
        let close = self.facility.close();
        self.state = HandleState::Destroyed;
        match (teardown, close) {
            (Err(source), _) => Err(DestroyError::TeardownFailed(source)),
            (Ok(()), Err(source)) => Err(DestroyError::CloseFailed(source)),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl<F: Facility> Drop for Controller<F> {
    fn drop(&mut self) {
        if self.state == HandleState::Destroyed {
            return;
        }
        if self.state == HandleState::Active {
            if let Err(err) = self.facility.teardown() {
                warn!("teardown of dropped virtual device failed: {err}");
            }
        }
        close_quietly(&mut self.facility);
    }
}

fn register<F: Facility>(facility: &mut F, capability: Capability) -> io::Result<()> {
    match capability {
        Capability::AbsoluteEvents => facility.enable_event_class(EV_ABS),
        Capability::Slot => facility.enable_axis(ABS_MT_SLOT),
        Capability::TouchMajor => facility.enable_axis(ABS_MT_TOUCH_MAJOR),
        Capability::PositionX => facility.enable_axis(ABS_MT_POSITION_X),
        Capability::PositionY => facility.enable_axis(ABS_MT_POSITION_Y),
        Capability::TrackingId => facility.enable_axis(ABS_MT_TRACKING_ID),
        Capability::Pressure => facility.enable_axis(ABS_MT_PRESSURE),
        Capability::DirectInput => facility.enable_property(INPUT_PROP_DIRECT),
    }
}

/// Try each candidate path in order; the first that opens wins. When every
/// probe fails, the error lists all attempted paths and carries the last
/// failure as the cause.
fn open_first<T>(
    paths: &[&str],
    mut open: impl FnMut(&str) -> io::Result<T>,
) -> Result<T, CreateError> {
    let mut last_err = None;
    for path in paths {
        match open(path) {
            Ok(handle) => {
                debug!("opened uinput facility at {path}");
                return Ok(handle);
            }
            Err(err) => {
                debug!("uinput facility probe {path} failed: {err}");
                last_err = Some(err);
            }
        }
    }
    Err(CreateError::FacilityUnavailable {
        tried: paths.iter().map(PathBuf::from).collect(),
        source: last_err.unwrap_or_else(|| io::ErrorKind::NotFound.into()),
    })
}

fn close_quietly<F: Facility>(facility: &mut F) {
    if let Err(err) = facility.close() {
        warn!("failed to close uinput facility handle: {err}");
    }
}

fn wall_clock() -> Result<sys::timeval, WriteError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| WriteError::ClockUnavailable)?;
    Ok(sys::timeval {
        tv_sec: now.as_secs() as libc::time_t,
        tv_usec: now.subsec_micros() as libc::suseconds_t,
    })
}

/// A live synthetic multi-touch device.
///
/// Created by [`VirtualMultiTouch::create`] and alive until
/// [`VirtualMultiTouch::destroy`] or drop. Not internally synchronized:
/// concurrent `write_event` calls on one device must be serialized by the
/// caller.
pub struct VirtualMultiTouch {
    inner: Controller<UinputFd>,
}

impl VirtualMultiTouch {
    /// Create and activate a virtual multi-touch device named `name`.
    ///
    /// Names longer than [`DEVICE_NAME_CAPACITY`] bytes are silently
    /// truncated. The call blocks on kernel I/O but performs no retries and
    /// spawns no threads.
    ///
    /// # Errors
    ///
    /// See [`CreateError`]; no kernel resource is leaked on any failure
    /// path.
    pub fn create(name: &str) -> Result<Self, CreateError> {
        let (x, y) = scan::find_touch_calibration()?;
        debug!(
            "calibration: x {}..={}, y {}..={}",
            x.minimum, x.maximum, y.minimum, y.maximum
        );
        let facility = UinputFd::open()?;
        let inner = Controller::configure(facility, name, x, y)?;
        info!("virtual multi-touch device {name:?} active");
        Ok(Self { inner })
    }

    /// Inject one raw input event, stamped with the current wall-clock
    /// time.
    ///
    /// The triple passes through unmodified; sequencing semantics (slot
    /// selection before positions, `EV_SYN` report boundaries) are the
    /// caller's protocol. Writes reach the device in call order.
    ///
    /// # Errors
    ///
    /// See [`WriteError`]. There is no internal retry.
    pub fn write_event(&mut self, event_type: u16, code: u16, value: i32) -> Result<(), WriteError> {
        self.inner.write_event(event_type, code, value)
    }

    /// Emit a `SYN_REPORT` boundary, closing the current input frame.
    pub fn syn_report(&mut self) -> Result<(), WriteError> {
        self.inner.syn_report()
    }

    /// Remove the device node and release the facility handle.
    ///
    /// Both steps are attempted even if the first fails. Calling `destroy`
    /// again on the same value is rejected with
    /// [`DestroyError::AlreadyDestroyed`]. Dropping an active device
    /// performs the same teardown best-effort, logging failures instead of
    /// reporting them.
    pub fn destroy(&mut self) -> Result<(), DestroyError> {
        self.inner.destroy()
    }
}

impl fmt::Debug for VirtualMultiTouch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualMultiTouch")
            .field("state", &self.inner.state)
            .finish()
    }
}
