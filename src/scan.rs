//! Discovery of a real multi-touch device and its X/Y calibration.
//!
//! The virtual device advertises the same position ranges as whatever
//! touchscreen is already present on the system, so consumers see
//! coordinates in the native resolution of the hardware. The scan walks
//! `/dev/input`, keeps the first node whose `EV_ABS` capability bitmask
//! sets both multi-touch position bits, and reads its axis calibration.
//!
//! Candidates that cannot be opened or queried are skipped: most entries
//! under `/dev/input` are not touch devices, and some are inaccessible
//! without extra privileges. That per-candidate tolerance ends once a
//! qualifying device is found; a calibration failure there fails the scan.

use std::fs;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use log::debug;

use crate::bitmask::{ABS_BITMASK_LEN, AbsBitmask};
use crate::codes::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y, EV_ABS};
use crate::error::ScanError;
use crate::sys;

/// Directory scanned for candidate input device nodes.
pub const INPUT_DIR: &str = "/dev/input";

/// Calibration bounds of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsRange {
    /// Smallest value the axis reports.
    pub minimum: i32,
    /// Largest value the axis reports.
    pub maximum: i32,
}

/// Find the X and Y calibration of the first multi-touch device on the
/// system.
///
/// Every call redoes the full directory scan; nothing is cached and no
/// device handle outlives the call. With an unchanged device set the result
/// is the same on every call.
///
/// # Errors
///
/// [`ScanError::NoInputDirectory`] if `/dev/input` cannot be listed,
/// [`ScanError::NoTouchDevice`] if no candidate qualifies, and
/// [`ScanError::CalibrationUnavailable`] if the qualifying device rejects
/// the calibration query.
pub fn find_touch_calibration() -> Result<(AbsRange, AbsRange), ScanError> {
    scan_with(&EvdevProbe::new(INPUT_DIR))
}

/// Enumerates candidate device nodes and opens them for querying.
///
/// Split out from the scan algorithm so tests can drive it with synthetic
/// directory listings and capability bitmasks.
pub(crate) trait DeviceProbe {
    type Device: DeviceQuery;

    /// Directory the candidates come from, for error reporting.
    fn root(&self) -> &Path;

    /// List candidate device nodes. Failure here fails the whole scan.
    fn candidates(&self) -> io::Result<Vec<PathBuf>>;

    /// Open one candidate read-only.
    fn open(&self, path: &Path) -> io::Result<Self::Device>;
}

/// Capability and calibration queries on one opened device node.
pub(crate) trait DeviceQuery {
    /// Read the `EV_ABS` capability bitmask.
    fn abs_bitmask(&self) -> io::Result<AbsBitmask>;

    /// Read the calibration of one absolute axis.
    fn abs_range(&self, axis: u16) -> io::Result<AbsRange>;
}

pub(crate) fn scan_with<P: DeviceProbe>(probe: &P) -> Result<(AbsRange, AbsRange), ScanError> {
    let candidates = probe
        .candidates()
        .map_err(|source| ScanError::NoInputDirectory {
            path: probe.root().to_path_buf(),
            source,
        })?;

    for path in candidates {
        let device = match probe.open(&path) {
            Ok(device) => device,
            Err(err) => {
                debug!("skipping {}: {err}", path.display());
                continue;
            }
        };
        let mask = match device.abs_bitmask() {
            Ok(mask) => mask,
            Err(err) => {
                debug!("skipping {}: EV_ABS bitmask query failed: {err}", path.display());
                continue;
            }
        };
        if !mask.is_set(ABS_MT_POSITION_X) || !mask.is_set(ABS_MT_POSITION_Y) {
            continue;
        }

        // First qualifying device wins. If its calibration cannot be read
        // the scan fails rather than falling back to a later device.
        debug!("using {} as calibration source", path.display());
        let calibrate = |axis| {
            device
                .abs_range(axis)
                .map_err(|source| ScanError::CalibrationUnavailable {
                    path: path.clone(),
                    source,
                })
        };
        let x = calibrate(ABS_MT_POSITION_X)?;
        let y = calibrate(ABS_MT_POSITION_Y)?;
        return Ok((x, y));
    }

    Err(ScanError::NoTouchDevice {
        path: probe.root().to_path_buf(),
    })
}

/// The real probe over `/dev/input` evdev nodes.
pub(crate) struct EvdevProbe {
    root: PathBuf,
}

impl EvdevProbe {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DeviceProbe for EvdevProbe {
    type Device = EvdevNode;

    fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self) -> io::Result<Vec<PathBuf>> {
        // read_dir already omits the `.` and `..` pseudo-entries; everything
        // else is a candidate. Sorted so repeated scans pick the same device.
        let mut paths = fs::read_dir(&self.root)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        paths.sort();
        Ok(paths)
    }

    fn open(&self, path: &Path) -> io::Result<EvdevNode> {
        let file = fs::OpenOptions::new().read(true).open(path)?;
        Ok(EvdevNode { fd: file.into() })
    }
}

/// A transiently opened evdev node. The fd is released on drop.
pub(crate) struct EvdevNode {
    fd: OwnedFd,
}

impl DeviceQuery for EvdevNode {
    fn abs_bitmask(&self) -> io::Result<AbsBitmask> {
        let mut mask = AbsBitmask::empty();
        let rc = unsafe {
            libc::ioctl(
                self.fd.as_raw_fd(),
                sys::eviocgbit(EV_ABS, ABS_BITMASK_LEN),
                mask.0.as_mut_ptr(),
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(mask)
    }

    fn abs_range(&self, axis: u16) -> io::Result<AbsRange> {
        let mut info = sys::input_absinfo::default();
        let rc = unsafe {
            libc::ioctl(
                self.fd.as_raw_fd(),
                sys::eviocgabs(axis),
                &mut info as *mut sys::input_absinfo,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(AbsRange {
            minimum: info.minimum,
            maximum: info.maximum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct FakeDevice {
        open_fails: bool,
        // None means the corresponding query is rejected.
        mask: Option<AbsBitmask>,
        x: Option<AbsRange>,
        y: Option<AbsRange>,
    }

    impl FakeDevice {
        fn multi_touch(x: AbsRange, y: AbsRange) -> Self {
            let mut mask = AbsBitmask::empty();
            mask.set(ABS_MT_POSITION_X);
            mask.set(ABS_MT_POSITION_Y);
            Self {
                mask: Some(mask),
                x: Some(x),
                y: Some(y),
                ..Self::default()
            }
        }

        fn with_axes(axes: &[u16]) -> Self {
            let mut mask = AbsBitmask::empty();
            for &axis in axes {
                mask.set(axis);
            }
            Self {
                mask: Some(mask),
                ..Self::default()
            }
        }
    }

    impl DeviceQuery for FakeDevice {
        fn abs_bitmask(&self) -> io::Result<AbsBitmask> {
            self.mask.ok_or_else(|| io::ErrorKind::Unsupported.into())
        }

        fn abs_range(&self, axis: u16) -> io::Result<AbsRange> {
            let range = match axis {
                ABS_MT_POSITION_X => self.x,
                ABS_MT_POSITION_Y => self.y,
                _ => None,
            };
            range.ok_or_else(|| io::ErrorKind::InvalidInput.into())
        }
    }

    struct FakeProbe {
        listing_fails: bool,
        devices: Vec<(PathBuf, FakeDevice)>,
    }

    impl FakeProbe {
        fn new(devices: Vec<(&str, FakeDevice)>) -> Self {
            Self {
                listing_fails: false,
                devices: devices
                    .into_iter()
                    .map(|(name, dev)| (PathBuf::from("/dev/input").join(name), dev))
                    .collect(),
            }
        }
    }

    impl DeviceProbe for FakeProbe {
        type Device = FakeDevice;

        fn root(&self) -> &Path {
            Path::new("/dev/input")
        }

        fn candidates(&self) -> io::Result<Vec<PathBuf>> {
            if self.listing_fails {
                return Err(io::ErrorKind::PermissionDenied.into());
            }
            Ok(self.devices.iter().map(|(path, _)| path.clone()).collect())
        }

        fn open(&self, path: &Path) -> io::Result<FakeDevice> {
            let (_, device) = self
                .devices
                .iter()
                .find(|(candidate, _)| candidate == path)
                .expect("probe opened an unlisted path");
            if device.open_fails {
                return Err(io::ErrorKind::PermissionDenied.into());
            }
            Ok(device.clone())
        }
    }

    const X: AbsRange = AbsRange {
        minimum: 0,
        maximum: 1919,
    };
    const Y: AbsRange = AbsRange {
        minimum: 0,
        maximum: 1079,
    };

    #[test]
    fn unlistable_directory_fails_scan() {
        let mut probe = FakeProbe::new(vec![]);
        probe.listing_fails = true;
        assert!(matches!(
            scan_with(&probe),
            Err(ScanError::NoInputDirectory { .. })
        ));
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let probe = FakeProbe::new(vec![]);
        assert!(matches!(
            scan_with(&probe),
            Err(ScanError::NoTouchDevice { .. })
        ));
    }

    #[test]
    fn devices_without_both_position_bits_never_qualify() {
        use crate::codes::{ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_MT_TRACKING_ID};
        let probe = FakeProbe::new(vec![
            // Plenty of other abs bits, but never X and Y together.
            ("event0", FakeDevice::with_axes(&[0, 1])),
            ("event1", FakeDevice::with_axes(&[ABS_MT_POSITION_X, ABS_MT_SLOT])),
            ("event2", FakeDevice::with_axes(&[ABS_MT_POSITION_Y, ABS_MT_PRESSURE])),
            ("event3", FakeDevice::with_axes(&[ABS_MT_SLOT, ABS_MT_TRACKING_ID])),
        ]);
        assert!(matches!(
            scan_with(&probe),
            Err(ScanError::NoTouchDevice { .. })
        ));
    }

    #[test]
    fn unreadable_candidates_are_skipped() {
        let unreadable = FakeDevice {
            open_fails: true,
            ..FakeDevice::default()
        };
        let no_bitmask = FakeDevice::default(); // bitmask query fails
        let probe = FakeProbe::new(vec![
            ("event0", unreadable),
            ("js0", no_bitmask),
            ("event1", FakeDevice::multi_touch(X, Y)),
        ]);
        assert_eq!(scan_with(&probe).unwrap(), (X, Y));
    }

    #[test]
    fn first_qualifying_device_wins() {
        let other = AbsRange {
            minimum: 0,
            maximum: 4095,
        };
        let probe = FakeProbe::new(vec![
            ("event0", FakeDevice::multi_touch(X, Y)),
            ("event1", FakeDevice::multi_touch(other, other)),
        ]);
        assert_eq!(scan_with(&probe).unwrap(), (X, Y));
    }

    #[test]
    fn calibration_failure_on_chosen_device_fails_scan() {
        // Qualifies by bitmask but rejects the calibration query; a healthy
        // device later in the listing must not be used as a fallback.
        let mut broken = FakeDevice::multi_touch(X, Y);
        broken.x = None;
        let probe = FakeProbe::new(vec![
            ("event0", broken),
            ("event1", FakeDevice::multi_touch(X, Y)),
        ]);
        assert!(matches!(
            scan_with(&probe),
            Err(ScanError::CalibrationUnavailable { .. })
        ));
    }

    #[test]
    fn repeated_scans_are_idempotent() {
        let probe = FakeProbe::new(vec![
            ("event0", FakeDevice::with_axes(&[0, 1])),
            ("event1", FakeDevice::multi_touch(X, Y)),
        ]);
        let first = scan_with(&probe).unwrap();
        let second = scan_with(&probe).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, (X, Y));
    }
}
