//! Error types for device discovery, creation, injection and teardown.
//!
//! Every failure is surfaced at its point of origin as a distinct variant,
//! so callers can tell environment problems (no touchscreen, no accessible
//! uinput node) apart from protocol problems (the kernel rejected part of
//! the configuration) and runtime problems (a write failed on a device that
//! was already live).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::device::Capability;

/// Errors from scanning `/dev/input` for a calibration source.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input device directory could not be listed.
    #[error("cannot list input device directory {path}: {source}")]
    NoInputDirectory {
        /// Directory that was being listed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// No device advertising multi-touch absolute position was found.
    #[error("no multi-touch device found under {path}")]
    NoTouchDevice {
        /// Directory that was scanned.
        path: PathBuf,
    },

    /// The selected device rejected the X/Y calibration query.
    #[error("calibration query failed on {path}: {source}")]
    CalibrationUnavailable {
        /// Device node the query was issued on.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Errors from creating and activating the virtual device.
#[derive(Debug, Error)]
pub enum CreateError {
    /// Discovery of a real touch device failed, so there is no calibration
    /// to configure the virtual device with.
    #[error("touch calibration discovery failed: {0}")]
    Calibration(#[from] ScanError),

    /// None of the well-known uinput facility locations could be opened.
    #[error("no uinput facility available, tried {tried:?}: {source}")]
    FacilityUnavailable {
        /// Every location that was probed, in probe order.
        tried: Vec<PathBuf>,
        /// Failure from the last probe attempt.
        #[source]
        source: io::Error,
    },

    /// The facility rejected the device descriptor write.
    #[error("writing the device descriptor failed: {0}")]
    ConfigurationFailed(#[source] io::Error),

    /// The facility rejected one of the capability registrations.
    #[error("registering capability {capability} failed: {source}")]
    CapabilityRegistrationFailed {
        /// The registration that was rejected.
        capability: Capability,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The final device-instantiation request was rejected.
    #[error("device activation failed: {0}")]
    ActivationFailed(#[source] io::Error),
}

/// Errors from tearing the virtual device down.
#[derive(Debug, Error)]
pub enum DestroyError {
    /// The handle was already destroyed by an earlier call.
    #[error("device already destroyed")]
    AlreadyDestroyed,

    /// The device-removal request was rejected. The underlying handle is
    /// still released before this is returned.
    #[error("device teardown request failed: {0}")]
    TeardownFailed(#[source] io::Error),

    /// The removal request succeeded but releasing the handle failed.
    #[error("closing the facility handle failed: {0}")]
    CloseFailed(#[source] io::Error),
}

/// Errors from injecting a single event.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The handle was destroyed; no further events can be injected.
    #[error("device already destroyed")]
    DeviceDestroyed,

    /// The wall-clock timestamp for the event could not be obtained.
    #[error("wall-clock timestamp unavailable")]
    ClockUnavailable,

    /// The facility rejected the event write.
    #[error("event write failed: {0}")]
    IoFailed(#[source] io::Error),
}
