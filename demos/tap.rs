//! Inject a single tap at the centre of the discovered touchscreen.
//!
//! Run with `RUST_LOG=debug` to watch the discovery and configuration
//! steps. Needs access to /dev/input and /dev/uinput.

use std::thread;
use std::time::Duration;

use synthtouch::{VirtualMultiTouch, codes, find_touch_calibration};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let (x, y) = find_touch_calibration()?;
    let centre_x = (x.minimum + x.maximum) / 2;
    let centre_y = (y.minimum + y.maximum) / 2;

    let mut touch = VirtualMultiTouch::create("synthtouch tap demo")?;
    // Give the compositor a moment to pick the new device up.
    thread::sleep(Duration::from_millis(200));

    println!("tapping at ({centre_x}, {centre_y})");

    touch.write_event(codes::EV_ABS, codes::ABS_MT_SLOT, 0)?;
    touch.write_event(codes::EV_ABS, codes::ABS_MT_TRACKING_ID, 1)?;
    touch.write_event(codes::EV_ABS, codes::ABS_MT_POSITION_X, centre_x)?;
    touch.write_event(codes::EV_ABS, codes::ABS_MT_POSITION_Y, centre_y)?;
    touch.write_event(codes::EV_ABS, codes::ABS_MT_TOUCH_MAJOR, 5)?;
    touch.write_event(codes::EV_ABS, codes::ABS_MT_PRESSURE, 128)?;
    touch.syn_report()?;

    thread::sleep(Duration::from_millis(60));

    touch.write_event(codes::EV_ABS, codes::ABS_MT_TRACKING_ID, -1)?;
    touch.syn_report()?;

    touch.destroy()?;
    Ok(())
}
