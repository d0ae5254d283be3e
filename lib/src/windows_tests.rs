use std::time::Duration;

use super::*;
use crate::error::FrameIoError;

fn windows_io(name: &str) -> WindowsIo {
    WindowsIo::new(InterfaceName::new(name).unwrap())
}

#[test]
fn rejects_oversized_frames_before_touching_the_os() {
    let io = windows_io("bogus0");
    let res = io.send(&vec![0u8; MAX_FRAME_SIZE + 1]);
    assert!(matches!(res, Err(FrameIoError::InvalidFrame(_))));
}

#[test]
fn rejects_a_second_concurrent_session() {
    let io = windows_io("bogus0");
    let _guard = io.session.acquire().unwrap();

    let res = io.receive(1500);
    assert!(matches!(res, Err(FrameIoError::SessionActive)));
}

#[test]
fn receive_reports_one_error_and_closes_on_unusable_interface() {
    let io = windows_io("bogus0");
    let capture = io.receive(1500).unwrap();

    assert!(capture.frames().recv_timeout(Duration::from_secs(5)).is_err());
    assert!(capture.errors().recv_timeout(Duration::from_secs(5)).is_ok());
    assert!(capture.errors().recv().is_err());
}

#[cfg(not(windows))]
#[test]
fn reports_unsupported_platform_off_windows() {
    let io = windows_io("bogus0");

    let res = io.send(&[0u8; 14]);
    assert!(matches!(res, Err(FrameIoError::UnsupportedPlatform(_))));

    let capture = io.receive(1500).unwrap();
    let res = capture.wait();
    assert!(matches!(res, Err(FrameIoError::UnsupportedPlatform(_))));
}
