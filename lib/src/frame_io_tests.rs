use super::*;

#[test]
fn rejects_empty_frames() {
    let res = validate_frame(&[]);
    assert!(matches!(res, Err(FrameIoError::InvalidFrame(_))));
}

#[test]
fn rejects_oversized_frames() {
    let frame = vec![0u8; MAX_FRAME_SIZE + 1];
    let res = validate_frame(&frame);
    assert!(matches!(res, Err(FrameIoError::InvalidFrame(_))));
}

#[test]
fn accepts_frames_within_bounds() {
    assert!(validate_frame(&[0u8; 14]).is_ok());
    assert!(validate_frame(&vec![0u8; MAX_FRAME_SIZE]).is_ok());
}

#[test]
fn frame_owns_a_copy_of_its_bytes() {
    let mut buffer = vec![1u8, 2, 3];
    let frame = Frame::from(&buffer[..]);
    buffer.copy_from_slice(&[9, 9, 9]);

    assert_eq!(frame.as_bytes(), &[1, 2, 3]);
    assert_eq!(frame.len(), 3);
    assert_eq!(Vec::from(frame), vec![1, 2, 3]);
}

#[test]
fn rejects_empty_interface_names() {
    let res = InterfaceName::new("");
    assert!(matches!(res, Err(FrameIoError::InvalidInterfaceName(_))));
}

#[test]
fn rejects_interface_names_with_nul() {
    let res = InterfaceName::new("eth\00");
    assert!(matches!(res, Err(FrameIoError::InvalidInterfaceName(_))));
}

#[test]
fn parses_interface_names() {
    let name: InterfaceName = "eth0".parse().unwrap();
    assert_eq!(name.as_str(), "eth0");
    assert_eq!(name.to_string(), "eth0");
    assert_eq!(name.to_cstring().unwrap().as_bytes(), b"eth0");
}
