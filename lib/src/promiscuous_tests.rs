use super::*;

#[test]
fn rejects_names_the_kernel_cannot_hold() {
    let res = interface_flags("this-name-is-far-too-long");
    assert!(matches!(res, Err(FrameIoError::InvalidInterfaceName(_))));

    let res = interface_flags("");
    assert!(matches!(res, Err(FrameIoError::InvalidInterfaceName(_))));
}

#[test]
fn reports_flag_control_error_for_bogus_interface() {
    let res = is_promiscuous("bogus0");
    assert!(matches!(res, Err(FrameIoError::FlagControl { .. })));
}

#[cfg(target_os = "linux")]
#[test]
fn reads_loopback_flags() {
    let flags = interface_flags("lo").unwrap();
    assert_ne!(flags & libc::IFF_LOOPBACK as libc::c_short, 0);
}

#[cfg(target_os = "linux")]
#[test]
#[ignore = "requires CAP_NET_ADMIN"]
fn toggling_promiscuous_mode_is_idempotent() {
    let initial = is_promiscuous("lo").unwrap();

    set_promiscuous("lo", true).unwrap();
    assert!(is_promiscuous("lo").unwrap());

    set_promiscuous("lo", true).unwrap();
    assert!(is_promiscuous("lo").unwrap());

    set_promiscuous("lo", false).unwrap();
    assert!(!is_promiscuous("lo").unwrap());

    set_promiscuous("lo", initial).unwrap();
}

#[cfg(target_os = "linux")]
#[test]
#[ignore = "requires CAP_NET_ADMIN"]
fn guard_restores_previous_state() {
    set_promiscuous("lo", false).unwrap();

    let guard = PromiscuousGuard::enable("lo").unwrap();
    assert!(is_promiscuous("lo").unwrap());
    guard.restore().unwrap();
    assert!(!is_promiscuous("lo").unwrap());

    {
        let _guard = PromiscuousGuard::enable("lo").unwrap();
        assert!(is_promiscuous("lo").unwrap());
    }
    assert!(!is_promiscuous("lo").unwrap());
}

#[cfg(target_os = "linux")]
#[test]
#[ignore = "requires CAP_NET_ADMIN"]
fn guard_leaves_already_promiscuous_interface_alone() {
    set_promiscuous("lo", true).unwrap();

    let guard = PromiscuousGuard::enable("lo").unwrap();
    guard.restore().unwrap();
    assert!(is_promiscuous("lo").unwrap());

    set_promiscuous("lo", false).unwrap();
}
