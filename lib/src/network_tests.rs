use super::*;

#[test]
fn returns_error_for_bogus_interface_name() {
    let res = get_interface("noop");
    assert!(matches!(res, Err(FrameIoError::InterfaceNotFound(_))));
}

#[cfg(target_os = "linux")]
#[test]
fn returns_loopback_interface_by_name() {
    let iface = get_interface("lo").unwrap();
    assert_eq!(iface.name, "lo");
    assert!(iface.is_loopback);
    assert!(iface.index > 0);
}

#[cfg(target_os = "linux")]
#[test]
fn lists_the_loopback_interface() {
    let interfaces = list_interfaces();
    assert!(interfaces.iter().any(|i| i.name == "lo"));
}

#[test]
fn converts_pnet_interfaces() {
    let pnet_iface = PNetNetworkInterface {
        name: "eth7".to_string(),
        description: "test interface".to_string(),
        index: 7,
        mac: Some(MacAddr::new(0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e)),
        ips: vec![],
        flags: 0,
    };

    let iface = NetworkInterface::from(pnet_iface);

    assert_eq!(iface.name, "eth7");
    assert_eq!(iface.index, 7);
    assert_eq!(
        iface.mac_octets(),
        Some([0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e])
    );
    assert!(!iface.is_up);
    assert_eq!(iface.ipv4, None);
}

#[test]
fn keeps_missing_hardware_addresses_absent() {
    let pnet_iface = PNetNetworkInterface {
        name: "tun0".to_string(),
        description: String::new(),
        index: 3,
        mac: None,
        ips: vec![],
        flags: 0,
    };

    let iface = NetworkInterface::from(pnet_iface);
    assert_eq!(iface.mac, None);
    assert_eq!(iface.mac_octets(), None);
}
