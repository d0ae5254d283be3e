use std::{env, time::Duration};

use r_lanio::{FrameIO, MAX_FRAME_SIZE, NetIo, network};

fn is_root() -> bool {
    match env::var("USER") {
        Ok(val) => val == "root",
        Err(_e) => false,
    }
}

fn main() {
    if !is_root() {
        panic!("permission denied: must run with root privileges");
    }

    let interface =
        network::get_default_interface().expect("cannot find interface");
    let io = NetIo::for_current_host(&interface.name)
        .expect("failed to create frame io");

    let capture = io.receive(MAX_FRAME_SIZE).expect("failed to start capture");

    // zeroed addresses, IPv4 ethertype, no payload
    let mut frame = [0u8; 14];
    frame[12..14].copy_from_slice(&0x0800u16.to_be_bytes());

    let written = io.send(&frame).expect("failed to send frame");
    println!("sent {} bytes on {}", written, interface.name);

    let mut received = 0;

    while let Ok(frame) = capture.frames().recv_timeout(Duration::from_secs(2))
    {
        received += 1;
        println!("captured {} bytes", frame.len());

        if received == 10 {
            break;
        }
    }

    if let Err(e) = capture.stop() {
        panic!("error: {:?}", e);
    }

    println!("captured {} frames", received);
}
