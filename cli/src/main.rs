//! CLI for sending and capturing raw link-layer frames
//!
//! # Examples
//!
//! ```bash
//! # help menu
//! sudo r-lanio --help
//!
//! # list interfaces
//! r-lanio --list
//!
//! # send an ARP request on the default interface and print 5 frames
//! sudo r-lanio --target 192.168.1.1 --count 5
//! ```
use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use log::*;
use r_lanio::{
    FrameIO, MAX_FRAME_SIZE, NetIo,
    network::{self, NetworkInterface},
    platform::FrameIoConfig,
};
use std::net::Ipv4Addr;

mod probe;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// CLI for sending and capturing raw link-layer frames
struct Args {
    /// Choose a specific network interface, defaults to the host's default
    /// interface
    #[arg(short, long)]
    interface: Option<String>,

    /// List available network interfaces and exit
    #[arg(short, long, default_value_t = false)]
    list: bool,

    /// Send an ARP request for this IPv4 address instead of the minimal
    /// 14 byte probe frame
    #[arg(short, long)]
    target: Option<Ipv4Addr>,

    /// Maximum number of bytes captured per frame
    #[arg(long, default_value_t = MAX_FRAME_SIZE, value_parser = parse_frame_size)]
    max_frame_size: usize,

    /// Number of frames to capture before exiting
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Do not put the interface in promiscuous mode
    #[arg(long, default_value_t = false)]
    no_promiscuous: bool,

    /// Only capture frames, send nothing
    #[arg(long, default_value_t = false)]
    receive_only: bool,

    /// Prints debug logs including those from r-lanio
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Only print errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[doc(hidden)]
fn parse_frame_size(value: &str) -> std::result::Result<usize, String> {
    let size: usize = value.parse().map_err(|e| format!("{}", e))?;

    if size == 0 || size > MAX_FRAME_SIZE {
        return Err(format!("must be between 1 and {}", MAX_FRAME_SIZE));
    }

    Ok(size)
}

#[doc(hidden)]
fn initialize_logger(args: &Args) -> Result<()> {
    let filter = if args.quiet {
        simplelog::LevelFilter::Error
    } else if args.debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    simplelog::TermLogger::init(
        filter,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[doc(hidden)]
fn print_args(args: &Args, interface: &NetworkInterface) {
    info!("configuration:");
    info!("interface:      {}", interface.name);
    info!("index:          {}", interface.index);
    info!("mac:            {}", display_mac(interface));
    info!("target:         {:?}", args.target);
    info!("max_frame_size: {}", args.max_frame_size);
    info!("count:          {}", args.count);
    info!("promiscuous:    {}", !args.no_promiscuous);
    info!("receive_only:   {}", args.receive_only);
}

#[doc(hidden)]
fn display_mac(interface: &NetworkInterface) -> String {
    interface.mac.map(|mac| mac.to_string()).unwrap_or_default()
}

#[doc(hidden)]
fn print_interfaces(interfaces: &[NetworkInterface]) {
    let mut table = prettytable::Table::new();

    table.add_row(prettytable::row!["NAME", "INDEX", "MAC", "IPV4", "DESCRIPTION"]);

    for i in interfaces {
        let ipv4 = i.ipv4.map(|ip| ip.to_string()).unwrap_or_default();
        table.add_row(prettytable::row![
            i.name,
            i.index,
            display_mac(i),
            ipv4,
            i.description
        ]);
    }

    table.printstd();
}

#[doc(hidden)]
fn select_interface(args: &Args) -> Result<NetworkInterface> {
    match &args.interface {
        Some(name) => network::get_interface(name)
            .map_err(|_| eyre!("Could not find network interface: {}", name)),
        None => network::get_default_interface()
            .map_err(|_| eyre!("Could not detect default network interface")),
    }
}

#[doc(hidden)]
fn build_frame(args: &Args, interface: &NetworkInterface) -> Result<Vec<u8>> {
    match args.target {
        Some(target) => {
            let source = interface.ipv4.ok_or_else(|| {
                eyre!("interface {} has no IPv4 address", interface.name)
            })?;
            let mac = interface.mac.ok_or_else(|| {
                eyre!("interface {} has no hardware address", interface.name)
            })?;
            Ok(probe::arp_request(source, mac, target)?.to_vec())
        }
        None => Ok(probe::minimal_probe()?.to_vec()),
    }
}

#[doc(hidden)]
fn process_capture(
    io: &dyn FrameIO,
    args: &Args,
    frame: Option<&[u8]>,
) -> Result<usize> {
    let capture = io.receive(args.max_frame_size)?;

    if let Some(frame) = frame {
        let written = io.send(frame)?;
        info!("sent {} byte frame: {}", written, probe::to_hex(frame));
    }

    let mut received = 0;

    for frame in capture.frames().iter().take(args.count) {
        received += 1;
        info!(
            "frame {} ({} bytes): {}",
            received,
            frame.len(),
            probe::to_hex(&frame)
        );
    }

    capture.stop()?;

    debug!("capture complete: {} frames", received);

    Ok(received)
}

#[doc(hidden)]
#[cfg(unix)]
fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[doc(hidden)]
#[cfg(windows)]
fn is_root() -> bool {
    // raw frame access requires an elevated session, which `net session`
    // also requires
    use std::process::Command;
    Command::new("net")
        .args(["session"])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[doc(hidden)]
fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(&args)?;

    if args.list {
        print_interfaces(&network::list_interfaces());
        return Ok(());
    }

    if !is_root() {
        return Err(eyre!("permission denied: must run with root privileges"));
    }

    let interface = select_interface(&args)?;

    print_args(&args, &interface);

    let config = FrameIoConfig::builder()
        .interface(interface.name.clone())
        .promiscuous(!args.no_promiscuous)
        .build()?;

    let io = NetIo::from_config(&config)?;

    let frame = if args.receive_only {
        None
    } else {
        Some(build_frame(&args, &interface)?)
    };

    process_capture(&io, &args, frame.as_deref())?;

    Ok(())
}

#[cfg(test)]
#[path = "./main_tests.rs"]
mod tests;
