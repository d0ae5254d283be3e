//! Library package for sending and capturing raw link-layer frames on a
//! named network interface
//!
//! One [`FrameIO`] contract is implemented twice: over raw `AF_PACKET`
//! sockets on Unix-like hosts and over a packet-capture bridge on Windows.
//! [`NetIo`] selects the implementation for the running host.
//!
//! # Examples
//!
//! ## Send a frame and capture replies
//!
//! <https://github.com/robgonnella/r-lanio/blob/main/lib/examples/send-and-capture.rs>
//!
//! ```bash
//! sudo -E cargo run --example send-and-capture -p r-lanio
//! ```
//!
//! ```no_run
//! use r_lanio::{FrameIO, NetIo, MAX_FRAME_SIZE};
//!
//! # fn main() -> r_lanio::error::Result<()> {
//! let io = NetIo::for_current_host("eth0")?;
//!
//! let capture = io.receive(MAX_FRAME_SIZE)?;
//!
//! io.send(&[0u8; 14])?;
//!
//! for frame in capture.frames().iter().take(10) {
//!     println!("captured {} bytes", frame.len());
//! }
//!
//! capture.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! Both operations require raw network access, typically root or
//! `CAP_NET_RAW`:
//!
//! ```bash
//! sudo -E cargo run -p r-lanio-cli -- --interface eth0
//! ```

#![deny(missing_docs)]
pub mod capture;
pub mod error;
pub mod frame_io;
pub mod network;
pub mod platform;
#[cfg(unix)]
pub mod promiscuous;
#[cfg(unix)]
mod sys;
pub mod unix;
pub mod windows;

pub use capture::{Capture, StopHandle};
pub use frame_io::{FrameIO, Frame, InterfaceName, MAX_FRAME_SIZE};
pub use platform::{FrameIoConfig, NetIo, Platform};
