//! Selects the frame I/O implementation for a host operating system
//!
//! The OS identifier is passed in rather than read inline so the mapping can
//! be exercised for every platform from any host. Use
//! [`Platform::current`] in production code.

use derive_builder::Builder;
use std::{fmt::Display, str::FromStr, time::Duration};

use crate::{
    capture::Capture,
    error::{FrameIoError, Result},
    frame_io::{FrameIO, InterfaceName, MAX_FRAME_SIZE},
    unix::UnixIo,
    windows::WindowsIo,
};

/// Interval at which capture sessions wake from a blocking read to check
/// whether they have been stopped
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Family of host operating systems with a frame I/O implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux and macOS: raw link-layer sockets
    UnixLike,
    /// Windows: packet-capture bridge
    Windows,
}

impl Platform {
    /// Maps an OS identifier, as reported by [`std::env::consts::OS`], to
    /// its platform
    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" | "macos" => Ok(Self::UnixLike),
            "windows" => Ok(Self::Windows),
            other => Err(FrameIoError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Returns the platform of the running host
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }
}

impl FromStr for Platform {
    type Err = FrameIoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_os(s)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnixLike => write!(f, "unix-like"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Configuration for a [`NetIo`] instance
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct FrameIoConfig {
    /// Name of the interface to bind to
    interface: String,
    /// Platform to dispatch on, defaults to the running host's
    #[builder(default, setter(into, strip_option))]
    platform: Option<Platform>,
    /// Whether sends (and Windows captures) run in promiscuous mode
    #[builder(default = "true")]
    promiscuous: bool,
    /// Snapshot size of the capture handle used for sends on Windows
    #[builder(default = "MAX_FRAME_SIZE")]
    send_snaplen: usize,
    /// Interval at which capture sessions check for a stop request
    #[builder(default = "DEFAULT_READ_TIMEOUT")]
    read_timeout: Duration,
}

impl FrameIoConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.interface.as_ref().is_some_and(|i| i.is_empty()) {
            return Err("interface must not be empty".into());
        }

        if self.send_snaplen == Some(0) {
            return Err("send_snaplen must be greater than zero".into());
        }

        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err("read_timeout must be greater than zero".into());
        }

        Ok(())
    }
}

impl FrameIoConfig {
    /// Returns builder for FrameIoConfig
    pub fn builder() -> FrameIoConfigBuilder {
        FrameIoConfigBuilder::default()
    }

    /// Name of the interface to bind to
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Platform to dispatch on, `None` meaning the running host's
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    /// Whether sends (and Windows captures) run in promiscuous mode
    pub fn promiscuous(&self) -> bool {
        self.promiscuous
    }

    /// Snapshot size of the capture handle used for sends on Windows
    pub fn send_snaplen(&self) -> usize {
        self.send_snaplen
    }

    /// Interval at which capture sessions check for a stop request
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}

/// A frame I/O instance bound to one interface, selected once for its
/// platform
#[derive(Debug, Clone)]
pub enum NetIo {
    /// Raw link-layer sockets
    Unix(UnixIo),
    /// Packet-capture bridge
    Windows(WindowsIo),
}

impl NetIo {
    /// Returns the implementation for `platform` bound to `interface`
    pub fn new(platform: Platform, interface: &str) -> Result<Self> {
        let interface = InterfaceName::new(interface)?;

        let io = match platform {
            Platform::UnixLike => Self::Unix(UnixIo::new(interface)),
            Platform::Windows => Self::Windows(WindowsIo::new(interface)),
        };

        log::debug!("selected {} frame io for {}", platform, io.interface());

        Ok(io)
    }

    /// Returns the implementation for the OS identifier `os` bound to
    /// `interface`
    pub fn for_os(os: &str, interface: &str) -> Result<Self> {
        Self::new(Platform::from_os(os)?, interface)
    }

    /// Returns the implementation for the running host bound to `interface`
    pub fn for_current_host(interface: &str) -> Result<Self> {
        Self::new(Platform::current()?, interface)
    }

    /// Returns the implementation described by `config`
    pub fn from_config(config: &FrameIoConfig) -> Result<Self> {
        let platform = match config.platform {
            Some(platform) => platform,
            None => Platform::current()?,
        };

        let interface = InterfaceName::new(config.interface.as_str())?;

        let io = match platform {
            Platform::UnixLike => Self::Unix(UnixIo::with_options(
                interface,
                config.promiscuous,
                config.read_timeout,
            )),
            Platform::Windows => Self::Windows(WindowsIo::with_options(
                interface,
                config.promiscuous,
                config.send_snaplen,
                config.read_timeout,
            )),
        };

        log::debug!("selected {} frame io for {}", platform, io.interface());

        Ok(io)
    }

    /// Returns the platform this instance was selected for
    pub fn platform(&self) -> Platform {
        match self {
            Self::Unix(_) => Platform::UnixLike,
            Self::Windows(_) => Platform::Windows,
        }
    }

    /// Returns the interface this instance is bound to
    pub fn interface(&self) -> &InterfaceName {
        match self {
            Self::Unix(io) => io.interface(),
            Self::Windows(io) => io.interface(),
        }
    }
}

impl FrameIO for NetIo {
    fn send(&self, frame: &[u8]) -> Result<usize> {
        match self {
            Self::Unix(io) => io.send(frame),
            Self::Windows(io) => io.send(frame),
        }
    }

    fn receive(&self, max_frame_size: usize) -> Result<Capture> {
        match self {
            Self::Unix(io) => io.receive(max_frame_size),
            Self::Windows(io) => io.receive(max_frame_size),
        }
    }
}

#[cfg(test)]
#[path = "./platform_tests.rs"]
mod tests;
