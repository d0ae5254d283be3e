//! Frame I/O through a packet-capture bridge (Npcap) on Windows hosts
//!
//! [`WindowsIo`] can be constructed on any host so platform dispatch stays
//! testable, but outside Windows its operations report
//! [`FrameIoError::UnsupportedPlatform`].

use std::time::Duration;

use crate::{
    capture::{Capture, SessionLock},
    error::Result,
    frame_io::{FrameIO, InterfaceName, MAX_FRAME_SIZE, validate_frame},
    platform::DEFAULT_READ_TIMEOUT,
};

/// Sends and receives frames through live capture handles
#[derive(Debug, Clone)]
pub struct WindowsIo {
    interface: InterfaceName,
    promiscuous: bool,
    send_snaplen: usize,
    read_timeout: Duration,
    session: SessionLock,
}

impl WindowsIo {
    /// Returns a new WindowsIo bound to `interface` with default options
    pub fn new(interface: InterfaceName) -> Self {
        Self::with_options(interface, true, MAX_FRAME_SIZE, DEFAULT_READ_TIMEOUT)
    }

    pub(crate) fn with_options(
        interface: InterfaceName,
        promiscuous: bool,
        send_snaplen: usize,
        read_timeout: Duration,
    ) -> Self {
        Self {
            interface,
            promiscuous,
            send_snaplen,
            read_timeout,
            session: SessionLock::new(),
        }
    }

    /// Returns the interface this instance is bound to
    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }
}

// Implements the FrameIO trait opening a capture handle per operation
impl FrameIO for WindowsIo {
    fn send(&self, frame: &[u8]) -> Result<usize> {
        validate_frame(frame)?;
        bridge::send(&self.interface, frame, self.promiscuous, self.send_snaplen)
    }

    fn receive(&self, max_frame_size: usize) -> Result<Capture> {
        let guard = self.session.acquire()?;
        let interface = self.interface.clone();
        let promiscuous = self.promiscuous;
        let read_timeout = self.read_timeout;

        log::debug!("starting capture session on {}", interface);

        Ok(Capture::start_locked(max_frame_size, guard, move || {
            bridge::open_capture(&interface, max_frame_size, promiscuous, read_timeout)
        }))
    }
}

#[cfg(windows)]
mod bridge {
    use pcap::{Active, Capture};
    use std::time::Duration;

    use crate::{
        capture::{FrameSource, ReadOutcome},
        error::{FrameIoError, Result},
        frame_io::InterfaceName,
    };

    fn to_snaplen(size: usize) -> i32 {
        i32::try_from(size).unwrap_or(i32::MAX)
    }

    fn open_handle(
        interface: &InterfaceName,
        snaplen: usize,
        promiscuous: bool,
        read_timeout: Option<Duration>,
    ) -> Result<Capture<Active>> {
        let inactive = Capture::from_device(interface.as_str())
            .map_err(|e| FrameIoError::ResourceAcquisition(e.to_string()))?
            .promisc(promiscuous)
            .snaplen(to_snaplen(snaplen));

        // without a timeout reads block until a packet arrives
        let inactive = match read_timeout {
            Some(timeout) => inactive
                .timeout(timeout.as_millis().clamp(1, i32::MAX as u128) as i32),
            None => inactive,
        };

        let handle = inactive
            .open()
            .map_err(|e| FrameIoError::bind(interface.as_str(), e))?;

        log::debug!("opened capture handle on {}", interface);

        Ok(handle)
    }

    /// Live capture handle read by a capture session
    pub(super) struct PcapSource {
        interface: String,
        handle: Option<Capture<Active>>,
    }

    impl FrameSource for PcapSource {
        fn next_frame(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
            let Some(handle) = self.handle.as_mut() else {
                return Ok(ReadOutcome::End);
            };

            match handle.next_packet() {
                Ok(packet) => {
                    let len = packet.data.len().min(buf.len());
                    buf[..len].copy_from_slice(&packet.data[..len]);
                    Ok(ReadOutcome::Frame(len))
                }
                Err(pcap::Error::TimeoutExpired) => Ok(ReadOutcome::Idle),
                Err(pcap::Error::NoMorePackets) => Ok(ReadOutcome::End),
                Err(e) => Err(FrameIoError::Read(e.to_string())),
            }
        }

        fn close(&mut self) -> Result<()> {
            // pcap_close cannot fail
            if self.handle.take().is_some() {
                log::debug!("closed capture handle on {}", self.interface);
            }
            Ok(())
        }
    }

    pub(super) fn send(
        interface: &InterfaceName,
        frame: &[u8],
        promiscuous: bool,
        snaplen: usize,
    ) -> Result<usize> {
        let mut handle = open_handle(interface, snaplen, promiscuous, None)?;

        handle
            .sendpacket(frame)
            .map_err(|e| FrameIoError::Write(e.to_string()))?;

        log::debug!("sent {} byte frame on {}", frame.len(), interface);

        Ok(frame.len())
    }

    pub(super) fn open_capture(
        interface: &InterfaceName,
        max_frame_size: usize,
        promiscuous: bool,
        read_timeout: Duration,
    ) -> Result<PcapSource> {
        let handle =
            open_handle(interface, max_frame_size, promiscuous, Some(read_timeout))?;

        Ok(PcapSource {
            interface: interface.to_string(),
            handle: Some(handle),
        })
    }
}

#[cfg(not(windows))]
mod bridge {
    use std::time::Duration;

    use crate::{
        capture::{FrameSource, ReadOutcome},
        error::{FrameIoError, Result},
        frame_io::InterfaceName,
    };

    /// Uninhabited: no capture handle can be opened on this host
    pub(super) enum NoHandle {}

    impl FrameSource for NoHandle {
        fn next_frame(&mut self, _buf: &mut [u8]) -> Result<ReadOutcome> {
            match *self {}
        }

        fn close(&mut self) -> Result<()> {
            match *self {}
        }
    }

    fn unsupported() -> FrameIoError {
        FrameIoError::UnsupportedPlatform(format!(
            "the packet-capture bridge is not available on {}",
            std::env::consts::OS
        ))
    }

    pub(super) fn send(
        _interface: &InterfaceName,
        _frame: &[u8],
        _promiscuous: bool,
        _snaplen: usize,
    ) -> Result<usize> {
        Err(unsupported())
    }

    pub(super) fn open_capture(
        _interface: &InterfaceName,
        _max_frame_size: usize,
        _promiscuous: bool,
        _read_timeout: Duration,
    ) -> Result<NoHandle> {
        Err(unsupported())
    }
}

#[cfg(test)]
#[path = "./windows_tests.rs"]
mod tests;
