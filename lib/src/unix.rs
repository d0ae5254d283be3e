//! Frame I/O over raw link-layer sockets on Unix-like hosts
//!
//! Raw `AF_PACKET` sockets only exist on Linux. On other Unix-like hosts
//! [`UnixIo`] can still be constructed but its operations report
//! [`FrameIoError::UnsupportedPlatform`].

use std::time::Duration;

use crate::{
    capture::{Capture, SessionLock},
    error::Result,
    frame_io::{FrameIO, InterfaceName, validate_frame},
    platform::DEFAULT_READ_TIMEOUT,
};

/// Sends and receives frames through raw link-layer sockets
#[derive(Debug, Clone)]
pub struct UnixIo {
    interface: InterfaceName,
    promiscuous: bool,
    read_timeout: Duration,
    session: SessionLock,
}

impl UnixIo {
    /// Returns a new UnixIo bound to `interface` with default options
    pub fn new(interface: InterfaceName) -> Self {
        Self::with_options(interface, true, DEFAULT_READ_TIMEOUT)
    }

    pub(crate) fn with_options(
        interface: InterfaceName,
        promiscuous: bool,
        read_timeout: Duration,
    ) -> Self {
        Self {
            interface,
            promiscuous,
            read_timeout,
            session: SessionLock::new(),
        }
    }

    /// Returns the interface this instance is bound to
    pub fn interface(&self) -> &InterfaceName {
        &self.interface
    }
}

// Implements the FrameIO trait using one raw socket per operation
impl FrameIO for UnixIo {
    fn send(&self, frame: &[u8]) -> Result<usize> {
        validate_frame(frame)?;
        raw::send(&self.interface, frame, self.promiscuous)
    }

    fn receive(&self, max_frame_size: usize) -> Result<Capture> {
        let guard = self.session.acquire()?;
        let interface = self.interface.clone();
        let promiscuous = self.promiscuous;
        let read_timeout = self.read_timeout;

        log::debug!("starting capture session on {}", interface);

        Ok(Capture::start_locked(max_frame_size, guard, move || {
            raw::open_capture(&interface, read_timeout, promiscuous)
        }))
    }
}

#[cfg(target_os = "linux")]
mod raw {
    use std::{io, mem, time::Duration};

    use crate::{
        capture::{FrameSource, ReadOutcome},
        error::{FrameIoError, Result},
        frame_io::InterfaceName,
        network::{self, NetworkInterface},
        promiscuous::PromiscuousGuard,
        sys::Descriptor,
    };

    // ETH_P_ALL in network byte order, as both socket(2) and sockaddr_ll
    // expect it
    const ETH_P_ALL_BE: u16 = (libc::ETH_P_ALL as u16).to_be();

    /// An `AF_PACKET` raw socket receiving every protocol
    pub(super) struct RawSocket {
        interface: String,
        socket: Descriptor,
        // held for the whole capture session
        promiscuous: Option<PromiscuousGuard>,
    }

    impl RawSocket {
        fn open(interface: &str) -> Result<Self> {
            // SAFETY: plain socket(2) call, the result is checked by from_raw
            let fd = unsafe {
                libc::socket(
                    libc::AF_PACKET,
                    libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                    ETH_P_ALL_BE as libc::c_int,
                )
            };
            let socket = Descriptor::from_raw(fd)
                .map_err(|e| FrameIoError::ResourceAcquisition(e.to_string()))?;

            log::debug!("opened raw socket for {}", interface);

            Ok(Self {
                interface: interface.to_string(),
                socket,
                promiscuous: None,
            })
        }

        fn bind(&self, device: &NetworkInterface) -> Result<()> {
            let addr = link_layer_address(device);

            // SAFETY: addr is a fully initialized sockaddr_ll and the length
            // passed matches its size
            let rc = unsafe {
                libc::bind(
                    self.socket.raw(),
                    &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                    mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
                )
            };
            if rc < 0 {
                return Err(FrameIoError::bind(
                    &self.interface,
                    io::Error::last_os_error(),
                ));
            }

            log::debug!(
                "bound raw socket to {} (index {})",
                self.interface,
                device.index
            );

            Ok(())
        }

        fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
            let tv = libc::timeval {
                tv_sec: timeout.as_secs() as libc::time_t,
                tv_usec: timeout.subsec_micros() as libc::suseconds_t,
            };

            // SAFETY: tv is a live timeval and the length passed matches it
            let rc = unsafe {
                libc::setsockopt(
                    self.socket.raw(),
                    libc::SOL_SOCKET,
                    libc::SO_RCVTIMEO,
                    &tv as *const libc::timeval as *const libc::c_void,
                    mem::size_of::<libc::timeval>() as libc::socklen_t,
                )
            };
            if rc < 0 {
                return Err(FrameIoError::ResourceAcquisition(
                    io::Error::last_os_error().to_string(),
                ));
            }

            Ok(())
        }

        fn write(&self, frame: &[u8]) -> Result<usize> {
            // SAFETY: frame is a live slice and its exact length is passed
            let written = unsafe {
                libc::write(
                    self.socket.raw(),
                    frame.as_ptr() as *const libc::c_void,
                    frame.len(),
                )
            };
            if written < 0 {
                return Err(FrameIoError::Write(
                    io::Error::last_os_error().to_string(),
                ));
            }

            Ok(written as usize)
        }

        fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
            // SAFETY: buf is a live, writable slice and its exact length is
            // passed; no source address is requested
            let read = unsafe {
                libc::recvfrom(
                    self.socket.raw(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                )
            };
            if read < 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(read as usize)
        }
    }

    impl FrameSource for RawSocket {
        fn next_frame(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
            match self.read(buf) {
                Ok(len) => Ok(ReadOutcome::Frame(len)),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    Ok(ReadOutcome::Idle)
                }
                Err(e) => Err(FrameIoError::Read(e.to_string())),
            }
        }

        fn close(&mut self) -> Result<()> {
            log::debug!("closing raw socket for {}", self.interface);

            let restored = self
                .promiscuous
                .take()
                .map_or(Ok(()), PromiscuousGuard::restore);
            let closed = self.socket.close();

            match (restored, closed) {
                (Err(err), Err(close_err)) => {
                    log::warn!("{}", close_err);
                    Err(err)
                }
                (Err(err), Ok(())) => Err(err),
                (Ok(()), closed) => closed,
            }
        }
    }

    // interfaces without a hardware address bind with a zero-length one
    pub(super) fn link_layer_address(
        device: &NetworkInterface,
    ) -> libc::sockaddr_ll {
        let mut sll_addr = [0u8; 8];
        let halen = match device.mac_octets() {
            Some(mac) => {
                sll_addr[..mac.len()].copy_from_slice(&mac);
                mac.len()
            }
            None => 0,
        };

        libc::sockaddr_ll {
            sll_family: libc::AF_PACKET as libc::c_ushort,
            sll_protocol: ETH_P_ALL_BE,
            sll_ifindex: device.index as libc::c_int,
            sll_hatype: 0,
            sll_pkttype: 0,
            sll_halen: halen as libc::c_uchar,
            sll_addr,
        }
    }

    fn open_bound(interface: &InterfaceName) -> Result<RawSocket> {
        let socket = RawSocket::open(interface.as_str())?;

        let device = network::get_interface(interface.as_str())
            .map_err(|e| FrameIoError::bind(interface.as_str(), e))?;

        socket.bind(&device)?;

        Ok(socket)
    }

    fn report_release_failure(res: Result<()>) {
        if let Err(e) = res {
            log::warn!("{}", e);
        }
    }

    /// Opens a bound socket, writes `frame` once, then restores promiscuous
    /// mode and closes the socket whatever the outcome of the write
    pub(super) fn send(
        interface: &InterfaceName,
        frame: &[u8],
        promiscuous: bool,
    ) -> Result<usize> {
        let mut socket = open_bound(interface)?;

        let guard = if promiscuous {
            Some(PromiscuousGuard::enable(interface.as_str())?)
        } else {
            None
        };

        let written = socket.write(frame);
        let restored = guard.map_or(Ok(()), PromiscuousGuard::restore);
        let closed = socket.close();

        let written = match written {
            Ok(written) => written,
            Err(err) => {
                report_release_failure(restored);
                report_release_failure(closed);
                return Err(err);
            }
        };

        if let Err(err) = restored {
            report_release_failure(closed);
            return Err(err);
        }

        closed?;

        if written != frame.len() {
            return Err(FrameIoError::Write(format!(
                "short write: {} of {} bytes",
                written,
                frame.len()
            )));
        }

        log::debug!("sent {} byte frame on {}", written, interface);

        Ok(written)
    }

    /// Opens the socket a capture session reads from, keeping the interface
    /// promiscuous until the socket is closed when requested
    pub(super) fn open_capture(
        interface: &InterfaceName,
        read_timeout: Duration,
        promiscuous: bool,
    ) -> Result<RawSocket> {
        let mut socket = open_bound(interface)?;
        socket.set_read_timeout(read_timeout)?;

        if promiscuous {
            socket.promiscuous =
                Some(PromiscuousGuard::enable(interface.as_str())?);
        }

        Ok(socket)
    }
}

#[cfg(not(target_os = "linux"))]
mod raw {
    use std::time::Duration;

    use crate::{
        capture::{FrameSource, ReadOutcome},
        error::{FrameIoError, Result},
        frame_io::InterfaceName,
    };

    /// Uninhabited: no raw socket can be opened on this host
    pub(super) enum NoSocket {}

    impl FrameSource for NoSocket {
        fn next_frame(&mut self, _buf: &mut [u8]) -> Result<ReadOutcome> {
            match *self {}
        }

        fn close(&mut self) -> Result<()> {
            match *self {}
        }
    }

    fn unsupported() -> FrameIoError {
        FrameIoError::UnsupportedPlatform(format!(
            "raw link-layer sockets are not available on {}",
            std::env::consts::OS
        ))
    }

    pub(super) fn send(
        _interface: &InterfaceName,
        _frame: &[u8],
        _promiscuous: bool,
    ) -> Result<usize> {
        Err(unsupported())
    }

    pub(super) fn open_capture(
        _interface: &InterfaceName,
        _read_timeout: Duration,
        _promiscuous: bool,
    ) -> Result<NoSocket> {
        Err(unsupported())
    }
}

#[cfg(test)]
#[path = "./unix_tests.rs"]
mod tests;
