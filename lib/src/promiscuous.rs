//! Promiscuous-mode control for Unix-like hosts
//!
//! Promiscuous mode is a property of the interface, not of the process: it
//! outlives whatever enabled it unless it is explicitly restored. Prefer
//! [`PromiscuousGuard`], which puts the interface back the way it found it.

use std::io;

use crate::{
    error::{FrameIoError, Result},
    sys::Descriptor,
};

#[cfg(target_os = "linux")]
const CONTROL_SOCKET_TYPE: libc::c_int = libc::SOCK_DGRAM | libc::SOCK_CLOEXEC;
#[cfg(not(target_os = "linux"))]
const CONTROL_SOCKET_TYPE: libc::c_int = libc::SOCK_DGRAM;

// Matches the leading name and flags members of `struct ifreq`, padded to
// the size of the largest union member on Linux.
#[repr(C)]
struct IfFlagsRequest {
    name: [libc::c_char; libc::IFNAMSIZ],
    flags: libc::c_short,
    _pad: [u8; 22],
}

impl IfFlagsRequest {
    fn new(interface: &str) -> Result<Self> {
        let bytes = interface.as_bytes();

        if bytes.is_empty() || bytes.len() >= libc::IFNAMSIZ || bytes.contains(&0)
        {
            return Err(FrameIoError::InvalidInterfaceName(interface.to_string()));
        }

        let mut req = Self {
            name: [0; libc::IFNAMSIZ],
            flags: 0,
            _pad: [0; 22],
        };

        for (dst, src) in req.name.iter_mut().zip(bytes) {
            *dst = *src as libc::c_char;
        }

        Ok(req)
    }
}

struct ControlSocket {
    interface: String,
    socket: Descriptor,
}

impl ControlSocket {
    fn open(interface: &str) -> Result<Self> {
        // SAFETY: plain socket(2) call, the result is checked by from_raw
        let fd = unsafe { libc::socket(libc::AF_INET, CONTROL_SOCKET_TYPE, 0) };
        let socket = Descriptor::from_raw(fd)
            .map_err(|e| FrameIoError::ResourceAcquisition(e.to_string()))?;

        Ok(Self {
            interface: interface.to_string(),
            socket,
        })
    }

    fn get_flags(&self, req: &mut IfFlagsRequest) -> Result<()> {
        // SAFETY: req is a live, correctly sized ifreq the kernel fills in
        let rc = unsafe {
            libc::ioctl(
                self.socket.raw(),
                libc::SIOCGIFFLAGS as _,
                req as *mut IfFlagsRequest,
            )
        };
        if rc < 0 {
            return Err(FrameIoError::flag_control(
                &self.interface,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn set_flags(&self, req: &mut IfFlagsRequest) -> Result<()> {
        // SAFETY: req is a live, correctly sized ifreq the kernel reads from
        let rc = unsafe {
            libc::ioctl(
                self.socket.raw(),
                libc::SIOCSIFFLAGS as _,
                req as *mut IfFlagsRequest,
            )
        };
        if rc < 0 {
            return Err(FrameIoError::flag_control(
                &self.interface,
                io::Error::last_os_error(),
            ));
        }
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.socket.close()
    }
}

/// Returns the current flags of the named interface
pub fn interface_flags(interface: &str) -> Result<libc::c_short> {
    let mut req = IfFlagsRequest::new(interface)?;
    let control = ControlSocket::open(interface)?;

    control.get_flags(&mut req)?;
    control.close()?;

    Ok(req.flags)
}

/// Returns true if the named interface is in promiscuous mode
pub fn is_promiscuous(interface: &str) -> Result<bool> {
    let flags = interface_flags(interface)?;
    Ok(flags & libc::IFF_PROMISC as libc::c_short != 0)
}

/// Sets or clears the promiscuous flag on the named interface.
///
/// Idempotent: when the flag already has the requested value no write is
/// issued.
pub fn set_promiscuous(interface: &str, enabled: bool) -> Result<()> {
    let mut req = IfFlagsRequest::new(interface)?;
    let control = ControlSocket::open(interface)?;

    control.get_flags(&mut req)?;

    let promisc = libc::IFF_PROMISC as libc::c_short;
    let flags = if enabled {
        req.flags | promisc
    } else {
        req.flags & !promisc
    };

    if flags == req.flags {
        log::debug!(
            "promiscuous mode already {} on {}",
            if enabled { "enabled" } else { "disabled" },
            interface
        );
    } else {
        req.flags = flags;
        control.set_flags(&mut req)?;
        log::debug!(
            "promiscuous mode {} on {}",
            if enabled { "enabled" } else { "disabled" },
            interface
        );
    }

    control.close()
}

/// Enables promiscuous mode for as long as the guard lives
///
/// If the interface was already promiscuous the guard leaves it untouched,
/// otherwise the flag is cleared again by [`PromiscuousGuard::restore`] or,
/// failing that, when the guard is dropped.
#[derive(Debug)]
pub struct PromiscuousGuard {
    interface: String,
    needs_restore: bool,
}

impl PromiscuousGuard {
    /// Enables promiscuous mode on the named interface
    pub fn enable(interface: &str) -> Result<Self> {
        let needs_restore = !is_promiscuous(interface)?;

        if needs_restore {
            set_promiscuous(interface, true)?;
        }

        Ok(Self {
            interface: interface.to_string(),
            needs_restore,
        })
    }

    /// Restores the interface's previous state, reporting failure as a
    /// release error
    pub fn restore(mut self) -> Result<()> {
        if !std::mem::take(&mut self.needs_restore) {
            return Ok(());
        }

        set_promiscuous(&self.interface, false)
            .map_err(|e| FrameIoError::Release(e.to_string()))
    }
}

impl Drop for PromiscuousGuard {
    fn drop(&mut self) {
        if !self.needs_restore {
            return;
        }

        if let Err(e) = set_promiscuous(&self.interface, false) {
            log::warn!(
                "failed to restore promiscuous mode on {}: {}",
                self.interface,
                e
            );
        }
    }
}

#[cfg(test)]
#[path = "./promiscuous_tests.rs"]
mod tests;
