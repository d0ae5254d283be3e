//! Owned file descriptors whose release failures are reported

use std::io;

use crate::error::{FrameIoError, Result};

/// An owned OS descriptor. Call [`Descriptor::close`] to observe close
/// failures; dropping an open descriptor closes it and logs any failure.
#[derive(Debug)]
pub(crate) struct Descriptor {
    fd: libc::c_int,
}

impl Descriptor {
    /// Wraps the return value of a descriptor-creating call, mapping a
    /// negative value to the last OS error
    pub(crate) fn from_raw(fd: libc::c_int) -> io::Result<Self> {
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { fd })
    }

    pub(crate) fn raw(&self) -> libc::c_int {
        self.fd
    }

    /// Closes the descriptor, reporting failure as a release error.
    /// Closing an already closed descriptor is a no-op
    pub(crate) fn close(&mut self) -> Result<()> {
        let fd = std::mem::replace(&mut self.fd, -1);
        if fd < 0 {
            return Ok(());
        }
        close_fd(fd).map_err(|e| FrameIoError::Release(e.to_string()))
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        if self.fd < 0 {
            return;
        }

        if let Err(e) = close_fd(self.fd) {
            log::warn!("failed to close descriptor {}: {}", self.fd, e);
        }
    }
}

fn close_fd(fd: libc::c_int) -> io::Result<()> {
    // SAFETY: fd is owned by a Descriptor that forgets it before or while
    // this runs, so it is closed exactly once
    let rc = unsafe { libc::close(fd) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
