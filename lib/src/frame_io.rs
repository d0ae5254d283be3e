//! The frame I/O capability and the values that flow through it

use std::{ffi::CString, fmt::Display, ops::Deref, str::FromStr};

use crate::{
    capture::Capture,
    error::{FrameIoError, Result},
};

/// Largest frame accepted by send, also the default snapshot size for
/// capture handles
pub const MAX_FRAME_SIZE: usize = 65536;

/// Trait describing a bound link-layer frame transport
///
/// Implementations move opaque byte sequences; they never parse or validate
/// frame contents beyond the length bounds enforced by [`validate_frame`].
pub trait FrameIO: Send + Sync {
    /// Transmits `frame` exactly once and returns the number of bytes
    /// written, which equals `frame.len()` on success
    fn send(&self, frame: &[u8]) -> Result<usize>;

    /// Starts a concurrent capture session and returns without blocking.
    ///
    /// Each captured frame is delivered on [`Capture::frames`] truncated to
    /// `max_frame_size`, which must lie within `1..=MAX_FRAME_SIZE` or the
    /// session reports [`FrameIoError::InvalidFrame`]. A failing session
    /// reports exactly one error on [`Capture::errors`] before both channels
    /// close. The only synchronous error is [`FrameIoError::SessionActive`].
    fn receive(&self, max_frame_size: usize) -> Result<Capture>;
}

/// An owned link-layer frame delivered by a capture session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Returns a new Frame owning `bytes`
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the frame returning the underlying buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Frame {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for Frame {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Frame> for Vec<u8> {
    fn from(value: Frame) -> Self {
        value.0
    }
}

/// A validated network interface name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Returns a new InterfaceName, rejecting empty names and names
    /// containing NUL bytes
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(FrameIoError::InvalidInterfaceName(name));
        }

        if name.contains('\0') {
            return Err(FrameIoError::InvalidInterfaceName(name));
        }

        Ok(Self(name))
    }

    /// Returns the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name as a C string for use in OS calls
    pub fn to_cstring(&self) -> Result<CString> {
        CString::new(self.0.as_bytes())
            .map_err(|_| FrameIoError::InvalidInterfaceName(self.0.clone()))
    }
}

impl Display for InterfaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for InterfaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for InterfaceName {
    type Err = FrameIoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for InterfaceName {
    type Error = FrameIoError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = FrameIoError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

/// Checks the send precondition: a frame must be non-empty and no larger
/// than [`MAX_FRAME_SIZE`]
pub fn validate_frame(frame: &[u8]) -> Result<()> {
    if frame.is_empty() {
        return Err(FrameIoError::InvalidFrame("frame is empty".into()));
    }

    if frame.len() > MAX_FRAME_SIZE {
        return Err(FrameIoError::InvalidFrame(format!(
            "frame of {} bytes exceeds limit of {} bytes",
            frame.len(),
            MAX_FRAME_SIZE
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "./frame_io_tests.rs"]
mod tests;
