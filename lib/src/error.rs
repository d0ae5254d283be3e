//! Custom Error and Result types for this library

use std::any::Any;
use thiserror::Error;

use crate::platform::FrameIoConfigBuilderError;

/// Custom Error type for this library
#[derive(Error, Debug)]
pub enum FrameIoError {
    /// A socket or capture handle could not be created
    #[error("failed to acquire interface handle: {_0}")]
    ResourceAcquisition(String),

    /// The handle could not be bound to the named interface
    #[error("failed to bind to interface {interface}: {reason}")]
    Bind {
        /// Name of the interface being bound
        interface: String,
        /// Underlying OS or capture library message
        reason: String,
    },

    /// Reading or writing interface flags failed
    #[error("failed to control flags on interface {interface}: {reason}")]
    FlagControl {
        /// Name of the interface whose flags were being changed
        interface: String,
        /// Underlying OS message
        reason: String,
    },

    /// Transmitting a frame failed or was cut short
    #[error("failed to write frame: {_0}")]
    Write(String),

    /// Reading from a capture handle failed
    #[error("failed to read frame: {_0}")]
    Read(String),

    /// No frame I/O implementation exists for the host OS
    #[error("unsupported platform: {_0}")]
    UnsupportedPlatform(String),

    /// Releasing a handle or restoring interface state failed
    #[error("failed to release interface resource: {_0}")]
    Release(String),

    /// The frame handed to send violates its length bounds
    #[error("invalid frame: {_0}")]
    InvalidFrame(String),

    /// The interface name cannot be used by the OS
    #[error("invalid interface name: {_0:?}")]
    InvalidInterfaceName(String),

    /// No interface with the given name exists on this host
    #[error("network interface not found: {_0}")]
    InterfaceNotFound(String),

    /// A receive session is already running on this instance
    #[error("a receive session is already active on this interface")]
    SessionActive,

    /// Generic thread error
    #[error("thread error: {_0}")]
    ThreadError(String),

    /// Error resulting from failure to build a frame I/O configuration
    #[error("failed to build frame io config: {_0}")]
    ConfigBuild(#[from] FrameIoConfigBuilderError),
}

impl From<Box<dyn Any + Send>> for FrameIoError {
    fn from(value: Box<dyn Any + Send>) -> Self {
        if let Some(s) = value.downcast_ref::<&'static str>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else if let Some(s) = value.downcast_ref::<String>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else {
            Self::ThreadError("Thread panicked with an unknown type".into())
        }
    }
}

impl FrameIoError {
    /// Converter for bind failures on a named interface
    pub fn bind(interface: &str, reason: impl ToString) -> Self {
        Self::Bind {
            interface: interface.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Converter for flag control failures on a named interface
    pub fn flag_control(interface: &str, reason: impl ToString) -> Self {
        Self::FlagControl {
            interface: interface.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Custom Result type for this library. All Errors exposed by this library
/// will be returned as [`FrameIoError`]
pub type Result<T> = std::result::Result<T, FrameIoError>;

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;
