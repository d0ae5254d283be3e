//! Capture sessions shared by every platform implementation
//!
//! A session runs on its own thread: it opens a [`FrameSource`], reads into
//! a single reusable buffer and hands an owned copy of every frame to the
//! consumer. A session ends on a read error, on the end of the source's
//! stream, or when stopped. Whatever the cause, at most one error is
//! reported and it is the last value sent before both channels close.

#[cfg(test)]
use mockall::automock;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender, SyncSender, TryRecvError},
    },
    thread::{self, JoinHandle},
};

use crate::{
    error::{FrameIoError, Result},
    frame_io::{Frame, MAX_FRAME_SIZE},
};

/// Number of captured frames that may wait for the consumer before the
/// capture thread blocks
pub const FRAME_CHANNEL_BOUND: usize = 1;

/// Result of a single read from a [`FrameSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A frame of this many bytes was copied to the start of the buffer
    Frame(usize),
    /// The read timed out before a frame arrived
    Idle,
    /// The source will not produce any more frames
    End,
}

/// Trait describing a blocking source of link-layer frames
#[cfg_attr(test, automock)]
pub trait FrameSource {
    /// Should block until the next frame arrives or the source's read
    /// timeout elapses, copying at most `buf.len()` bytes into `buf`
    fn next_frame(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// Should release the underlying handle, reporting any failure
    fn close(&mut self) -> Result<()>;
}

/// Signals a running capture session to stop between reads
#[derive(Debug, Clone)]
pub struct StopHandle(Sender<()>);

impl StopHandle {
    /// Requests the session stop. Has no effect once the session is over
    pub fn stop(&self) {
        let _ = self.0.send(());
    }
}

/// Serializes receive sessions on a single frame I/O instance
#[derive(Debug, Clone, Default)]
pub struct SessionLock(Arc<AtomicBool>);

impl SessionLock {
    /// Returns a new, released SessionLock
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session active, failing with
    /// [`FrameIoError::SessionActive`] if one already is
    pub fn acquire(&self) -> Result<SessionGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| FrameIoError::SessionActive)?;
        Ok(SessionGuard(Arc::clone(&self.0)))
    }

    /// Returns true while a session holds the lock
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Held by a running session, releases its [`SessionLock`] when dropped
#[derive(Debug)]
pub struct SessionGuard(Arc<AtomicBool>);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A running capture session
///
/// Iterate [`Capture::frames`] until it closes, then check
/// [`Capture::errors`] for the error that ended the session, if any.
pub struct Capture {
    frames: Receiver<Frame>,
    errors: Receiver<FrameIoError>,
    stop: StopHandle,
    handle: JoinHandle<()>,
}

impl Capture {
    /// Starts a session on a new thread. `open` runs on that thread and
    /// its failure is reported like any other session error
    pub fn start<S, F>(max_frame_size: usize, open: F) -> Self
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        Self::spawn(max_frame_size, None, open)
    }

    /// Starts a session that holds `guard` until it ends. The guard is
    /// released before the channels close
    pub fn start_locked<S, F>(
        max_frame_size: usize,
        guard: SessionGuard,
        open: F,
    ) -> Self
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        Self::spawn(max_frame_size, Some(guard), open)
    }

    fn spawn<S, F>(
        max_frame_size: usize,
        guard: Option<SessionGuard>,
        open: F,
    ) -> Self
    where
        S: FrameSource + 'static,
        F: FnOnce() -> Result<S> + Send + 'static,
    {
        let (frame_tx, frame_rx) = mpsc::sync_channel(FRAME_CHANNEL_BOUND);
        let (error_tx, error_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            if let Err(err) = run(max_frame_size, open, &frame_tx, &stop_rx) {
                log::debug!("capture session failed: {}", err);
                // capacity is 1 and this is the only write, so it never blocks
                let _ = error_tx.send(err);
            }

            drop(guard);
            drop(error_tx);
            drop(frame_tx);
            log::debug!("capture session terminated");
        });

        Self {
            frames: frame_rx,
            errors: error_rx,
            stop: StopHandle(stop_tx),
            handle,
        }
    }

    /// Receiver of captured frames in arrival order. Closes when the
    /// session ends
    pub fn frames(&self) -> &Receiver<Frame> {
        &self.frames
    }

    /// Receiver of the single error that ended the session, if any
    pub fn errors(&self) -> &Receiver<FrameIoError> {
        &self.errors
    }

    /// Returns a handle that can stop the session from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns true once the session thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the session, discarding undelivered frames, and waits for the
    /// session thread. Returns the error that ended the session if one was
    /// reported before the stop took effect
    pub fn stop(self) -> Result<()> {
        self.stop.stop();
        // unblocks a capture thread waiting on a full frame channel
        drop(self.frames);
        self.handle.join()?;

        match self.errors.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }

    /// Waits for the session to end on its own, discarding undelivered
    /// frames. Returns the error that ended the session, if any
    pub fn wait(self) -> Result<()> {
        for _ in self.frames.iter() {}
        self.handle.join()?;

        match self.errors.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(()),
        }
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(TryRecvError::Empty))
}

// Opens the source, pumps frames until the session ends, then releases
// the source. A close failure is only surfaced when nothing else failed.
fn run<S, F>(
    max_frame_size: usize,
    open: F,
    frames: &SyncSender<Frame>,
    stop: &Receiver<()>,
) -> Result<()>
where
    S: FrameSource,
    F: FnOnce() -> Result<S>,
{
    if max_frame_size == 0 {
        return Err(FrameIoError::InvalidFrame(
            "capture size must be greater than zero".into(),
        ));
    }

    if max_frame_size > MAX_FRAME_SIZE {
        return Err(FrameIoError::InvalidFrame(format!(
            "capture size of {} bytes exceeds limit of {} bytes",
            max_frame_size, MAX_FRAME_SIZE
        )));
    }

    let mut source = open()?;

    log::debug!("capture session started: max frame size {}", max_frame_size);

    let pumped = pump(&mut source, max_frame_size, frames, stop);
    let closed = source.close();

    match (pumped, closed) {
        (Err(err), Err(close_err)) => {
            log::warn!("failed to release capture handle: {}", close_err);
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), closed) => closed,
    }
}

fn pump<S: FrameSource>(
    source: &mut S,
    max_frame_size: usize,
    frames: &SyncSender<Frame>,
    stop: &Receiver<()>,
) -> Result<()> {
    let mut buffer = vec![0u8; max_frame_size];

    loop {
        if stop_requested(stop) {
            log::debug!("capture session stop requested");
            return Ok(());
        }

        match source.next_frame(&mut buffer)? {
            ReadOutcome::Idle | ReadOutcome::Frame(0) => continue,
            ReadOutcome::End => {
                log::debug!("capture stream ended");
                return Ok(());
            }
            ReadOutcome::Frame(len) => {
                let len = len.min(buffer.len());
                // the buffer is reused by the next read, so hand out a copy
                let frame = Frame::from(&buffer[..len]);

                if frames.send(frame).is_err() {
                    log::debug!("frame consumer disconnected");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "./capture_tests.rs"]
mod tests;
