use mockall::Sequence;
use std::time::Duration;

use super::*;

fn write_frame(buf: &mut [u8], bytes: &[u8]) -> Result<ReadOutcome> {
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(ReadOutcome::Frame(bytes.len()))
}

#[test]
fn delivers_frames_in_order_then_closes() {
    let mut source = MockFrameSource::new();
    let mut seq = Sequence::new();

    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| write_frame(buf, &[1, 2, 3]));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(ReadOutcome::Idle));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| write_frame(buf, &[4, 5]));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(ReadOutcome::End));
    source.expect_close().times(1).returning(|| Ok(()));

    let capture = Capture::start(64, move || Ok(source));

    let frames: Vec<Frame> = capture.frames().iter().collect();

    assert_eq!(frames, vec![Frame::new(vec![1, 2, 3]), Frame::new(vec![4, 5])]);
    assert!(capture.errors().recv().is_err());
    capture.wait().unwrap();
}

#[test]
fn delivered_frames_survive_buffer_reuse() {
    let mut source = MockFrameSource::new();
    let mut seq = Sequence::new();

    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| write_frame(buf, &[0xaa; 14]));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| write_frame(buf, &[0xbb; 14]));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(ReadOutcome::End));
    source.expect_close().returning(|| Ok(()));

    let capture = Capture::start(14, move || Ok(source));

    let first = capture.frames().recv().unwrap();
    let second = capture.frames().recv().unwrap();

    assert_eq!(first.as_bytes(), &[0xaa; 14]);
    assert_eq!(second.as_bytes(), &[0xbb; 14]);

    capture.wait().unwrap();
}

#[test]
fn truncates_frames_to_max_frame_size() {
    let mut source = MockFrameSource::new();
    let mut seq = Sequence::new();

    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| {
            assert_eq!(buf.len(), 4);
            buf.copy_from_slice(&[1, 2, 3, 4]);
            // a source reporting the untruncated wire length
            Ok(ReadOutcome::Frame(60))
        });
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(ReadOutcome::End));
    source.expect_close().returning(|| Ok(()));

    let capture = Capture::start(4, move || Ok(source));

    let frame = capture.frames().recv().unwrap();
    assert_eq!(frame.as_bytes(), &[1, 2, 3, 4]);

    capture.wait().unwrap();
}

#[test]
fn reports_open_failure_exactly_once() {
    let capture = Capture::start(1500, || -> Result<MockFrameSource> {
        Err(FrameIoError::bind("bogus0", "No such device"))
    });

    assert!(capture.frames().recv().is_err());

    let err = capture.errors().recv().unwrap();
    assert!(matches!(err, FrameIoError::Bind { .. }));
    assert!(capture.errors().recv().is_err());
}

#[test]
fn reports_read_failure_after_delivered_frames() {
    let mut source = MockFrameSource::new();
    let mut seq = Sequence::new();

    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|buf| write_frame(buf, &[7; 20]));
    source
        .expect_next_frame()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Err(FrameIoError::Read("Network is down".into())));
    // the read error wins over the close error
    source
        .expect_close()
        .times(1)
        .returning(|| Err(FrameIoError::Release("bad descriptor".into())));

    let capture = Capture::start(1500, move || Ok(source));

    let frames: Vec<Frame> = capture.frames().iter().collect();
    assert_eq!(frames.len(), 1);

    let err = capture.errors().recv().unwrap();
    assert!(matches!(err, FrameIoError::Read(_)));
    assert!(capture.errors().recv().is_err());
}

#[test]
fn reports_release_failure_when_stream_ends_cleanly() {
    let mut source = MockFrameSource::new();

    source
        .expect_next_frame()
        .returning(|_| Ok(ReadOutcome::End));
    source
        .expect_close()
        .times(1)
        .returning(|| Err(FrameIoError::Release("bad descriptor".into())));

    let capture = Capture::start(1500, move || Ok(source));

    let res = capture.wait();
    assert!(matches!(res, Err(FrameIoError::Release(_))));
}

#[test]
fn rejects_zero_capture_size() {
    let capture = Capture::start(0, || -> Result<MockFrameSource> {
        panic!("source must not be opened")
    });

    assert!(capture.frames().recv().is_err());
    let err = capture.errors().recv().unwrap();
    assert!(matches!(err, FrameIoError::InvalidFrame(_)));
}

#[test]
fn rejects_oversized_capture_sizes() {
    for size in [MAX_FRAME_SIZE + 1, usize::MAX] {
        let capture = Capture::start(size, || -> Result<MockFrameSource> {
            panic!("source must not be opened")
        });

        assert!(capture.frames().recv().is_err());
        let err = capture.errors().recv().unwrap();
        assert!(matches!(err, FrameIoError::InvalidFrame(_)));
        assert!(capture.errors().recv().is_err());
        assert!(capture.wait().is_ok());
    }
}

#[test]
fn accepts_the_largest_capture_size() {
    let mut source = MockFrameSource::new();
    source
        .expect_next_frame()
        .times(1)
        .returning(|buf| {
            assert_eq!(buf.len(), MAX_FRAME_SIZE);
            Ok(ReadOutcome::End)
        });
    source.expect_close().times(1).returning(|| Ok(()));

    let capture = Capture::start(MAX_FRAME_SIZE, move || Ok(source));

    assert!(capture.wait().is_ok());
}

#[test]
fn stops_an_idle_session() {
    let mut source = MockFrameSource::new();

    source.expect_next_frame().returning(|_| {
        thread::sleep(Duration::from_millis(5));
        Ok(ReadOutcome::Idle)
    });
    source.expect_close().times(1).returning(|| Ok(()));

    let capture = Capture::start(1500, move || Ok(source));

    thread::sleep(Duration::from_millis(50));
    assert!(!capture.is_finished());

    capture.stop().unwrap();
}

#[test]
fn stops_from_another_thread() {
    let mut source = MockFrameSource::new();

    source.expect_next_frame().returning(|_| {
        thread::sleep(Duration::from_millis(5));
        Ok(ReadOutcome::Idle)
    });
    source.expect_close().returning(|| Ok(()));

    let capture = Capture::start(1500, move || Ok(source));
    let stopper = capture.stop_handle();

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        stopper.stop();
    });

    // closes without any frame or error once the stop lands
    assert!(capture.frames().recv().is_err());
    assert!(capture.errors().recv().is_err());

    handle.join().unwrap();
}

#[test]
fn stops_a_session_blocked_on_an_undrained_consumer() {
    let mut source = MockFrameSource::new();

    source
        .expect_next_frame()
        .returning(|buf| write_frame(buf, &[1; 8]));
    source.expect_close().returning(|| Ok(()));

    let capture = Capture::start(8, move || Ok(source));

    thread::sleep(Duration::from_millis(20));

    capture.stop().unwrap();
}

#[test]
fn session_lock_serializes_sessions() {
    let lock = SessionLock::new();

    let guard = lock.acquire().unwrap();
    assert!(lock.is_active());
    assert!(matches!(lock.acquire(), Err(FrameIoError::SessionActive)));

    drop(guard);
    assert!(!lock.is_active());
    assert!(lock.acquire().is_ok());
}

#[test]
fn locked_session_releases_before_channels_close() {
    let lock = SessionLock::new();
    let mut source = MockFrameSource::new();

    source
        .expect_next_frame()
        .returning(|_| Ok(ReadOutcome::End));
    source.expect_close().returning(|| Ok(()));

    let guard = lock.acquire().unwrap();
    let capture = Capture::start_locked(1500, guard, move || Ok(source));

    assert!(capture.frames().recv().is_err());
    assert!(!lock.is_active());
    assert!(lock.acquire().is_ok());
}
