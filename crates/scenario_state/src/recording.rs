//! Recording - One microphone capture at a time per page
//!
//! The capture handle owns the hardware stream; dropping or finishing it
//! releases the device.

use dialogue_core::CapturedAudio;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("No recording is in progress")]
    NotRecording,

    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),
}

/// An open capture stream.
pub trait CaptureHandle {
    /// Stop capturing, release the device and return what was recorded.
    fn finish(self) -> CapturedAudio;
}

/// Source of capture streams (a microphone).
pub trait AudioCapture {
    type Handle: CaptureHandle;

    fn open(&mut self) -> Result<Self::Handle, RecordingError>;
}

pub struct Recorder<C: AudioCapture> {
    capture: C,
    active: Option<C::Handle>,
}

impl<C: AudioCapture> Recorder<C> {
    pub fn new(capture: C) -> Self {
        Self {
            capture,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self) -> Result<(), RecordingError> {
        if self.active.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }
        let handle = self.capture.open()?;
        tracing::debug!("recording started");
        self.active = Some(handle);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<CapturedAudio, RecordingError> {
        let handle = self.active.take().ok_or(RecordingError::NotRecording)?;
        let audio = handle.finish();
        tracing::debug!(
            samples = audio.samples.len(),
            sample_rate = audio.sample_rate,
            "recording stopped"
        );
        Ok(audio)
    }

    /// Drop any active capture without keeping its audio.
    pub fn cancel(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("recording cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    /// Counts open streams so tests can check the device is released.
    struct FakeMic {
        open_streams: Rc<Cell<usize>>,
        available: bool,
    }

    struct FakeStream {
        open_streams: Rc<Cell<usize>>,
    }

    impl Drop for FakeStream {
        fn drop(&mut self) {
            self.open_streams.set(self.open_streams.get() - 1);
        }
    }

    impl CaptureHandle for FakeStream {
        fn finish(self) -> CapturedAudio {
            CapturedAudio {
                samples: vec![0.25; 4],
                sample_rate: 16_000,
                channels: 1,
            }
        }
    }

    impl AudioCapture for FakeMic {
        type Handle = FakeStream;

        fn open(&mut self) -> Result<FakeStream, RecordingError> {
            if !self.available {
                return Err(RecordingError::DeviceUnavailable("denied".to_string()));
            }
            self.open_streams.set(self.open_streams.get() + 1);
            Ok(FakeStream {
                open_streams: Rc::clone(&self.open_streams),
            })
        }
    }

    fn recorder(available: bool) -> (Recorder<FakeMic>, Rc<Cell<usize>>) {
        let open_streams = Rc::new(Cell::new(0));
        let mic = FakeMic {
            open_streams: Rc::clone(&open_streams),
            available,
        };
        (Recorder::new(mic), open_streams)
    }

    #[test]
    fn only_one_recording_at_a_time() {
        let (mut recorder, open_streams) = recorder(true);
        recorder.start().unwrap();
        assert_eq!(recorder.start(), Err(RecordingError::AlreadyRecording));
        assert_eq!(open_streams.get(), 1);
    }

    #[test]
    fn stop_releases_device_and_returns_audio() {
        let (mut recorder, open_streams) = recorder(true);
        recorder.start().unwrap();
        let audio = recorder.stop().unwrap();
        assert_eq!(audio.samples.len(), 4);
        assert_eq!(open_streams.get(), 0);
        assert!(!recorder.is_recording());
        assert_eq!(recorder.stop(), Err(RecordingError::NotRecording));
    }

    #[test]
    fn cancel_releases_device() {
        let (mut recorder, open_streams) = recorder(true);
        recorder.start().unwrap();
        recorder.cancel();
        assert_eq!(open_streams.get(), 0);
        recorder.start().unwrap();
    }

    #[test]
    fn unavailable_device_leaves_recorder_idle() {
        let (mut recorder, _) = recorder(false);
        assert!(matches!(
            recorder.start(),
            Err(RecordingError::DeviceUnavailable(_))
        ));
        assert!(!recorder.is_recording());
    }
}
